//! Route handlers for the upload server
//!
//! Handlers are organized by domain:
//! - [`upload`]: chunk decode-and-dispatch
//! - [`system`]: health and OpenAPI

mod system;
mod upload;

pub use system::*;
pub use upload::*;
