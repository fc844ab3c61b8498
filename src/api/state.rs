//! Application state for the upload server

use crate::assembler::ChunkAssembler;
use crate::dispatch::ChunkSender;
use crate::Config;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Decodes request bodies into chunks
    pub assembler: ChunkAssembler,

    /// Producer half of the handoff queue
    pub chunks: ChunkSender,

    /// Configuration the server was built from
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<Config>, chunks: ChunkSender) -> Self {
        let assembler = ChunkAssembler::new(Arc::new(config.upload.clone()));
        Self {
            assembler,
            chunks,
            config,
        }
    }
}
