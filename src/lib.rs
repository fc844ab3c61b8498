//! # resumable-upload
//!
//! Receiver for chunked uploads sent by resumable.js-style clients.
//!
//! Each chunk arrives as its own `multipart/form-data` POST carrying an upload id, the
//! chunk's byte offset, the declared total size and the chunk payload. The receiver
//! decodes the request into a [`Chunk`], works out whether it completes the upload, and
//! hands it to a consumer task through a bounded queue. Reassembling the file is the
//! consumer's job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use resumable_upload::{Config, LoggingHandler, chunk_queue, spawn_consumer};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!
//!     let (chunks, receiver) = chunk_queue(&config.queue);
//!     let cancel = CancellationToken::new();
//!     let consumer = spawn_consumer(receiver, Arc::new(LoggingHandler), cancel.clone());
//!
//!     // Serves until SIGTERM/SIGINT
//!     resumable_upload::api::start_api_server(config, chunks).await?;
//!
//!     cancel.cancel();
//!     consumer.await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP server
pub mod api;
/// Chunk assembly from multipart bodies
pub mod assembler;
/// Configuration types
pub mod config;
/// Single-field decoding
pub mod decoder;
/// Handoff queue and consumer task
pub mod dispatch;
/// Error types
pub mod error;
/// Core types
pub mod types;

// Re-export commonly used types
pub use assembler::ChunkAssembler;
pub use config::{ApiConfig, Config, QueueConfig, QueueFullPolicy, UploadConfig};
pub use dispatch::{
    ChunkHandler, ChunkReceiver, ChunkSender, LoggingHandler, chunk_queue, spawn_consumer,
};
pub use error::{Error, FieldError, ProtocolMismatch, Result, ToHttpStatus};
pub use types::{Chunk, FieldKind, FieldRole};

/// Resolve once the process is asked to stop (Ctrl+C, or SIGTERM on unix)
///
/// A signal that cannot be registered is logged and never fires; the other one still does.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("Interrupted, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
