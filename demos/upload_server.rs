//! Upload server demo
//!
//! Runs the chunk receiver with a consumer that only logs what it receives.
//!
//! ```text
//! cargo run --example upload_server -- [config.json]
//! ```
//!
//! Then send a chunk:
//!
//! ```text
//! curl -F id=abc123 -F offset=0 -F total=5 -F file=@hello.txt http://127.0.0.1:8080/
//! ```

use resumable_upload::{Config, LoggingHandler, chunk_queue, spawn_consumer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let config = Arc::new(config);

    let (chunks, receiver) = chunk_queue(&config.queue);
    let cancel = CancellationToken::new();
    let consumer = spawn_consumer(receiver, Arc::new(LoggingHandler), cancel.clone());

    println!("Upload endpoint: http://{}{}", config.server.bind_address, config.server.upload_path);
    println!("Health check:    http://{}/health", config.server.bind_address);

    resumable_upload::api::start_api_server(config, chunks).await?;

    cancel.cancel();
    consumer.await?;
    Ok(())
}
