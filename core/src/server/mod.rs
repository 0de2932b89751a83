//! HTTP surface
//!
//! Routes, all under [`API_PREFIX`]:
//! - `POST /upload`: multipart field `file`
//! - `GET /metadata?file=<name>&tag=<expr>`: JSON value of one tag, or every tag
//! - `GET /png/conversion?file=<name>`: zip archive with one PNG per frame

mod body;
mod error;
mod handlers;

pub use handlers::UPLOAD_FIELD;

use crate::dataset::{DatasetDecoder, DicomDecoder};
use crate::storage::{Storage, DEFAULT_STORAGE_DIR};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use clap::Args;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Path prefix of the versioned API
pub const API_PREFIX: &str = "/dicom/v1";

/// Server configuration
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding uploaded files
    #[arg(long, default_value = DEFAULT_STORAGE_DIR)]
    pub storage_dir: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 512)]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_mb: 512,
        }
    }
}

/// Shared, read-only request state
pub struct AppState<D> {
    storage: Arc<Storage>,
    decoder: Arc<D>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

impl<D> AppState<D> {
    pub fn new(storage: Storage, decoder: D) -> Self {
        Self {
            storage: Arc::new(storage),
            decoder: Arc::new(decoder),
        }
    }
}

/// Builds the router with an upload limit of `max_upload_bytes`
pub fn router<D>(state: AppState<D>, max_upload_bytes: usize) -> Router
where
    D: DatasetDecoder + 'static,
{
    let api = Router::new()
        .route("/upload", post(handlers::upload::<D>))
        .route("/metadata", get(handlers::get_metadata::<D>))
        .route("/png/conversion", get(handlers::convert_to_png::<D>));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest(API_PREFIX, api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Runs the server until the process is stopped
pub fn run(config: ServerConfig) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let storage = Storage::new(&config.storage_dir);
    info!("Storage directory: {}", storage.root().display());

    let state = AppState::new(storage, DicomDecoder);
    let app = router(state, config.max_upload_mb * 1024 * 1024);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}{}", addr, API_PREFIX);
    axum::serve(listener, app).await
}
