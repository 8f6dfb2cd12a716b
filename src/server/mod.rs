//! HTTP boundary for the receipt sorting service.
//!
//! Three operations: upload a batch of receipt images, watch the job's
//! progress over SSE, and download the finished document. State is the
//! job registry plus shared settings and the OCR engine.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::jobs::JobRegistry;
use crate::ocr::{OcrEngine, TesseractEngine};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<JobRegistry>,
    pub engine: Arc<dyn OcrEngine>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(JobRegistry::new(settings.max_concurrent_jobs));
        let engine = Arc::new(TesseractEngine::new(settings.ocr_language.clone()));
        Self {
            settings: Arc::new(settings),
            registry,
            engine,
        }
    }
}

/// Run the server until the listener fails or the process is stopped.
pub async fn serve(settings: Settings, addr: SocketAddr) -> anyhow::Result<()> {
    settings.ensure_dirs()?;

    let state = AppState::new(settings);
    if !state.engine.is_available() {
        tracing::warn!("{}", state.engine.availability_hint());
    }

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
