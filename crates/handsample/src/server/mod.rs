//! HTTP front end for handsample.
//!
//! Three steps are served: the questionnaire (`/`), the photo upload
//! (`/upload`) and the confirmation page (`/thankyou`). The handlers are thin;
//! validation and persistence live in [`crate::intake`].

mod handlers;
mod pages;
mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::intake::Intake;
use crate::session::DraftStore;
use crate::upload::MAX_UPLOAD_BYTES;

pub use session::SessionContext;

/// How often idle drafts are swept out of memory.
const DRAFT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    intake: Arc<Intake>,
    drafts: Arc<DraftStore>,
    cookie_name: Arc<str>,
}

impl AppState {
    /// Create state from its parts.
    #[must_use]
    pub fn new(intake: Intake, drafts: DraftStore, cookie_name: impl Into<String>) -> Self {
        Self {
            intake: Arc::new(intake),
            drafts: Arc::new(drafts),
            cookie_name: Arc::from(cookie_name.into()),
        }
    }

    /// Create state for the configured data directory and session settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage locations cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Intake::from_config(config)?,
            DraftStore::new(config.session_idle_timeout()),
            config.session.cookie_name.clone(),
        ))
    }

    /// The intake pipeline.
    #[must_use]
    pub fn intake(&self) -> &Arc<Intake> {
        &self.intake
    }

    /// The draft table.
    #[must_use]
    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::questionnaire_page).post(handlers::submit_questionnaire),
        )
        .route(
            "/upload",
            get(handlers::upload_page).post(handlers::submit_photo),
        )
        .route("/thankyou", get(handlers::thank_you))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the storage cannot be opened, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let addr = config.bind_addr().map_err(|e| Error::ConfigValidation {
        message: format!("server.host is not a valid address: {e}"),
    })?;

    info!(
        "Storing submissions under {}",
        state.intake().store().path().display()
    );

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let sweeper = spawn_draft_sweeper(Arc::clone(&state.drafts), DRAFT_SWEEP_INTERVAL);
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drop drafts whose sessions went idle.
fn spawn_draft_sweeper(drafts: Arc<DraftStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = drafts.purge_expired();
            if removed > 0 {
                debug!("Dropped {removed} idle drafts");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_payload_too_large() {
            return (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()).into_response();
        }
        if self.is_client_error() {
            debug!("Rejected upload: {self}");
            return (StatusCode::BAD_REQUEST, self.to_string()).into_response();
        }

        error!("{self}");
        let message = match self {
            Self::UploadSave { .. } => "Failed to save file",
            _ => "Internal server error",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

#[cfg(test)]
mod tests;
