use crate::{
    errors::AppError,
    semantic::{SearchResponse, SimilarityService},
};
use anyhow::Context;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;

/// Multipart field carrying the report
const FILE_FIELD: &str = "file";

#[derive(Clone)]
struct SharedState {
    service: Arc<SimilarityService>,
}

pub fn router(service: Arc<SimilarityService>, max_upload_bytes: usize) -> Router {
    let shared_state = Arc::new(SharedState { service });

    Router::new()
        .route("/upload", post(upload))
        .route("/api/status", get(status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

async fn start_app(app: Router, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    log::info!("listening on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Serve until Ctrl+C or SIGTERM.
///
/// The service is fully built before this is called, so the first request
/// already sees the complete index.
pub fn start_daemon(
    service: Arc<SimilarityService>,
    bind: &str,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let app = router(service, max_upload_bytes);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { start_app(app, bind).await })
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = if self.0.is_client_error() {
            log::debug!("rejected upload: {}", self.0);
            axum::http::StatusCode::BAD_REQUEST
        } else {
            log::error!("{self:?}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Pull the bytes of the `file` field out of the form.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Processing(err.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::Processing(err.body_text()))?;
        return Ok(bytes.to_vec());
    }

    Err(AppError::no_file())
}

async fn upload(
    State(state): State<Arc<SharedState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, HttpError> {
    let multipart = multipart.map_err(|err| {
        log::debug!("not a multipart upload: {err}");
        AppError::no_file()
    })?;

    let bytes = read_file_field(multipart).await?;
    log::debug!("upload of {} bytes", bytes.len());

    let service = state.service.clone();

    tokio::task::block_in_place(move || {
        service
            .search_upload(&bytes)
            .map(Into::into)
            .map_err(Into::into)
    })
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusResponse {
    pub records: usize,
    pub dimensions: usize,
    pub model: String,
}

async fn status(State(state): State<Arc<SharedState>>) -> Json<StatusResponse> {
    StatusResponse {
        records: state.service.corpus_len(),
        dimensions: state.service.dimensions(),
        model: state.service.model_name().to_string(),
    }
    .into()
}
