//! HTTP control API

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::WebConfig;
use cukerun_common::{RunOptions, RunRecord, RunToken, TestInfo};
use cukerun_dispatcher::{Dispatcher, TestCatalog};

/// Shared state behind every handler
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub catalog: Arc<TestCatalog>,
}

impl AppState {
    pub fn new(config: &WebConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.dispatcher.clone()),
            catalog: Arc::new(TestCatalog::new(config.features_dir.clone())),
        }
    }
}

/// Error returned from a handler as `{ "error": "..." }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Lookups report every failure as 404
    fn lookup(e: cukerun_common::Error) -> Self {
        ApiError::NotFound(e.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<cukerun_common::Error> for ApiError {
    fn from(e: cukerun_common::Error) -> Self {
        if e.is_not_found() {
            ApiError::NotFound(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
struct RunResponse {
    token: RunToken,
}

/// Build the router for the given state
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/tests", get(list_tests_handler))
        .route("/tests/run", post(run_tests_handler))
        .route("/tests/results/:token", get(get_results_handler))
        .route("/tests/tags/:tag", get(tests_by_tag_handler))
        .route("/suites", get(list_suites_handler))
        .route("/suites/:suite_name/tests", get(suite_tests_handler));

    Router::new()
        .nest("/api", api)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn serve(config: WebConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(&config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("API server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "cukerun-web",
        "version": cukerun_common::VERSION,
        "runs": state.dispatcher.stats(),
    }))
}

/// An empty body or `null` selects every scenario
fn parse_run_options(body: &[u8]) -> Result<RunOptions, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunOptions::default());
    }
    serde_json::from_slice::<Option<RunOptions>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::BadRequest(format!("Invalid run options: {}", e)))
}

async fn run_tests_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<RunResponse> {
    let options = parse_run_options(&body)?;
    let token = state.dispatcher.run(&options);
    Ok(Json(RunResponse { token }))
}

async fn get_results_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<RunRecord> {
    let token: RunToken = token.parse()?;
    Ok(Json(state.dispatcher.get_result(&token)?))
}

/// Run a catalog query off the async workers, since the first one walks the
/// features directory.
async fn with_catalog<T, F>(
    state: &AppState,
    query: F,
) -> Result<cukerun_common::Result<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TestCatalog) -> cukerun_common::Result<T> + Send + 'static,
{
    let catalog = Arc::clone(&state.catalog);
    tokio::task::spawn_blocking(move || query(&catalog))
        .await
        .map_err(|e| ApiError::Internal(format!("Catalog task failed: {}", e)))
}

async fn list_tests_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TestInfo>> {
    let tests = with_catalog(&state, |catalog| catalog.all_tests().map(<[TestInfo]>::to_vec))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(tests))
}

async fn list_suites_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let suites = with_catalog(&state, |catalog| catalog.suites())
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(suites))
}

async fn suite_tests_handler(
    State(state): State<Arc<AppState>>,
    Path(suite_name): Path<String>,
) -> ApiResult<Vec<TestInfo>> {
    let tests = with_catalog(&state, move |catalog| catalog.tests_in_suite(&suite_name))
        .await?
        .map_err(ApiError::lookup)?;
    Ok(Json(tests))
}

async fn tests_by_tag_handler(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> ApiResult<Vec<TestInfo>> {
    let tests = with_catalog(&state, move |catalog| catalog.tests_by_tag(&tag))
        .await?
        .map_err(ApiError::lookup)?;
    Ok(Json(tests))
}

async fn not_found_handler() -> impl IntoResponse {
    ApiError::NotFound("not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let not_found: ApiError = cukerun_common::Error::run_not_found("x").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let internal: ApiError = cukerun_common::Error::Catalog("broken".into()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let lookup = ApiError::lookup(cukerun_common::Error::Catalog("broken".into()));
        assert_eq!(lookup.status(), StatusCode::NOT_FOUND);

        let bad = ApiError::BadRequest("nope".into());
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_run_options() {
        assert_eq!(parse_run_options(b"").unwrap(), RunOptions::default());
        assert_eq!(parse_run_options(b" \n").unwrap(), RunOptions::default());
        assert_eq!(parse_run_options(b"null").unwrap(), RunOptions::default());

        let opts = parse_run_options(br#"{"suite":"smoke","tags":null}"#).unwrap();
        assert_eq!(opts, RunOptions::default().with_suite("smoke"));

        let err = parse_run_options(b"{not json").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_catalog_query_runs_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.feature"),
            "@core\nFeature: A\n  Scenario: One\n",
        )
        .unwrap();
        let config = WebConfig {
            features_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let state = AppState::new(&config);

        let caller = std::thread::current().id();
        let (worker, suites) = with_catalog(&state, |catalog| {
            Ok((std::thread::current().id(), catalog.suites()?))
        })
        .await
        .unwrap()
        .unwrap();
        assert_ne!(worker, caller);
        assert_eq!(suites, vec!["core".to_string()]);
    }
}
