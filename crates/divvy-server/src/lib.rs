//! Divvy Web Server
//!
//! Axum-based REST API for the Divvy split suggestion engine.
//!
//! Routing:
//! - `/api/health` - service and backend status
//! - `/api/groups` - expense group CRUD
//! - `/api/transactions` - transaction ingestion and lookup
//! - `/api/transactions/:id/suggest-split` - one suggestion
//! - `/api/transactions/:id/splits` - record an accepted split
//! - `/api/suggestions/recent` - batch suggestions over recent transactions

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use divvy_core::{Store, SuggestionEngine};

mod handlers;

/// Maximum limit accepted on list endpoints
pub const MAX_PAGE_LIMIT: i64 = 100;

/// How many suggestion requests the batch endpoint runs at once
pub const BATCH_CONCURRENCY: usize = 4;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub store: Store,
    pub engine: SuggestionEngine,
}

/// Create the application router
pub fn create_router(store: Store, config: ServerConfig) -> Router {
    let engine = SuggestionEngine::from_env();
    create_router_with_engine(store, config, engine)
}

/// Create the application router with an explicit engine (for testing)
pub fn create_router_with_engine(
    store: Store,
    config: ServerConfig,
    engine: SuggestionEngine,
) -> Router {
    let state = Arc::new(AppState { store, engine });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Groups
        .route(
            "/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route("/groups/:id", get(handlers::get_group))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/:id", get(handlers::get_transaction))
        // Suggestions
        .route(
            "/transactions/:id/suggest-split",
            get(handlers::suggest_split),
        )
        .route("/transactions/:id/splits", post(handlers::record_split))
        .route("/suggestions/recent", get(handlers::recent_suggestions))
        .with_state(state);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_origin(origins);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the server until interrupted
pub async fn run_server(store: Store, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let engine = SuggestionEngine::from_env();
    if engine.has_backend() {
        if engine.backend_healthy().await {
            info!("Reasoning backend connected");
        } else {
            warn!("Reasoning backend configured but not responding; suggestions will fall back");
        }
    } else {
        info!("No reasoning backend configured (set OPENAI_API_KEY); serving fallback suggestions");
    }

    let app = create_router_with_engine(store, config, engine);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }
}

/// Map core errors onto client-facing statuses. Input errors keep their
/// message; everything else is sanitized to a generic 500 and logged.
impl From<divvy_core::Error> for AppError {
    fn from(err: divvy_core::Error) -> Self {
        match err {
            divvy_core::Error::NoGroups => Self::bad_request(&err.to_string()),
            divvy_core::Error::InvalidInput(_) => Self::bad_request(&err.to_string()),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(other.into()),
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests;
