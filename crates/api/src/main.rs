use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tracing::{error, info, warn};

use contact_store::ContactStore;
use resolver::{IdentifyRequest, IdentifyResponse, Resolver, ResolverError};

#[derive(Clone)]
struct AppState {
    resolver: Arc<Resolver>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("IDENTITY_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let db_url =
        env::var("IDENTITY_DB_URL").unwrap_or_else(|_| "sqlite:identity.db?mode=rwc".to_string());

    let store = ContactStore::connect(&db_url)
        .await
        .expect("Failed to connect to contact store");
    store.migrate().await.expect("Failed to run migrations");

    let state = AppState {
        resolver: Arc::new(Resolver::new(store)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/identify", post(identify))
        .with_state(state);

    let addr: SocketAddr = addr.parse().expect("Invalid IDENTITY_API_ADDR");
    info!(%addr, "Identity API listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn identify(
    State(state): State<AppState>,
    Json(payload): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let identity = state.resolver.identify(payload).await?;
    Ok(Json(identity))
}

#[derive(Debug)]
struct ApiError(ResolverError);

impl From<ResolverError> for ApiError {
    fn from(err: ResolverError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ResolverError::InvalidInput => StatusCode::BAD_REQUEST,
            ResolverError::NotFound
            | ResolverError::DataIntegrity(_)
            | ResolverError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "identify failed");
        } else {
            warn!(error = %self.0, "rejected identify request");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad = ApiError(ResolverError::InvalidInput).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let fatal = ApiError(ResolverError::DataIntegrity("broken chain".to_string()));
        assert_eq!(
            fatal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
