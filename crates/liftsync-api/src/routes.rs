use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use liftsync_core::RemoteExecution;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::verify_api_token;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::{DocumentStore, ExecutionPage, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<DocumentStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: DocumentStore) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    /// Open the document store named by the config.
    pub async fn open(config: Arc<AppConfig>) -> Result<Self, StoreError> {
        let store = DocumentStore::open(&config.db_path).await?;
        Ok(Self::new(config, store))
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/executions", get(list_executions))
        .route("/executions/{id}", put(put_execution))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.api_token.as_deref() {
        verify_api_token(request.headers(), expected)?;
    }
    Ok(next.run(request).await)
}

async fn put_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(document): Json<RemoteExecution>,
) -> Result<Json<RemoteExecution>, AppError> {
    if document.id != id {
        return Err(AppError::bad_request(format!(
            "path id `{id}` does not match document id `{}`",
            document.id
        )));
    }
    validate_document(&document)?;

    let stored = state.store.put(&document).await?;
    tracing::debug!(id = %stored.id, owner_id = %stored.owner_id, "Stored execution");
    Ok(Json(stored))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    owner_id: Option<String>,
    limit: Option<u32>,
    cursor: Option<String>,
}

async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ExecutionPage>, AppError> {
    let owner_id = query
        .owner_id
        .as_deref()
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .ok_or_else(|| AppError::unprocessable("owner_id query parameter is required"))?;
    let cursor = query
        .cursor
        .as_deref()
        .map(str::trim)
        .filter(|cursor| !cursor.is_empty());
    let limit = state.config.page_size(query.limit);

    let page = state.store.page(owner_id, limit, cursor).await?;
    tracing::debug!(
        owner_id,
        count = page.items.len(),
        more = page.next_cursor.is_some(),
        "Listed executions"
    );
    Ok(Json(page))
}

fn validate_document(document: &RemoteExecution) -> Result<(), AppError> {
    let fields = [
        ("id", document.id.as_str()),
        ("owner_id", document.owner_id.as_str()),
        ("workout_id", document.workout_id.as_str()),
        ("workout_name", document.workout_name.as_str()),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::unprocessable(format!("{name} must not be empty")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> RemoteExecution {
        RemoteExecution {
            id: "01890a5d-ac96-774b-bcce-b302099a8057".to_string(),
            workout_id: "w-push".to_string(),
            workout_name: "Push day".to_string(),
            owner_id: "u1".to_string(),
            performed_at: 1_700_000_000_000,
            notes: None,
            duration_seconds: 600,
            completed: true,
            synced_at: None,
        }
    }

    #[test]
    fn complete_documents_pass_validation() {
        assert!(validate_document(&document()).is_ok());
    }

    #[test]
    fn blank_fields_are_unprocessable() {
        let mut blank_owner = document();
        blank_owner.owner_id = "  ".to_string();
        assert!(matches!(
            validate_document(&blank_owner),
            Err(AppError::Unprocessable(message)) if message.contains("owner_id")
        ));

        let mut blank_name = document();
        blank_name.workout_name = String::new();
        assert!(matches!(
            validate_document(&blank_name),
            Err(AppError::Unprocessable(message)) if message.contains("workout_name")
        ));
    }
}
