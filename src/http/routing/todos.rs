use axum::{extract::State, response::Response, routing::post, Json, Router};
use axum::response::IntoResponse;

use crate::{application::todo_service::TodoService, domain::todo::Todo, http::types::ApiError};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", post(create_todo::<S>).get(list_todos::<S>))
        .with_state(state)
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, Json(payload): Json<Todo>) -> Result<Response, ApiError> {
    let outcome = state.service.create(payload).await.map_err(internal_error)?;
    Ok(outcome.into_response())
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<serde_json::Value>, ApiError> {
    let todos = state.service.list().await.map_err(internal_error)?;
    Ok(Json(serde_json::json!({ "items": todos })))
}

fn internal_error(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "todo request failed");
    ApiError::internal(e)
}
