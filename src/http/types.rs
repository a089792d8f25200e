use http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::todo_service::CreateOutcome;

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self)).into_response() }
}

impl IntoResponse for CreateOutcome {
    fn into_response(self) -> Response {
        match self {
            CreateOutcome::Created(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
            CreateOutcome::Rejected(rejection) => (StatusCode::BAD_REQUEST, axum::Json(rejection)).into_response(),
        }
    }
}
