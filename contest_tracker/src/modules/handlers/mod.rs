pub mod contest;

use axum::{extract::Extension, http::StatusCode, Json};
use contest_tracker_libs::store::ContestStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ErrorReply = (StatusCode, Json<ErrorResponse>);

pub fn error_reply(status: StatusCode, message: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness(Extension(store): Extension<Arc<dyn ContestStore>>) -> StatusCode {
    match store.ping().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!("store is not ready: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
