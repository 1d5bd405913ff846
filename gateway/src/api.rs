use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use travel_core::flow::TravelAgentInput;

// Output: What we send back
#[derive(Debug, Serialize, Deserialize)]
pub struct TravelAgentResponse {
    pub result: String,
}

/// Every way a `/travelAgent` call can end early. Each one is terminal for the request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    Validation(#[from] serde_json::Error),

    #[error("Method not allowed")]
    Method,

    #[error("{0:#}")]
    ModelInvocation(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Method => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::ModelInvocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Brain Failure: {}", self);
        } else {
            warn!("Rejected request ({}): {}", status, self);
        }
        // Plain text, surfaced verbatim.
        (status, self.to_string()).into_response()
    }
}

/// Decodes the request body whatever its `Content-Type` says.
pub fn parse_request(body: &[u8]) -> Result<TravelAgentInput, ApiError> {
    Ok(serde_json::from_slice(body)?)
}
