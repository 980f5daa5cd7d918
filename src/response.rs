use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adaptive::EngineError;
use crate::services::coach::CoachError;
use crate::store::StoreError;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub is_operational: bool,
}

impl AppError {
    fn operational(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn too_many_requests(message: &str) -> Self {
        Self::operational(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message)
    }

    pub fn service_unavailable(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn bad_gateway(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_GATEWAY, code, message)
    }

    pub fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.to_string(),
            is_operational: false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let exposed_message = if self.is_operational {
            self.message.clone()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        };

        if self.is_operational {
            tracing::warn!(status = %self.status, code = %self.code, error = %self.message, "API error");
        } else {
            tracing::error!(status = %self.status, code = %self.code, error = %self.message, "Internal API error");
        }

        (
            self.status,
            Json(ErrorBody {
                success: false,
                code: self.code,
                message: exposed_message,
                trace_id: None,
            }),
        )
            .into_response()
    }
}

// Validation errors carry user input problems and are safe to expose.
// Everything else is redacted by IntoResponse.
impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::Validation(msg) => AppError::bad_request("VALIDATION_ERROR", msg),
            _ => AppError::internal(&value.to_string()),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::ItemNotFound(id) => AppError::operational(
                StatusCode::NOT_FOUND,
                "PRACTICE_ITEM_NOT_FOUND",
                &format!("Practice item not found: {id}"),
            ),
            EngineError::Invalid(msg) => AppError::bad_request("VALIDATION_ERROR", &msg),
            EngineError::Store(err) => err.into(),
        }
    }
}

impl From<CoachError> for AppError {
    fn from(value: CoachError) -> Self {
        match value {
            CoachError::Disabled => {
                AppError::service_unavailable("COACH_DISABLED", "AI coach is not enabled")
            }
            CoachError::Timeout => {
                AppError::operational(StatusCode::GATEWAY_TIMEOUT, "COACH_TIMEOUT", "AI coach timed out")
            }
            CoachError::Api { status, message } => {
                tracing::error!(upstream_status = status, error = %message, "Coach upstream error");
                AppError::bad_gateway("COACH_UPSTREAM_ERROR", "AI coach request failed")
            }
            CoachError::EmptyReply => {
                AppError::bad_gateway("COACH_UPSTREAM_ERROR", "AI coach returned no answer")
            }
            CoachError::Network(msg) => AppError::internal(&format!("coach network error: {msg}")),
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}
