use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    core::serial::SerialError, intake::IntakeError, persist::PersistError,
    runtime::handle::RuntimeError,
};

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub retryable: bool,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            title,
            status: status.as_u16(),
            detail: detail.into(),
            code: code.into(),
            retryable: false,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn with_status(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::with_status(StatusCode::CONFLICT, code, message);
        err.problem.retryable = true;
        err
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::with_status(StatusCode::SERVICE_UNAVAILABLE, code, message);
        err.problem.retryable = true;
        err
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("invalid_body", rejection.body_text())
    }
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match &err {
            PersistError::DuplicateKey(_) => Self::conflict("duplicate_key", err.to_string()),
            PersistError::Unavailable(_) => Self::unavailable("store_unavailable", err.to_string()),
            PersistError::Corrupt(_) | PersistError::Message(_) => {
                Self::internal("store_error", err.to_string())
            }
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Intake(IntakeError::UnknownVendor(code)) => {
                Self::not_found("unknown_vendor", format!("vendor {code:?} is not in the directory"))
            }
            RuntimeError::Intake(err @ IntakeError::InvalidBatch { .. }) => {
                Self::bad_request("invalid_batch", err.to_string())
            }
            RuntimeError::Intake(IntakeError::Serial(err @ SerialError::CounterOverflow { .. })) => {
                Self::internal("counter_overflow", err.to_string())
            }
            RuntimeError::Intake(IntakeError::Serial(err)) => Self::internal("serial_error", err.to_string()),
            RuntimeError::Intake(IntakeError::Persist(err)) | RuntimeError::Persist(err) => err.into(),
            other @ (RuntimeError::Worker(_) | RuntimeError::ChannelClosed) => {
                Self::unavailable("runtime_unavailable", other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
