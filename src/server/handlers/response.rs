//! JSON envelopes and error-to-status mapping shared by the handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::PortalError;
use crate::portal::RetrievalFailure;

/// `{"success": true, ...fields}`.
pub fn success(fields: Value) -> Response {
    let mut body = json!({ "success": true });
    if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
        body.extend(fields);
    }
    Json(body).into_response()
}

/// An API failure rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub stage: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stage: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}

/// Status for a portal error, looking through search wrappers.
pub fn status_for(error: &PortalError) -> StatusCode {
    match error.root() {
        PortalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PortalError::OptionNotFound { .. } | PortalError::DocumentNotFound => {
            StatusCode::NOT_FOUND
        }
        PortalError::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortalError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PortalError> for ApiError {
    fn from(error: PortalError) -> Self {
        let message = match &error {
            PortalError::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        };
        Self::new(status_for(&error), message)
    }
}

impl From<RetrievalFailure> for ApiError {
    fn from(failure: RetrievalFailure) -> Self {
        let stage = failure.stage.as_str();
        let mut error = ApiError::from(failure.error);
        error.stage = Some(stage);
        error
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.status, self.message);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.message);
        }

        let body = match self.stage {
            Some(stage) => json!({ "error": self.message, "stage": stage }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult = std::result::Result<Response, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::RetrievalState;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PortalError::InvalidRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PortalError::option_not_found("state", "Atlantis")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&PortalError::session("no browser")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&PortalError::search("CNR X", PortalError::timeout("#cnr_number", 10))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&PortalError::ElementNotFound("captcha_image".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retrieval_failure_keeps_stage() {
        let error = ApiError::from(RetrievalFailure::new(
            RetrievalState::Submitted,
            PortalError::DocumentNotFound,
        ));
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.message, "document not found");
        assert_eq!(error.stage, Some("SUBMITTED"));
    }
}
