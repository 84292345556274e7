use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error": ..., "message": ...}`, `message` omitted when empty.
#[derive(Debug, Clone, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: Option<String>) -> Self {
        Self { status, error: error.into(), message }
    }

    pub fn not_found() -> Self { Self::new(StatusCode::NOT_FOUND, "Contact not found", None) }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(message.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => JsonApiError::not_found(),
            ServiceError::Validation(msg) => JsonApiError::bad_request(msg),
            ServiceError::Model(models::errors::ModelError::Validation(msg)) => JsonApiError::bad_request(msg),
            // empty export is a domain outcome, safe to show
            ServiceError::Export(msg) if msg == service::export::NO_CONTACTS => {
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(msg))
            }
            other => {
                // details stay in the log
                error!(error = %other, "request failed");
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::imaging::ImageError;

    fn body(err: JsonApiError) -> serde_json::Value { serde_json::to_value(&err).unwrap() }

    #[test]
    fn not_found_has_fixed_body() {
        let err: JsonApiError = ServiceError::not_found("contact").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(body(err), serde_json::json!({"error": "Contact not found"}));
    }

    #[test]
    fn validation_maps_to_400() {
        let err: JsonApiError = ServiceError::Validation("Invalid phoneNumbers format".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message.as_deref(), Some("Invalid phoneNumbers format"));

        let err: JsonApiError = ServiceError::Model(models::errors::ModelError::Validation("name is required".into())).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn collaborator_failures_map_to_500_without_details() {
        for e in [
            ServiceError::Db("connection reset by 10.0.0.5:5432".into()),
            ServiceError::Export("permission denied: /var/exports/contacts.csv".into()),
            ServiceError::Image(ImageError::Upload("timeout".into())),
            ServiceError::Image(ImageError::Decode("bad header".into())),
        ] {
            let raw = e.to_string();
            let err: JsonApiError = e.into();
            assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
            let text = body(err).to_string();
            assert_eq!(text, r#"{"error":"Internal Server Error"}"#);
            assert!(!text.contains(&raw));
        }
    }

    #[test]
    fn empty_export_keeps_its_message() {
        let err: JsonApiError = ServiceError::Export(service::export::NO_CONTACTS.into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message.as_deref(), Some("No contacts found"));
    }
}
