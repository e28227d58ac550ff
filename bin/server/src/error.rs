//! Webhook error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Errors returned to the marketplace when a webhook cannot be handled.
#[derive(Debug)]
pub enum WebhookError {
    /// A required field is missing from the payload.
    IncompletePayload { field: &'static str },
    /// The message could not be processed.
    Internal { details: String },
}

impl fmt::Display for WebhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompletePayload { field } => write!(f, "webhook payload missing '{field}'"),
            Self::Internal { details } => write!(f, "webhook processing failed: {details}"),
        }
    }
}

impl std::error::Error for WebhookError {}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::IncompletePayload { field } => {
                tracing::warn!(field, "incomplete webhook payload");
                (StatusCode::BAD_REQUEST, "Dados da mensagem incompletos")
            }
            Self::Internal { details } => {
                tracing::error!("webhook processing failed: {}", details);
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let response = WebhookError::IncompletePayload {
            field: "conversation_id",
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = WebhookError::Internal {
            details: "worker panicked".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn display_names_missing_field() {
        let err = WebhookError::IncompletePayload { field: "shop_id" };
        assert!(err.to_string().contains("shop_id"));
    }
}
