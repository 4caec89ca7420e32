//! Sign-in endpoint.
//!
//! Credential checking and token issuing do not exist yet. The handler says
//! so explicitly instead of pretending the sign-in succeeded.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result of a sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigninOutcome {
    /// Placeholder until a credential store exists.
    NotImplemented,
}

impl IntoResponse for SigninOutcome {
    fn into_response(self) -> Response {
        match self {
            SigninOutcome::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                Json(json!({
                    "error": "not_implemented",
                    "message": "sign-in is not implemented",
                })),
            )
                .into_response(),
        }
    }
}

pub async fn signin_handler(method: Method) -> SigninOutcome {
    tracing::warn!(method = %method, "Sign-in requested but not implemented");
    SigninOutcome::NotImplemented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_is_explicit() {
        let response = signin_handler(Method::POST).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "not_implemented");
    }
}
