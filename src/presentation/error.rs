// Mapping of service errors onto HTTP responses
use crate::application::error::RepositoryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

const LOGIN_PATH: &str = "/login";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Repository(e) => match e {
                RepositoryError::Unauthorized => StatusCode::UNAUTHORIZED,
                RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                RepositoryError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                RepositoryError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                RepositoryError::Status { .. }
                | RepositoryError::Transport(_)
                | RepositoryError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = if status == StatusCode::UNAUTHORIZED {
            json!({ "error": self.to_string(), "redirect": LOGIN_PATH })
        } else {
            json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(RepositoryError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(RepositoryError::not_found("device x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::from(RepositoryError::Status { status: 500, body: String::new() }).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(RepositoryError::Rejected {
                status: 409,
                message: "Email already registered".to_string()
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("window".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_response_points_to_login() {
        let response = AppError::from(RepositoryError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["redirect"], "/login");
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_other_errors_carry_no_redirect() {
        let response = AppError::from(RepositoryError::not_found("device x")).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found: device x");
        assert!(body.get("redirect").is_none());
    }
}
