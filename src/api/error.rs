use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can produce. Handlers bubble these up with `?` and
/// the `IntoResponse` impl turns them into structured JSON at the boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<(&'static str, &'static str)>),

    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("{0}")]
    MalformedPayload(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("no active account found with the given credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid page")]
    InvalidPage,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn validation(field: &'static str, message: &'static str) -> Self {
        Self::Validation(vec![(field, message)])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation(_)
            | AppError::InvalidArgument(_)
            | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::InvalidPage => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::TaskJoin(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // The detail goes to the log, not to the client.
            error!("{self}");
            json!({ "error": "internal server error" })
        } else if let AppError::Validation(fields) = &self {
            let fields: serde_json::Map<_, _> = fields
                .iter()
                .map(|(field, message)| (field.to_string(), json!(message)))
                .collect();
            json!({ "error": self.to_string(), "fields": fields })
        } else {
            json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}
