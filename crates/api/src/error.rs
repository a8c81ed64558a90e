use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use estate_storage::{StoreError, UniqueField};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{} already taken", .0.as_str())]
    Duplicate(UniqueField),
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => Self::Duplicate(field),
            other => Self::Storage(other),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(UniqueField::Username) => "username_taken",
            Self::Duplicate(UniqueField::Email) => "email_taken",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Storage(err) => {
                tracing::error!(error = %err, "record store failure");
                "failed to access the record store".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(serde_json::json!({
                "error": self.code(),
                "message": message
            })),
        )
            .into_response()
    }
}
