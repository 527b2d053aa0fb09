use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid Serial ID")]
    pub error: String,
}

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Serial ID is required")]
    MissingSerialId,

    #[display(fmt = "Invalid Serial ID")]
    InvalidSerialId,

    #[display(fmt = "Student not found")]
    StudentNotFound,

    #[display(fmt = "No attendance records found")]
    NoAttendanceRecords,

    #[display(fmt = "This endpoint only supports GET and POST requests")]
    MethodNotAllowed,

    /// The cause is logged, never sent to the client.
    #[display(fmt = "Internal Server Error")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Storage(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingSerialId | ApiError::InvalidSerialId => StatusCode::BAD_REQUEST,
            ApiError::StudentNotFound | ApiError::NoAttendanceRecords => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(e) = self {
            error!(error = %e, "Storage failure while handling request");
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
