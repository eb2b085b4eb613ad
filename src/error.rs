//! Error type for the prediction service and its mapping onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Upload declared a non-image content type.
    #[error("File must be an image (got '{0}')")]
    NotAnImage(String),

    #[error("No file uploaded; expected a multipart field named 'file'")]
    MissingFile,

    #[error("Uploaded file exceeds the {0} byte limit")]
    UploadTooLarge(usize),

    /// Multipart stream could not be read.
    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAnImage(_)
            | ApiError::MissingFile
            | ApiError::UploadTooLarge(_)
            | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageDecode(_)
            | ApiError::Inference(_)
            | ApiError::ModelLoad(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        ApiError::Upload(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
