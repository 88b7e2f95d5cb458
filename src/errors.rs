// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackdropError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

impl ResponseError for BackdropError {
    fn error_response(&self) -> HttpResponse {
        match self {
            BackdropError::Storage(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Storage error",
                    "message": self.to_string()
                }))
            }
            BackdropError::Generation(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "AI service error",
                    "message": self.to_string()
                }))
            }
            BackdropError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            BackdropError::Serialization(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Data processing error",
                    "message": self.to_string()
                }))
            }
            BackdropError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            BackdropError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "Not found",
                "message": self.to_string()
            })),
            BackdropError::LimitExceeded(_) => HttpResponse::Conflict().json(serde_json::json!({
                "error": "Limit exceeded",
                "message": self.to_string()
            })),
        }
    }
}
