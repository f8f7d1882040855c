use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use sea_orm::{ConnAcquireErr, DbErr};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sea_orm::DbErr),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store timeout")]
    StoreTimeout,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Too many requests")]
    RateLimited,

    #[error("Claim of {code} needs reconciliation (winner {winner_id}, claimed at {claimed_at})")]
    ReconciliationRequired {
        code: String,
        winner_id: Uuid,
        claimed_at: DateTime<Utc>,
    },

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => AppError::StoreTimeout,
            DbErr::ConnectionAcquire(e) => AppError::StoreUnavailable(e.to_string()),
            DbErr::Conn(e) => AppError::StoreUnavailable(e.to_string()),
            other => AppError::DatabaseError(other),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests from this IP, please try again later".to_string(),
            ),
            AppError::DatabaseError(_) | AppError::StoreUnavailable(_) | AppError::StoreTimeout => {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Internal server error".to_string(),
                )
            }
            AppError::ReconciliationRequired { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CLAIM_ERROR",
                "Error processing the prize".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::ValidationError(msg) => log::warn!("Validation error: {msg}"),
            AppError::Forbidden => log::warn!("Forbidden access"),
            AppError::RateLimited => log::warn!("Rate limit exceeded"),
            AppError::DatabaseError(err) => log::error!("Database error: {err}"),
            AppError::StoreUnavailable(msg) => log::error!("Store unavailable: {msg}"),
            AppError::StoreTimeout => log::error!("Store timeout"),
            AppError::ReconciliationRequired {
                code,
                winner_id,
                claimed_at,
            } => log::error!(
                "Reconciliation required: code={code} winner_id={winner_id} claimed_at={}",
                claimed_at.to_rfc3339()
            ),
            _ => log::error!("Internal error: {self}"),
        }

        let (status_code, error_code, message) = self.parts();
        HttpResponse::build(status_code).json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_faults_do_not_leak_details() {
        let err = AppError::StoreUnavailable("connection refused to 10.0.0.5:5432".into());
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "STORE_ERROR");
        assert!(!message.contains("10.0.0.5"));
    }

    #[test]
    fn pool_timeouts_are_classified() {
        let err: AppError = DbErr::ConnectionAcquire(ConnAcquireErr::Timeout).into();
        assert!(matches!(err, AppError::StoreTimeout));
        let err: AppError = DbErr::RecordNotFound("codes".into()).into();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn validation_errors_are_client_errors() {
        let err = AppError::ValidationError("Missing code".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
