use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    EntityNotFound(String),
    // 予約者でも所有者でもない、あるいは所有者が自分のアイテムを予約しようとした
    #[error("{0}")]
    InvalidRelation(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidBookingState(String),
    #[error("Unknown state: {0}")]
    InvalidState(String),
    #[error("{0}")]
    InvalidPagination(String),
    #[error("{0}")]
    NoFinishedBooking(String),
    #[error("{0}")]
    DuplicateEmail(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("{0}")]
    UnauthenticatedError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityNotFound(_) | AppError::InvalidRelation(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidBookingState(_)
            | AppError::InvalidState(_)
            | AppError::InvalidPagination(_)
            | AppError::NoFinishedBooking(_)
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::UnauthenticatedError(_) => StatusCode::UNAUTHORIZED,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::ConversionEntityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
        } else {
            tracing::warn!(status = %status_code, error.message = %self, "Request rejected");
        }

        (
            status_code,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
