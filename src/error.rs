//! Request-level error taxonomy. Every variant renders as a JSON "apology"
//! body `{"error": "<message>"}` with its status code; nothing here is
//! allowed to escape a handler as a crash.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::ledger::TradeError;
use crate::portfolio::PortfolioError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("must provide {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidFormat(&'static str),
    #[error("stock does not exist")]
    UnknownSymbol,
    #[error("not enough cash")]
    InsufficientFunds,
    #[error("trying to sell more shares than owned")]
    InsufficientShares,
    #[error("username already taken, try a different one")]
    UsernameTaken,
    #[error("invalid username and/or password")]
    InvalidCredentials,
    #[error("passwords don't match")]
    PasswordMismatch,
    #[error("authentication required")]
    Unauthorized,
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::InvalidFormat(_)
            | ApiError::UnknownSymbol
            | ApiError::InsufficientFunds
            | ApiError::InsufficientShares
            | ApiError::UsernameTaken
            | ApiError::PasswordMismatch => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            log::error!("internal error: {detail}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        match err {
            TradeError::InsufficientFunds { .. } => ApiError::InsufficientFunds,
            TradeError::InsufficientShares { .. } => ApiError::InsufficientShares,
            TradeError::InvalidShareCount { .. } => {
                ApiError::InvalidFormat("shares must be a positive whole number")
            }
            TradeError::UnknownAccount => ApiError::Unauthorized,
        }
    }
}

impl From<PortfolioError> for ApiError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::UnknownSymbol { .. } => ApiError::UnknownSymbol,
            PortfolioError::UnknownAccount => ApiError::Unauthorized,
        }
    }
}
