use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use shopify_session_engine::{ExchangeError, SessionStoreError, ValidationError};
use thiserror::Error;

// Error messages become response bodies. None of the variants below may ever carry the client
// secret or a raw session token in their Display output.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Session token invalid or not provided")]
    MissingSessionToken,
    #[error("Session token rejected. {0}")]
    ValidationError(#[from] ValidationError),
    #[error(transparent)]
    ExchangeError(#[from] ExchangeError),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Every validation failure is the caller's fault; a retry with the same token will not
            // succeed.
            Self::MissingSessionToken => StatusCode::UNAUTHORIZED,
            Self::ValidationError(_) => StatusCode::UNAUTHORIZED,
            Self::ExchangeError(e) => match e {
                ExchangeError::InvalidSessionToken(_) => StatusCode::UNAUTHORIZED,
                ExchangeError::ExchangeRejected { .. } => StatusCode::BAD_GATEWAY,
                ExchangeError::ExchangeTransportError(_) => StatusCode::GATEWAY_TIMEOUT,
                ExchangeError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<SessionStoreError> for ServerError {
    fn from(e: SessionStoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
