use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use partner_billing_engine::BillingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    ConflictingState(String),
    #[error("The payment gateway could not be consulted. {0}")]
    GatewayUnavailable(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ConflictingState(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // A 5xx tells the gateway to redeliver the webhook once we can answer authoritatively
            Self::GatewayUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<BillingError> for ServerError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            BillingError::PartnerNotFound(_) | BillingError::InvoiceNotFound(_) | BillingError::NoMatchingInvoice(_) => {
                Self::NoRecordFound(e.to_string())
            },
            BillingError::PaymentAlreadyAttached(_, _) |
            BillingError::InvoiceNotPending(_, _) |
            BillingError::FeeAlreadySettled => Self::ConflictingState(e.to_string()),
            BillingError::EmptyFeeSet | BillingError::NegativeFeeAmount => Self::InvalidRequestBody(e.to_string()),
        }
    }
}
