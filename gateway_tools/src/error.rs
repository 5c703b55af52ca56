use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize the gateway client. {0}")]
    Initialization(String),
    #[error("The gateway request failed. {0}")]
    RequestError(String),
    #[error("The gateway returned an error response. {status}: {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize the gateway response. {0}")]
    JsonError(String),
    #[error("The gateway returned an empty response")]
    EmptyResponse,
}
