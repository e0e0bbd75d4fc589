use thiserror::Error;

/// Every way a single bridged request can fail.
///
/// The worker turns each of these into a failure envelope; none of them ends
/// the worker loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The backend could not be reached (refused, unreachable, timed out).
    #[error("couldn't connect to server: {0}")]
    Connection(String),

    /// Credentials are missing or were rejected by the backend.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// The backend answered with something that is not a usable JSON-RPC reply.
    #[error("{0}")]
    Protocol(String),

    /// The backend returned a structured JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: String, message: String },

    /// Malformed inbound message or malformed structured argument.
    #[error("parse error: {0}")]
    Parse(String),

    /// The payment request store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Well-formed request with the wrong number or shape of arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl BridgeError {
    /// Whether retrying the same call may succeed. Only transport-level
    /// connection failures qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BridgeError::Connection(_))
    }

    /// Stable error code sent to clients in `errors.code`.
    pub fn code(&self) -> String {
        match self {
            BridgeError::Connection(_) => "connection_error".to_string(),
            BridgeError::Auth(_) => "auth_error".to_string(),
            BridgeError::Protocol(_) => "protocol_error".to_string(),
            BridgeError::Rpc { code, .. } => code.clone(),
            BridgeError::Parse(_) => "parse_error".to_string(),
            BridgeError::Persistence(_) => "persistence_error".to_string(),
            BridgeError::InvalidArguments(_) => "invalid_arguments".to_string(),
        }
    }

    /// Message sent to clients in `errors.message`.
    pub fn client_message(&self) -> String {
        match self {
            BridgeError::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Parse(e.to_string())
    }
}
