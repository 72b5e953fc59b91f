use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// The TTN API calls this tool makes, in the order a full run issues them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListApplications,
    CreateApplication,
    SetFormatter,
    RegisterDevice,
    ConfigureNetworkServer,
    ConfigureApplicationServer,
    ConfigureJoinServer,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListApplications => write!(f, "application listing"),
            Operation::CreateApplication => write!(f, "application creation"),
            Operation::SetFormatter => write!(f, "formatter setup"),
            Operation::RegisterDevice => write!(f, "device registration"),
            Operation::ConfigureNetworkServer => write!(f, "network server device config"),
            Operation::ConfigureApplicationServer => write!(f, "application server device config"),
            Operation::ConfigureJoinServer => write!(f, "join server device config"),
        }
    }
}

/// Errors returned by [`TtnClient`](super::TtnClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("Error during {operation}: status {status}: {body}")]
    Status {
        operation: Operation,
        status: StatusCode,
        body: String,
    },

    /// The request never produced a response (connect failure, timeout, ...)
    #[error("Error during {operation}: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    /// A success response whose body could not be decoded
    #[error("Error during {operation}: unexpected response body: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("API token is not a valid header value")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a rejected call, if the API answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ApiError::Status { operation, .. }
            | ApiError::Transport { operation, .. }
            | ApiError::Decode { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
