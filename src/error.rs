//! Error types shared by the read path, the write path and configuration.

use serde::Serialize;
use thiserror::Error;

/// Raw failure reported by a ledger surface, before classification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Could not reach the ledger node (connection, timeout, bad HTTP status)
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote surface refused the call
    #[error("rejected ({code:?}): {message}")]
    Rejected {
        code: Option<i64>,
        message: String,
        reason: Option<String>,
    },

    /// The write was included but reverted on the ledger
    #[error("reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },

    /// A response arrived but could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn rejected(code: Option<i64>, message: impl Into<String>) -> Self {
        LedgerError::Rejected {
            code,
            message: message.into(),
            reason: None,
        }
    }

    /// Best available human-readable reason carried by the failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            LedgerError::Rejected { reason, message, .. } => {
                reason.as_deref().or(Some(message.as_str()))
            }
            LedgerError::Reverted { reason } => reason.as_deref(),
            LedgerError::Transport(msg) | LedgerError::Decode(msg) => Some(msg.as_str()),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LedgerError::Decode(err.to_string())
        } else {
            LedgerError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Decode(err.to_string())
    }
}

/// Read-path failure of a whole refresh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("could not load from the ledger: {0}")]
    Unavailable(String),
}

/// Closed failure taxonomy for write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ValidationError,
    UserCancelled,
    InsufficientFunds,
    MalformedArguments,
    DuplicateSubmission,
    UnauthorizedSelfAction,
    RemoteRejected,
    Unavailable,
    Unknown,
}

impl ErrorKind {
    /// Default user-facing message for the kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "Please check your input and try again.",
            ErrorKind::UserCancelled => "Transaction cancelled by user.",
            ErrorKind::InsufficientFunds => "Insufficient ETH balance for transaction + gas fees.",
            ErrorKind::MalformedArguments => "Invalid parameters. Check your input data.",
            ErrorKind::DuplicateSubmission => "You have already submitted this.",
            ErrorKind::UnauthorizedSelfAction => "You cannot review your own project.",
            ErrorKind::RemoteRejected => "The ledger rejected the transaction.",
            ErrorKind::Unavailable => "Could not reach the network. Please try again.",
            ErrorKind::Unknown => "Submission failed. Please try again.",
        }
    }

    /// The desired state already holds on the ledger; not a real failure for the user.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, ErrorKind::DuplicateSubmission)
    }
}

/// A failure after classification, as handed to callers and observers.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw remote reason, if any; kept for logs, not for display
    pub detail: Option<String>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}

/// Missing or malformed configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid contract info: {0}")]
    ContractInfo(#[from] serde_json::Error),
}
