//! Maps raw ledger failures onto the closed [`ErrorKind`] taxonomy.
//!
//! Remote call sites report failures in different shapes (wallet error codes,
//! JSON-RPC messages, revert reasons), so matching is done by code and by
//! case-insensitive substring over everything the failure carries. Rules are
//! ordered and the first match wins.

use crate::error::{ClassifiedError, ErrorKind, LedgerError};

/// EIP-1193 "user rejected request".
const CODE_USER_REJECTED: i64 = 4001;
/// JSON-RPC "invalid params".
const CODE_INVALID_PARAMS: i64 = -32602;

const CANCELLED: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected by user",
    "action_rejected",
    "cancelled",
    "canceled",
];
const INSUFFICIENT_FUNDS: &[&str] = &["insufficient funds", "insufficient balance"];
const MALFORMED: &[&str] = &["invalid params", "invalid argument", "invalid parameters"];
const DUPLICATE: &[&str] = &["already reviewed", "already voted", "already submitted"];
const SELF_ACTION: &[&str] = &["cannot review own", "cannot vote own", "own project"];
const COMMENT_TOO_SHORT: &str = "comment too short";

pub fn classify(failure: &LedgerError) -> ErrorKind {
    let code = match failure {
        LedgerError::Rejected { code, .. } => *code,
        _ => None,
    };
    let text = searchable_text(failure);
    let mentions = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if code == Some(CODE_USER_REJECTED) || mentions(CANCELLED) {
        return ErrorKind::UserCancelled;
    }
    if mentions(INSUFFICIENT_FUNDS) {
        return ErrorKind::InsufficientFunds;
    }
    if code == Some(CODE_INVALID_PARAMS) || mentions(MALFORMED) {
        return ErrorKind::MalformedArguments;
    }
    if mentions(DUPLICATE) {
        return ErrorKind::DuplicateSubmission;
    }
    if mentions(SELF_ACTION) {
        return ErrorKind::UnauthorizedSelfAction;
    }
    match failure {
        LedgerError::Rejected { .. } | LedgerError::Reverted { .. } => ErrorKind::RemoteRejected,
        LedgerError::Transport(_) => ErrorKind::Unavailable,
        LedgerError::Decode(_) => ErrorKind::Unknown,
    }
}

/// Classifies and attaches the message a user should see.
pub fn explain(failure: &LedgerError) -> ClassifiedError {
    let kind = classify(failure);
    let text = searchable_text(failure);
    let message = match kind {
        ErrorKind::DuplicateSubmission if text.contains("already voted") => {
            "You have already voted on this review".to_string()
        }
        ErrorKind::DuplicateSubmission if text.contains("already reviewed") => {
            "You have already reviewed this project".to_string()
        }
        ErrorKind::RemoteRejected if text.contains(COMMENT_TOO_SHORT) => {
            "Review comment must be at least 10 characters".to_string()
        }
        // A known remote reason reads better than the generic text
        ErrorKind::RemoteRejected => match failure.reason() {
            Some(reason) if !reason.trim().is_empty() => reason.trim().to_string(),
            _ => kind.message().to_string(),
        },
        _ => kind.message().to_string(),
    };
    ClassifiedError::new(kind, message).with_detail(failure.reason().map(str::to_string))
}

fn searchable_text(failure: &LedgerError) -> String {
    let text = match failure {
        LedgerError::Rejected {
            message, reason, ..
        } => match reason {
            Some(reason) => format!("{} {}", message, reason),
            None => message.clone(),
        },
        LedgerError::Reverted { reason } => reason.clone().unwrap_or_default(),
        LedgerError::Transport(msg) | LedgerError::Decode(msg) => msg.clone(),
    };
    text.to_lowercase()
}
