use crate::error::ClassifiedError;
use crate::ledger::SubmissionRef;
use crate::models::listing::NewListing;
use crate::models::review::{HelpfulVote, NewReview};
use crate::models::EntityId;
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    SubmitListing,
    SubmitReview,
    VoteHelpful,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxPhase {
    Idle,
    Submitting,
    AwaitingInclusion,
    Settled,
    Failed,
}

impl TxPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxPhase::Settled | TxPhase::Failed)
    }
}

/// A write the user asked for, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCall {
    SubmitListing(NewListing),
    SubmitReview(NewReview),
    VoteHelpful(HelpfulVote),
}

impl WriteCall {
    pub fn kind(&self) -> TxKind {
        match self {
            WriteCall::SubmitListing(_) => TxKind::SubmitListing,
            WriteCall::SubmitReview(_) => TxKind::SubmitReview,
            WriteCall::VoteHelpful(_) => TxKind::VoteHelpful,
        }
    }

    /// Listing whose reviews change when the write settles.
    pub fn affected_listing(&self) -> Option<&EntityId> {
        match self {
            WriteCall::SubmitListing(_) => None,
            WriteCall::SubmitReview(review) => Some(&review.listing_id),
            WriteCall::VoteHelpful(vote) => Some(&vote.listing_id),
        }
    }
}

/// Local record of one write. `id` is generated here and is unrelated to
/// any ledger identifier.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransactionHandle {
    pub id: Uuid,
    pub kind: TxKind,
    pub phase: TxPhase,
    pub submission: Option<SubmissionRef>,
    pub failure: Option<ClassifiedError>,
}

impl TransactionHandle {
    pub(crate) fn new(kind: TxKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            phase: TxPhase::Submitting,
            submission: None,
            failure: None,
        }
    }
}
