//! Write lifecycle: Idle → Submitting → AwaitingInclusion → Settled | Failed.
//!
//! One coordinator drives one write. Failures are terminal and classified;
//! nothing is retried here, because a ledger write cannot be resent safely
//! without risking a duplicate.

use crate::classify::explain;
use crate::config::LedgerConfig;
use crate::error::{ClassifiedError, ErrorKind, LedgerError};
use crate::ledger::{InclusionOutcome, LedgerCall, SubmissionRef, WriteSurface};
use crate::models::transaction::{TransactionHandle, TxPhase, WriteCall};
use crate::observer::DirectoryObserver;
use crate::sync::{Baseline, DirectorySynchronizer, RefreshScope};
use leptos::logging::{error, log, warn};
use serde_json::json;
use std::sync::Arc;

/// Local preconditions and call encoding for writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteRules {
    pub min_comment_len: usize,
    pub max_comment_len: usize,
    pub submission_fee_wei: u128,
}

impl Default for WriteRules {
    fn default() -> Self {
        WriteRules::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for WriteRules {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            min_comment_len: config.min_comment_len,
            max_comment_len: config.max_comment_len,
            submission_fee_wei: config.submission_fee_wei,
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl WriteRules {
    pub fn validate(&self, call: &WriteCall) -> Result<(), ClassifiedError> {
        match call {
            WriteCall::SubmitListing(listing) => {
                if is_blank(&listing.name) {
                    return Err(ClassifiedError::validation("Project name is required"));
                }
                if is_blank(&listing.description) {
                    return Err(ClassifiedError::validation("Description is required"));
                }
                if !listing.category.is_known() {
                    return Err(ClassifiedError::validation(format!(
                        "Unknown category: {}",
                        listing.category
                    )));
                }
                let url = listing.external_url.trim();
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ClassifiedError::validation(
                        "Project URL must start with http:// or https://",
                    ));
                }
                if is_blank(&listing.builder.name) {
                    return Err(ClassifiedError::validation("Builder name is required"));
                }
            }
            WriteCall::SubmitReview(review) => {
                if review.listing_id.is_empty() {
                    return Err(ClassifiedError::validation("No project selected"));
                }
                if !(1..=5).contains(&review.stars) {
                    return Err(ClassifiedError::validation("Please select a rating"));
                }
                let length = review.comment.trim().chars().count();
                if length < self.min_comment_len {
                    return Err(ClassifiedError::validation(format!(
                        "Please write at least {} characters",
                        self.min_comment_len
                    )));
                }
                if length > self.max_comment_len {
                    return Err(ClassifiedError::validation(format!(
                        "Please keep your review under {} characters",
                        self.max_comment_len
                    )));
                }
            }
            WriteCall::VoteHelpful(vote) => {
                if vote.listing_id.is_empty() || vote.review_id.is_empty() {
                    return Err(ClassifiedError::validation("No review selected"));
                }
            }
        }
        Ok(())
    }

    /// Contract call for an already validated write.
    pub fn to_ledger_call(&self, call: &WriteCall) -> LedgerCall {
        match call {
            WriteCall::SubmitListing(listing) => LedgerCall {
                function: "submitProject",
                args: vec![
                    json!(listing.name.trim()),
                    json!(listing.description.trim()),
                    json!(listing.category.as_str()),
                    json!(listing.external_url.trim()),
                    json!(listing.image_url.trim()),
                    json!(listing.builder.name.trim()),
                    json!(listing.builder.bio.trim()),
                    json!(listing.builder.social_handle.trim()),
                ],
                value: Some(self.submission_fee_wei),
            },
            WriteCall::SubmitReview(review) => LedgerCall {
                function: "submitReview",
                args: vec![
                    json!(review.listing_id.as_str()),
                    json!(review.stars),
                    json!(review.comment.trim()),
                ],
                value: None,
            },
            WriteCall::VoteHelpful(vote) => LedgerCall {
                function: "voteHelpful",
                args: vec![json!(vote.review_id.as_str())],
                value: None,
            },
        }
    }
}

/// Terminal success of a write.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub reference: SubmissionRef,
    /// Whether the post-settlement refresh saw the change
    pub reflected: bool,
}

pub struct TransactionCoordinator {
    writer: Arc<dyn WriteSurface>,
    directory: Arc<DirectorySynchronizer>,
    rules: WriteRules,
    handle: Option<TransactionHandle>,
    scope: Option<RefreshScope>,
    baseline: Baseline,
    settlement: Option<Settlement>,
}

impl TransactionCoordinator {
    pub fn new(
        writer: Arc<dyn WriteSurface>,
        directory: Arc<DirectorySynchronizer>,
        rules: WriteRules,
    ) -> Self {
        Self {
            writer,
            directory,
            rules,
            handle: None,
            scope: None,
            baseline: Baseline::default(),
            settlement: None,
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.handle
            .as_ref()
            .map(|handle| handle.phase)
            .unwrap_or(TxPhase::Idle)
    }

    pub fn handle(&self) -> Option<&TransactionHandle> {
        self.handle.as_ref()
    }

    /// A write is in flight; the UI should not offer to submit again.
    pub fn is_busy(&self) -> bool {
        let phase = self.phase();
        phase != TxPhase::Idle && !phase.is_terminal()
    }

    /// Back to Idle. A write still awaiting inclusion is forgotten, not cancelled.
    pub fn reset(&mut self) {
        if self.is_busy() {
            warn!("[TX] Reset while awaiting inclusion; the outcome will not be observed");
        }
        self.handle = None;
        self.scope = None;
        self.baseline = Baseline::default();
        self.settlement = None;
    }

    /// Submits and waits for the outcome.
    pub async fn run(&mut self, call: WriteCall) -> Result<Settlement, ClassifiedError> {
        self.submit(call).await?;
        self.await_inclusion().await
    }

    /// Validates locally, then hands the write to the ledger. Ends in
    /// AwaitingInclusion on success, Failed otherwise.
    pub async fn submit(&mut self, call: WriteCall) -> Result<SubmissionRef, ClassifiedError> {
        if self.handle.is_some() {
            // Leaves the current write untouched
            return Err(ClassifiedError::validation(
                "This transaction was already started; reset before submitting again",
            ));
        }

        let handle = TransactionHandle::new(call.kind());
        log!("[TX] {} {:?} started", handle.id, handle.kind);
        self.handle = Some(handle);

        if let Err(failure) = self.rules.validate(&call) {
            return Err(self.fail(failure));
        }
        self.notify_phase();

        let scope = RefreshScope::for_call(&call);
        self.baseline = self.directory.baseline(&scope).await;
        self.scope = Some(scope);

        let ledger_call = self.rules.to_ledger_call(&call);
        let mut pending = PendingSubmit {
            handle: &mut self.handle,
            observers: self.directory.observers(),
            armed: true,
        };
        let outcome = self.writer.submit(&ledger_call).await;
        pending.armed = false;
        drop(pending);

        match outcome {
            Ok(reference) => {
                log!("[TX] {} accepted as {}", ledger_call.function, reference);
                self.advance(TxPhase::AwaitingInclusion, Some(reference.clone()));
                Ok(reference)
            }
            Err(err) => Err(self.fail(explain(&err))),
        }
    }

    /// Waits for the ledger's verdict. Once settled, later calls return the
    /// same settlement without refreshing again.
    pub async fn await_inclusion(&mut self) -> Result<Settlement, ClassifiedError> {
        let (phase, submission, failure) = match &self.handle {
            Some(handle) => (handle.phase, handle.submission.clone(), handle.failure.clone()),
            None => {
                return Err(ClassifiedError::validation("Nothing has been submitted"));
            }
        };

        let reference = match (phase, submission) {
            (TxPhase::Settled, Some(reference)) => {
                return Ok(self.settlement.clone().unwrap_or(Settlement {
                    reference,
                    reflected: false,
                }));
            }
            (TxPhase::Failed, _) => {
                return Err(failure.unwrap_or_else(|| {
                    ClassifiedError::new(ErrorKind::Unknown, ErrorKind::Unknown.message())
                }));
            }
            (TxPhase::AwaitingInclusion, Some(reference)) => reference,
            _ => {
                return Err(ClassifiedError::validation(
                    "The transaction has not been accepted yet",
                ));
            }
        };

        match self.writer.await_inclusion(&reference).await {
            Ok(InclusionOutcome::Included) => Ok(self.settle(reference).await),
            Ok(InclusionOutcome::Reverted { detail }) => {
                Err(self.fail(explain(&LedgerError::Reverted { reason: detail })))
            }
            Err(err) => Err(self.fail(explain(&err))),
        }
    }

    async fn settle(&mut self, reference: SubmissionRef) -> Settlement {
        self.advance(TxPhase::Settled, None);
        log!("[TX] {} settled", reference);

        // Taken before awaiting so the refresh can never be owed twice
        let reflected = match self.scope.take() {
            Some(scope) => {
                self.directory
                    .refresh_after_write(&scope, &self.baseline)
                    .await
            }
            None => false,
        };

        let settlement = Settlement {
            reference,
            reflected,
        };
        self.settlement = Some(settlement.clone());
        settlement
    }

    fn advance(&mut self, phase: TxPhase, submission: Option<SubmissionRef>) {
        if let Some(handle) = self.handle.as_mut() {
            handle.phase = phase;
            if submission.is_some() {
                handle.submission = submission;
            }
        }
        self.notify_phase();
    }

    fn fail(&mut self, failure: ClassifiedError) -> ClassifiedError {
        if let Some(handle) = self.handle.as_mut() {
            handle.phase = TxPhase::Failed;
            handle.failure = Some(failure.clone());
            error!(
                "[TX] {} {:?} failed ({:?}): {}",
                handle.id,
                handle.kind,
                failure.kind,
                failure.detail.as_deref().unwrap_or(&failure.message)
            );
        }
        self.notify_phase();
        if let Some(handle) = &self.handle {
            for observer in self.directory.observers() {
                observer.on_transaction_failed(handle, failure.kind, &failure.message);
            }
        }
        failure
    }

    fn notify_phase(&self) {
        if let Some(handle) = &self.handle {
            for observer in self.directory.observers() {
                observer.on_transaction_phase_changed(handle);
            }
        }
    }
}

/// Fails the handle if the submit future is dropped before the ledger answers,
/// so the coordinator does not stay busy forever.
struct PendingSubmit<'a> {
    handle: &'a mut Option<TransactionHandle>,
    observers: &'a [Arc<dyn DirectoryObserver>],
    armed: bool,
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let failure = ClassifiedError::new(
            ErrorKind::Unknown,
            "The submission was abandoned before the ledger answered. Check your wallet before retrying.",
        );
        warn!("[TX] {} {:?} abandoned while submitting", handle.id, handle.kind);
        handle.phase = TxPhase::Failed;
        handle.failure = Some(failure.clone());
        for observer in self.observers {
            observer.on_transaction_phase_changed(handle);
            observer.on_transaction_failed(handle, failure.kind, &failure.message);
        }
    }
}
