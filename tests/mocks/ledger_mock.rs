use async_trait::async_trait;
use leptos::logging::log;
use serde_json::{json, Value};
use showcase::error::{ErrorKind, LedgerError, SyncError};
use showcase::ledger::{
    CollectionKind, InclusionOutcome, LedgerCall, ReadSurface, RecordKind, SubmissionRef,
    WriteSurface,
};
use showcase::models::listing::Listing;
use showcase::models::review::Review;
use showcase::models::transaction::{TransactionHandle, TxPhase};
use showcase::models::EntityId;
use showcase::observer::DirectoryObserver;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// `getProject` payload as the contract gateway returns it.
pub fn project_json(id: u64, name: &str, category: &str, average_rating: u64, active: bool) -> Value {
    json!({
        "project": {
            "id": id,
            "name": name,
            "description": format!("{} for Base builders", name),
            "category": category,
            "url": format!("https://{}.example", name.to_lowercase()),
            "imageUrl": "",
            "builder": "0x4fd74D95eD6d7B1A1EE26EC66e616e60ffE16733",
            "timestamp": 1724000000 + id,
            "reviewCount": "2",
            "isActive": active
        },
        "averageRating": average_rating
    })
}

/// `reviews(id)` payload.
pub fn review_json(id: u64, listing: u64, rating: u64, timestamp: u64, active: bool) -> Value {
    json!({
        "id": id,
        "projectId": listing,
        "reviewer": "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
        "rating": rating,
        "comment": format!("Review number {} of this project", id),
        "timestamp": timestamp,
        "helpfulVotes": 0,
        "isActive": active
    })
}

/// A write whose record only becomes readable some reads after inclusion.
struct Staged {
    listing: Option<(String, Value)>,
    review: Option<(String, String, Value)>,
    hidden_reads: usize,
}

/// In-memory ledger implementing both surfaces, with call counters and
/// scripted failures.
pub struct MockLedger {
    listings: Mutex<Vec<(String, Value)>>,
    reviews: Mutex<HashMap<String, Vec<(String, Value)>>>,
    failing: Mutex<HashSet<String>>,
    pub down: AtomicBool,
    /// `submit` never answers while set
    pub hang_submit: AtomicBool,
    enumerate_delays: Mutex<VecDeque<u64>>,
    submit_outcomes: Mutex<VecDeque<Result<SubmissionRef, LedgerError>>>,
    inclusion_outcome: Mutex<Option<Result<InclusionOutcome, LedgerError>>>,
    staged: Mutex<Option<Staged>>,
    pending: Mutex<Option<Staged>>,
    pub submitted: Mutex<Vec<LedgerCall>>,
    pub enumerate_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub await_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            listings: Mutex::new(Vec::new()),
            reviews: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            down: AtomicBool::new(false),
            hang_submit: AtomicBool::new(false),
            enumerate_delays: Mutex::new(VecDeque::new()),
            submit_outcomes: Mutex::new(VecDeque::new()),
            inclusion_outcome: Mutex::new(None),
            staged: Mutex::new(None),
            pending: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            enumerate_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            await_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_listing(self, id: &str, record: Value) -> Self {
        self.add_listing(id, record);
        self
    }

    pub fn with_review(self, listing: &str, id: &str, record: Value) -> Self {
        self.add_review(listing, id, record);
        self
    }

    pub fn add_listing(&self, id: &str, record: Value) {
        self.listings.lock().unwrap().push((id.to_string(), record));
    }

    pub fn add_review(&self, listing: &str, id: &str, record: Value) {
        self.reviews
            .lock()
            .unwrap()
            .entry(listing.to_string())
            .or_default()
            .push((id.to_string(), record));
    }

    /// Detail fetches for `id` fail with a transport error.
    pub fn fail_fetch(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    /// Each enumerate call takes the next delay, in milliseconds.
    pub fn delay_enumerates(&self, delays: &[u64]) {
        self.enumerate_delays.lock().unwrap().extend(delays.iter().copied());
    }

    pub fn script_submit(&self, outcome: Result<SubmissionRef, LedgerError>) {
        self.submit_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn script_inclusion(&self, outcome: Result<InclusionOutcome, LedgerError>) {
        *self.inclusion_outcome.lock().unwrap() = Some(outcome);
    }

    /// On inclusion, the listing becomes visible after `hidden_reads` enumerations.
    pub fn publish_listing_on_inclusion(&self, id: &str, record: Value, hidden_reads: usize) {
        *self.pending.lock().unwrap() = Some(Staged {
            listing: Some((id.to_string(), record)),
            review: None,
            hidden_reads,
        });
    }

    pub fn publish_review_on_inclusion(&self, listing: &str, id: &str, record: Value, hidden_reads: usize) {
        *self.pending.lock().unwrap() = Some(Staged {
            listing: None,
            review: Some((listing.to_string(), id.to_string(), record)),
            hidden_reads,
        });
    }

    pub fn enumerates(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn awaits(&self) -> usize {
        self.await_calls.load(Ordering::SeqCst)
    }

    // Staged listings count down on directory reads, staged reviews on review reads
    fn reveal_staged(&self, collection: &CollectionKind) {
        let mut staged = self.staged.lock().unwrap();
        let counts = |s: &Staged| match collection {
            CollectionKind::Listings => s.listing.is_some(),
            CollectionKind::Reviews { .. } => s.review.is_some(),
        };
        let ready = match staged.as_mut() {
            None => false,
            Some(s) => {
                if !counts(&*s) {
                    false
                } else if s.hidden_reads == 0 {
                    true
                } else {
                    s.hidden_reads -= 1;
                    false
                }
            }
        };
        if !ready {
            return;
        }
        if let Some(s) = staged.take() {
            if let Some((id, record)) = s.listing {
                self.add_listing(&id, record);
            }
            if let Some((listing, id, record)) = s.review {
                self.add_review(&listing, &id, record);
            }
        }
    }
}

#[async_trait]
impl ReadSurface for MockLedger {
    async fn enumerate(&self, collection: &CollectionKind) -> Result<Vec<EntityId>, LedgerError> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        self.reveal_staged(collection);

        let ids: Vec<EntityId> = match collection {
            CollectionKind::Listings => self
                .listings
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| EntityId::new(id.as_str()))
                .collect(),
            CollectionKind::Reviews { listing } => self
                .reviews
                .lock()
                .unwrap()
                .get(listing.as_str())
                .map(|reviews| reviews.iter().map(|(id, _)| EntityId::new(id.as_str())).collect())
                .unwrap_or_default(),
        };

        let delay = self.enumerate_delays.lock().unwrap().pop_front();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        Ok(ids)
    }

    async fn fetch_detail(&self, record: RecordKind, id: &EntityId) -> Result<Option<Value>, LedgerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(id.as_str()) {
            return Err(LedgerError::Transport(format!("timeout fetching {}", id)));
        }
        let found = match record {
            RecordKind::Listing => self
                .listings
                .lock()
                .unwrap()
                .iter()
                .find(|(key, _)| key == id.as_str())
                .map(|(_, value)| value.clone()),
            RecordKind::Review => self
                .reviews
                .lock()
                .unwrap()
                .values()
                .flatten()
                .find(|(key, _)| key == id.as_str())
                .map(|(_, value)| value.clone()),
        };
        Ok(found)
    }
}

#[async_trait]
impl WriteSurface for MockLedger {
    async fn submit(&self, call: &LedgerCall) -> Result<SubmissionRef, LedgerError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        log!("[MOCK] submit {} ({} args)", call.function, call.args.len());
        self.submitted.lock().unwrap().push(call.clone());
        if self.hang_submit.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = self.submit_outcomes.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(SubmissionRef(format!("0xsubmission{}", n))))
    }

    async fn await_inclusion(&self, _reference: &SubmissionRef) -> Result<InclusionOutcome, LedgerError> {
        self.await_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .inclusion_outcome
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(InclusionOutcome::Included));
        if matches!(outcome, Ok(InclusionOutcome::Included)) {
            let pending = self.pending.lock().unwrap().take();
            *self.staged.lock().unwrap() = pending;
        }
        outcome
    }
}

/// Observer that records every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    pub refreshed: Mutex<Vec<usize>>,
    pub unavailable: AtomicUsize,
    pub reviews_refreshed: Mutex<Vec<(EntityId, usize)>>,
    pub skipped: Mutex<Vec<EntityId>>,
    pub phases: Mutex<Vec<TxPhase>>,
    pub failures: Mutex<Vec<(ErrorKind, String)>>,
}

impl RecordingObserver {
    pub fn phases(&self) -> Vec<TxPhase> {
        self.phases.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(ErrorKind, String)> {
        self.failures.lock().unwrap().clone()
    }

    pub fn skipped(&self) -> Vec<EntityId> {
        self.skipped.lock().unwrap().clone()
    }
}

impl DirectoryObserver for RecordingObserver {
    fn on_refreshed(&self, listings: &[Listing]) {
        self.refreshed.lock().unwrap().push(listings.len());
    }

    fn on_unavailable(&self, _error: &SyncError) {
        self.unavailable.fetch_add(1, Ordering::SeqCst);
    }

    fn on_reviews_refreshed(&self, listing: &EntityId, reviews: &[Review]) {
        self.reviews_refreshed
            .lock()
            .unwrap()
            .push((listing.clone(), reviews.len()));
    }

    fn on_hydration_skipped(&self, id: &EntityId, _error: &LedgerError) {
        self.skipped.lock().unwrap().push(id.clone());
    }

    fn on_transaction_phase_changed(&self, handle: &TransactionHandle) {
        self.phases.lock().unwrap().push(handle.phase);
    }

    fn on_transaction_failed(&self, _handle: &TransactionHandle, kind: ErrorKind, message: &str) {
        self.failures.lock().unwrap().push((kind, message.to_string()));
    }
}
