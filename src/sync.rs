//! Directory synchronizer: enumerate → hydrate each → filter → assemble.
//!
//! Every refresh is a full re-read of the ledger. The assembled collection is
//! swapped in atomically, so readers see either the previous collection or
//! the new one, never a partial one.

use crate::config::{LedgerConfig, RecheckPolicy};
use crate::error::{LedgerError, SyncError};
use crate::hydrate::{EntityHydrator, LedgerRecord};
use crate::ledger::{CollectionKind, ReadSurface};
use crate::models::listing::{Listing, RawListing};
use crate::models::review::{RawReview, Review};
use crate::models::transaction::WriteCall;
use crate::models::EntityId;
use crate::observer::DirectoryObserver;
use futures::future::join_all;
use leptos::logging::{error, log, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// What the synchronizer currently holds for the directory.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryState {
    /// No refresh has completed yet
    Loading,
    Ready(Arc<Vec<Listing>>),
    /// The last refresh could not reach the ledger; nothing stale is kept
    Unavailable,
}

/// Collections a settled write can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScope {
    pub directory: bool,
    pub reviews_of: Option<EntityId>,
}

impl RefreshScope {
    pub fn for_call(call: &WriteCall) -> Self {
        Self {
            // Rating and review count of the listing move with a new review
            directory: !matches!(call, WriteCall::VoteHelpful(_)),
            reviews_of: call.affected_listing().cloned(),
        }
    }
}

/// Collections as they were before a write, for the post-settlement re-check.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    directory: Option<Arc<Vec<Listing>>>,
    reviews: Option<Arc<Vec<Review>>>,
}

impl Baseline {
    pub fn is_empty(&self) -> bool {
        self.directory.is_none() && self.reviews.is_none()
    }
}

struct Installed<T> {
    generation: u64,
    value: T,
}

pub struct DirectorySynchronizer {
    reader: Arc<dyn ReadSurface>,
    hydrator: EntityHydrator,
    recheck: RecheckPolicy,
    observers: Vec<Arc<dyn DirectoryObserver>>,
    generation: AtomicU64,
    directory: RwLock<Installed<DirectoryState>>,
    reviews: RwLock<HashMap<EntityId, Installed<Option<Arc<Vec<Review>>>>>>,
}

fn unavailable(err: LedgerError) -> SyncError {
    SyncError::Unavailable(err.to_string())
}

impl DirectorySynchronizer {
    pub fn new(reader: Arc<dyn ReadSurface>) -> Self {
        Self {
            hydrator: EntityHydrator::new(reader.clone()),
            reader,
            recheck: RecheckPolicy::default(),
            observers: Vec::new(),
            generation: AtomicU64::new(0),
            directory: RwLock::new(Installed {
                generation: 0,
                value: DirectoryState::Loading,
            }),
            reviews: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(reader: Arc<dyn ReadSurface>, config: &LedgerConfig) -> Self {
        Self::new(reader).with_recheck(config.recheck)
    }

    pub fn with_recheck(mut self, recheck: RecheckPolicy) -> Self {
        self.recheck = recheck;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DirectoryObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub(crate) fn observers(&self) -> &[Arc<dyn DirectoryObserver>] {
        &self.observers
    }

    /// Latest installed directory state.
    pub async fn state(&self) -> DirectoryState {
        self.directory.read().await.value.clone()
    }

    /// Latest installed reviews of a listing, if they were ever loaded.
    pub async fn reviews(&self, listing: &EntityId) -> Option<Arc<Vec<Review>>> {
        self.reviews
            .read()
            .await
            .get(listing)
            .and_then(|installed| installed.value.clone())
    }

    /// Re-reads the whole directory from the ledger.
    pub async fn refresh(&self) -> Result<Arc<Vec<Listing>>, SyncError> {
        let ticket = self.next_ticket();
        log!("[SYNC] Refreshing directory (#{})", ticket);

        match self.load_listings().await {
            Ok(listings) => {
                let listings = Arc::new(listings);
                log!("[SYNC] Directory holds {} listings", listings.len());
                if self
                    .install_directory(ticket, DirectoryState::Ready(listings.clone()))
                    .await
                {
                    for observer in &self.observers {
                        observer.on_refreshed(&listings);
                    }
                }
                Ok(listings)
            }
            Err(err) => {
                error!("[SYNC] Directory refresh failed: {}", err);
                if self.install_directory(ticket, DirectoryState::Unavailable).await {
                    for observer in &self.observers {
                        observer.on_unavailable(&err);
                    }
                }
                Err(err)
            }
        }
    }

    /// Re-reads the active reviews of one listing, newest first.
    pub async fn refresh_reviews(&self, listing: &EntityId) -> Result<Arc<Vec<Review>>, SyncError> {
        let ticket = self.next_ticket();
        log!("[SYNC] Refreshing reviews of listing {} (#{})", listing, ticket);

        match self.load_reviews(listing).await {
            Ok(reviews) => {
                let reviews = Arc::new(reviews);
                if self.install_reviews(listing, ticket, Some(reviews.clone())).await {
                    for observer in &self.observers {
                        observer.on_reviews_refreshed(listing, &reviews);
                    }
                }
                Ok(reviews)
            }
            Err(err) => {
                error!("[SYNC] Reviews of listing {} failed: {}", listing, err);
                if self.install_reviews(listing, ticket, None).await {
                    for observer in &self.observers {
                        observer.on_reviews_unavailable(listing, &err);
                    }
                }
                Err(err)
            }
        }
    }

    /// Snapshot of the collections `scope` covers, taken before a write.
    pub async fn baseline(&self, scope: &RefreshScope) -> Baseline {
        let directory = if scope.directory {
            match &self.directory.read().await.value {
                DirectoryState::Ready(listings) => Some(listings.clone()),
                _ => None,
            }
        } else {
            None
        };
        let reviews = match &scope.reviews_of {
            Some(listing) => self.reviews(listing).await,
            None => None,
        };
        Baseline { directory, reviews }
    }

    /// The single refresh owed to a settled write. Re-reads `scope` until it
    /// differs from `baseline`, at most `recheck.attempts` times. Returns
    /// whether the write was observed.
    pub async fn refresh_after_write(&self, scope: &RefreshScope, baseline: &Baseline) -> bool {
        let attempts = self.recheck.attempts.max(1);
        for attempt in 1..=attempts {
            if self.reread(scope, baseline).await {
                return true;
            }
            if attempt < attempts {
                log!(
                    "[SYNC] Write not visible yet, re-checking in {}ms ({}/{})",
                    self.recheck.delay_ms,
                    attempt,
                    attempts
                );
                pause(self.recheck.delay_ms).await;
            }
        }
        warn!("[SYNC] Write still not visible after {} re-reads", attempts);
        false
    }

    // Without a baseline any successful re-read counts; otherwise some part must differ.
    async fn reread(&self, scope: &RefreshScope, baseline: &Baseline) -> bool {
        let mut all_ok = true;
        let mut changed = false;

        if scope.directory {
            match self.refresh().await {
                Ok(after) => {
                    if let Some(before) = &baseline.directory {
                        changed |= after.as_slice() != before.as_slice();
                    }
                }
                Err(_) => all_ok = false,
            }
        }
        if let Some(listing) = &scope.reviews_of {
            match self.refresh_reviews(listing).await {
                Ok(after) => {
                    if let Some(before) = &baseline.reviews {
                        changed |= after.as_slice() != before.as_slice();
                    }
                }
                Err(_) => all_ok = false,
            }
        }

        if baseline.is_empty() {
            all_ok
        } else {
            changed
        }
    }

    async fn load_listings(&self) -> Result<Vec<Listing>, SyncError> {
        let ids = self
            .reader
            .enumerate(&CollectionKind::Listings)
            .await
            .map_err(unavailable)?;
        if ids.is_empty() {
            log!("[SYNC] No listings on the ledger");
            return Ok(Vec::new());
        }

        let records = self.hydrate_all::<RawListing>(&ids).await;
        Ok(records
            .into_iter()
            .map(Listing::from_raw)
            .filter(Listing::is_listed)
            .collect())
    }

    async fn load_reviews(&self, listing: &EntityId) -> Result<Vec<Review>, SyncError> {
        let collection = CollectionKind::Reviews {
            listing: listing.clone(),
        };
        let ids = self.reader.enumerate(&collection).await.map_err(unavailable)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut reviews: Vec<Review> = self
            .hydrate_all::<RawReview>(&ids)
            .await
            .into_iter()
            .map(Review::from_raw)
            .filter(|review| review.active)
            .collect();
        // Stable, so equal timestamps keep ledger order
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// Fans out one hydration per id and waits for every outcome. Failed ids
    /// are reported and left out; the rest keep enumeration order.
    async fn hydrate_all<R: LedgerRecord>(&self, ids: &[EntityId]) -> Vec<R> {
        let fetches = ids.iter().map(|id| async move {
            let outcome = self.hydrator.hydrate::<R>(id).await;
            (id, outcome)
        });
        let outcomes = join_all(fetches).await;

        let mut records = Vec::with_capacity(outcomes.len());
        for (id, outcome) in outcomes {
            match outcome {
                Ok(Some(record)) => records.push(record),
                Ok(None) => log!("[HYDRATE] {} is inactive or absent, skipped", id),
                Err(err) => {
                    warn!("[HYDRATE] Skipping {}: {}", id, err);
                    for observer in &self.observers {
                        observer.on_hydration_skipped(id, &err);
                    }
                }
            }
        }
        records
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // A refresh that started earlier must not replace the result of a later one.
    async fn install_directory(&self, ticket: u64, state: DirectoryState) -> bool {
        let mut installed = self.directory.write().await;
        if ticket < installed.generation {
            log!("[SYNC] Dropping stale directory result #{}", ticket);
            return false;
        }
        installed.generation = ticket;
        installed.value = state;
        true
    }

    async fn install_reviews(
        &self,
        listing: &EntityId,
        ticket: u64,
        reviews: Option<Arc<Vec<Review>>>,
    ) -> bool {
        let mut map = self.reviews.write().await;
        if let Some(current) = map.get(listing) {
            if ticket < current.generation {
                log!("[SYNC] Dropping stale reviews result #{} for {}", ticket, listing);
                return false;
            }
        }
        // Failures are installed too, so an older success cannot resurface
        map.insert(
            listing.clone(),
            Installed {
                generation: ticket,
                value: reviews,
            },
        );
        true
    }
}

async fn pause(ms: u64) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(u32::try_from(ms).unwrap_or(u32::MAX)).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
