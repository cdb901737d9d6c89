//! Outward notifications for presentation layers.

use crate::error::{ErrorKind, LedgerError, SyncError};
use crate::models::listing::Listing;
use crate::models::review::Review;
use crate::models::transaction::{TransactionHandle, TxPhase};
use crate::models::EntityId;
use leptos::logging::warn;
use leptos::{create_rw_signal, RwSignal, SignalSet, SignalUpdate};
use serde::Serialize;
use std::collections::HashMap;

/// Subscriber to directory and transaction events. Every method defaults to a no-op.
pub trait DirectoryObserver: Send + Sync {
    fn on_refreshed(&self, _listings: &[Listing]) {}

    fn on_unavailable(&self, _error: &SyncError) {}

    fn on_reviews_refreshed(&self, _listing: &EntityId, _reviews: &[Review]) {}

    fn on_reviews_unavailable(&self, _listing: &EntityId, _error: &SyncError) {}

    /// Telemetry for a record that failed to hydrate and was left out.
    fn on_hydration_skipped(&self, _id: &EntityId, _error: &LedgerError) {}

    fn on_transaction_phase_changed(&self, _handle: &TransactionHandle) {}

    fn on_transaction_failed(&self, _handle: &TransactionHandle, _kind: ErrorKind, _message: &str) {}
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Ready,
    Unavailable,
}

/// Mirrors directory state into leptos signals so components can render it.
///
/// Must be created inside a reactive owner. Updates for signals whose owner
/// has been disposed are dropped.
#[derive(Clone, Copy)]
pub struct SignalObserver {
    pub listings: RwSignal<Vec<Listing>>,
    pub status: RwSignal<LoadStatus>,
    pub reviews: RwSignal<HashMap<EntityId, Vec<Review>>>,
    pub phase: RwSignal<Option<TxPhase>>,
    pub last_failure: RwSignal<Option<(ErrorKind, String)>>,
}

impl SignalObserver {
    pub fn new() -> Self {
        Self {
            listings: create_rw_signal(Vec::new()),
            status: create_rw_signal(LoadStatus::Loading),
            reviews: create_rw_signal(HashMap::new()),
            phase: create_rw_signal(None),
            last_failure: create_rw_signal(None),
        }
    }
}

impl Default for SignalObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn set_or_drop<T: 'static>(signal: RwSignal<T>, value: T, what: &str) {
    if signal.try_set(value).is_some() {
        warn!("[SIGNALS] {} signal disposed, update dropped", what);
    }
}

impl DirectoryObserver for SignalObserver {
    fn on_refreshed(&self, listings: &[Listing]) {
        set_or_drop(self.listings, listings.to_vec(), "listings");
        set_or_drop(self.status, LoadStatus::Ready, "status");
    }

    fn on_unavailable(&self, _error: &SyncError) {
        // Never keep showing the previous collection once a load failed
        set_or_drop(self.listings, Vec::new(), "listings");
        set_or_drop(self.status, LoadStatus::Unavailable, "status");
    }

    fn on_reviews_refreshed(&self, listing: &EntityId, reviews: &[Review]) {
        let updated = self.reviews.try_update(|map| {
            map.insert(listing.clone(), reviews.to_vec());
        });
        if updated.is_none() {
            warn!("[SIGNALS] reviews signal disposed, update dropped");
        }
    }

    fn on_reviews_unavailable(&self, listing: &EntityId, _error: &SyncError) {
        let updated = self.reviews.try_update(|map| {
            map.remove(listing);
        });
        if updated.is_none() {
            warn!("[SIGNALS] reviews signal disposed, update dropped");
        }
    }

    fn on_transaction_phase_changed(&self, handle: &TransactionHandle) {
        set_or_drop(self.phase, Some(handle.phase), "phase");
        if handle.phase == TxPhase::Submitting {
            set_or_drop(self.last_failure, None, "failure");
        }
    }

    fn on_transaction_failed(&self, _handle: &TransactionHandle, kind: ErrorKind, message: &str) {
        set_or_drop(self.last_failure, Some((kind, message.to_string())), "failure");
    }
}
