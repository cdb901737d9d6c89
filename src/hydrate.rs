//! Per-identifier fetch of ledger detail records.

use crate::error::LedgerError;
use crate::ledger::{ReadSurface, RecordKind};
use crate::models::listing::RawListing;
use crate::models::review::RawReview;
use crate::models::EntityId;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A decodable ledger record that can be logically removed.
pub trait LedgerRecord: DeserializeOwned {
    const KIND: RecordKind;

    fn is_active(&self) -> bool;

    /// Field-level sanity check on a decoded record.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl LedgerRecord for RawListing {
    const KIND: RecordKind = RecordKind::Listing;

    fn is_active(&self) -> bool {
        self.project.is_active
    }
}

impl LedgerRecord for RawReview {
    const KIND: RecordKind = RecordKind::Review;

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn check(&self) -> Result<(), String> {
        self.check_rating()
    }
}

#[derive(Clone)]
pub struct EntityHydrator {
    reader: Arc<dyn ReadSurface>,
}

impl EntityHydrator {
    pub fn new(reader: Arc<dyn ReadSurface>) -> Self {
        Self { reader }
    }

    /// `Ok(None)` when the record is absent or inactive. A record that cannot
    /// be decoded, or holds impossible values, is an error for this identifier only.
    pub async fn hydrate<R: LedgerRecord>(&self, id: &EntityId) -> Result<Option<R>, LedgerError> {
        let Some(value) = self.reader.fetch_detail(R::KIND, id).await? else {
            return Ok(None);
        };
        let record: R = serde_json::from_value(value)
            .map_err(|e| LedgerError::Decode(format!("record {}: {}", id, e)))?;
        if !record.is_active() {
            return Ok(None);
        }
        record
            .check()
            .map_err(|reason| LedgerError::Decode(format!("record {}: {}", id, reason)))?;
        Ok(Some(record))
    }
}
