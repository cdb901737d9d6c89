//! Call surface of the remote ledger.
//!
//! The ledger is an opaque service. Reads are idempotent and need no identity;
//! writes go through a signing wallet that lives outside this crate, so the
//! write surface only ever hands back a submission reference and an
//! inclusion outcome.

use crate::error::LedgerError;
use crate::models::EntityId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Collection whose identifiers can be enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Listings,
    Reviews { listing: EntityId },
}

/// Kind of detail record behind an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Listing,
    Review,
}

/// Handle given by the remote once a write is accepted for inclusion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SubmissionRef(pub String);

impl fmt::Display for SubmissionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InclusionOutcome {
    Included,
    Reverted { detail: Option<String> },
}

/// One contract write, ready to be signed and submitted.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LedgerCall {
    pub function: &'static str,
    pub args: Vec<Value>,
    /// Native value attached to the call, in wei
    pub value: Option<u128>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ReadSurface: Send + Sync {
    /// All identifiers known for the collection, in ledger insertion order.
    async fn enumerate(&self, collection: &CollectionKind) -> Result<Vec<EntityId>, LedgerError>;

    /// Raw detail record, or `None` when the ledger has nothing under the id.
    async fn fetch_detail(
        &self,
        record: RecordKind,
        id: &EntityId,
    ) -> Result<Option<Value>, LedgerError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WriteSurface: Send + Sync {
    async fn submit(&self, call: &LedgerCall) -> Result<SubmissionRef, LedgerError>;

    async fn await_inclusion(
        &self,
        reference: &SubmissionRef,
    ) -> Result<InclusionOutcome, LedgerError>;
}
