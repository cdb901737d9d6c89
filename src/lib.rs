//! Directory of projects and their reviews, kept in step with a remote ledger.
//!
//! Reads go through [`sync::DirectorySynchronizer`], writes through
//! [`lifecycle::TransactionCoordinator`]. Both talk to the ledger only via the
//! surfaces in [`ledger`]; [`rpc::RpcLedger`] is the JSON-RPC implementation.

#[cfg(feature = "ssr")]
pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod hydrate;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod normalize;
pub mod observer;
pub mod query;
pub mod rpc;
pub mod sync;

pub use config::LedgerConfig;
pub use error::{ClassifiedError, ErrorKind, LedgerError, SyncError};
pub use lifecycle::{Settlement, TransactionCoordinator, WriteRules};
pub use sync::{DirectoryState, DirectorySynchronizer};
