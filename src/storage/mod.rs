//!
//! tradepost storage module
//! ------------------------
//! This module implements the client-resident record store: named
//! collections (`users`, `products`, `orders`, `invoices`, `milestones`,
//! `notifications`) mapped to ordered JSON arrays of records, persisted
//! through a pluggable string-keyed storage medium. Each record carries a
//! store-assigned `_id` plus `createdAt`/`updatedAt` timestamps; every
//! mutation performs a whole-collection read-modify-write, which is the
//! compatibility contract with the persisted encoding.
//!
//! Key responsibilities:
//! - Collection CRUD with generated identity and automatic timestamping.
//! - Partial-update merges that preserve unspecified fields.
//! - One-time seeding of default records into absent collections.
//! - A per-collection decoded cache so repeated reads within a session do
//!   not re-parse the medium; every write replaces the cached entry.
//!
//! The public API centers around the `Store` handle, which is cheaply
//! cloneable and explicitly constructed via `open*` (no process globals).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

pub mod medium;
mod collections;
pub mod records;
mod seed;

pub use collections::COLLECTION_KEYS;
pub use medium::{DirMedium, MemMedium, StorageMedium};
pub use records::{
    Invoice, InvoiceStatus, Kind, Milestone, Notification, Order, OrderItem, OrderStatus,
    Product, Record, Role, User,
};

/// A persisted row: one JSON object in a collection array, insertion order
/// preserved by the enclosing `Vec`.
pub type JsonMap = serde_json::Map<String, JsonValue>;

pub(crate) type Rows = Vec<JsonMap>;

struct StoreInner {
    medium: Box<dyn StorageMedium>,
    /// Decoded rows per collection key; replaced wholesale on every write.
    cache: RwLock<HashMap<String, Arc<Rows>>>,
}

/// Handle on one client-resident store instance.
///
/// `Store` is a thin `Arc` wrapper: clones share the medium and the decoded
/// cache, matching the single-instance-per-context semantics of the
/// original storage slot while keeping construction explicit.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Open a store over an arbitrary medium and seed default records into
    /// any absent collection slot (idempotent; existing data is never
    /// overwritten).
    pub fn open(medium: Box<dyn StorageMedium>) -> AppResult<Self> {
        let store = Self {
            inner: Arc::new(StoreInner { medium, cache: RwLock::new(HashMap::new()) }),
        };
        seed::initialize(&store)?;
        Ok(store)
    }

    /// Open a directory-backed store; the directory is created if missing.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> AppResult<Self> {
        Self::open(Box::new(DirMedium::new(dir)?))
    }

    /// Open an ephemeral in-memory store (tests, throwaway sessions).
    pub fn open_in_memory() -> AppResult<Self> {
        Self::open(Box::new(MemMedium::default()))
    }

    /// Direct handle on the underlying medium. The session layer keeps its
    /// token and snapshot here; collection traffic goes through the cached
    /// read/write paths instead.
    pub fn medium(&self) -> &dyn StorageMedium {
        self.inner.medium.as_ref()
    }

    /// Drop the decoded-collection cache. The medium writes eagerly on every
    /// mutation, so there is nothing to flush; subsequent reads re-parse.
    pub fn close(&self) {
        self.inner.cache.write().clear();
    }

    pub(crate) fn cache(&self) -> &RwLock<HashMap<String, Arc<Rows>>> {
        &self.inner.cache
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
