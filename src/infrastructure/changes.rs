//! Bookkeeping shared by the store backends for optimistic transactions.

use crate::domain::order::Order;
use crate::domain::ports::StoreResult;
use crate::domain::product::Product;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies a document across collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocKey {
    Product(String),
    Order(String),
}

/// A stored document together with its write counter. A missing document has
/// version 0; the first write stores version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

impl<T> Versioned<T> {
    pub fn first(doc: T) -> Self {
        Self { version: 1, doc }
    }

    pub fn next(previous: Option<u64>, doc: T) -> Self {
        Self {
            version: previous.unwrap_or(0) + 1,
            doc,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PendingWrite {
    Product(Product),
    NewOrder(Order),
    Order(Order),
}

impl PendingWrite {
    pub fn key(&self) -> DocKey {
        match self {
            PendingWrite::Product(product) => DocKey::Product(product.id.clone()),
            PendingWrite::NewOrder(order) | PendingWrite::Order(order) => {
                DocKey::Order(order.id.clone())
            }
        }
    }
}

/// Read set and buffered writes of one transaction scope.
#[derive(Debug, Default)]
pub struct ChangeSet {
    reads: HashMap<DocKey, u64>,
    writes: Vec<PendingWrite>,
}

impl ChangeSet {
    /// Remembers the version of a read. Only the first read of a document
    /// counts, so a document that changes between two reads in the same
    /// scope fails the commit.
    pub fn record_read(&mut self, key: DocKey, version: u64) {
        self.reads.entry(key).or_insert(version);
    }

    pub fn push(&mut self, write: PendingWrite) {
        self.writes.push(write);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Fails with [`StorageError::Conflict`] if a read document moved on or a
    /// document to be created already exists.
    pub fn check<F>(&self, mut current_version: F) -> StoreResult<()>
    where
        F: FnMut(&DocKey) -> StoreResult<u64>,
    {
        for (key, seen) in &self.reads {
            if current_version(key)? != *seen {
                tracing::debug!(?key, "read set changed since it was read");
                return Err(StorageError::Conflict);
            }
        }
        for write in &self.writes {
            if let PendingWrite::NewOrder(_) = write {
                let key = write.key();
                if current_version(&key)? != 0 {
                    return Err(StorageError::Conflict);
                }
            }
        }
        Ok(())
    }

    pub fn into_writes(self) -> Vec<PendingWrite> {
        self.writes
    }
}
