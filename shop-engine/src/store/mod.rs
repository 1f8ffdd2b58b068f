//! redb-based storage layer for the shop ledgers
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog + stock + rating aggregate |
//! | `carts` | `user_id` | `Cart` | One cart per user |
//! | `orders` | `order_id` | `Order` | Immutable order snapshots |
//! | `ratings` | `(product_id, user_id)` | `Rating` | One rating per user per product |
//! | `counters` | entity name | `u64` | Sequence allocator state |
//! | `processed_commands` | `command_id` | `u64` | Checkout idempotency → order id |
//!
//! # Atomicity
//!
//! redb serializes write transactions: at most one is in flight at a time.
//! Every mutating operation in this layer is exactly one write transaction,
//! which is what turns "check stock then decrement" and "read counter then
//! bump" into atomic conditional operations under concurrent callers.
//!
//! # Durability
//!
//! Commits are persistent as soon as `commit()` returns (copy-on-write with
//! atomic pointer swap), so issued sequence values survive process restarts
//! and are never handed out twice.

pub mod carts;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod sequence;

pub use carts::CartRepository;
pub use orders::{OrderRepository, TransitionOutcome};
pub use products::{ProductRepository, ReserveOutcome};
pub use ratings::{RatingRepository, RatingWriteOutcome};
pub use sequence::{EntityKind, SequenceAllocator};

use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for products: key = product id, value = JSON-serialized Product
pub(crate) const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Table for carts: key = user id, value = JSON-serialized Cart
pub(crate) const CARTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("carts");

/// Table for orders: key = order id, value = JSON-serialized Order
pub(crate) const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// Table for ratings: key = (product id, user id), value = JSON-serialized Rating
pub(crate) const RATINGS_TABLE: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("ratings");

/// Table for sequence counters: key = entity name, value = last issued id
pub(crate) const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Table for processed checkout commands: key = command id, value = order id
pub(crate) const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("processed_commands");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Whether a retry has a chance of succeeding
    ///
    /// Serialization failures are deterministic; everything else is treated
    /// as a storage hiccup (lock contention, I/O) worth a bounded retry.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StorageError::Serialization(_) | StorageError::Table(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Maximum attempts for operations retried on transient storage errors
const MAX_RETRIES: u32 = 3;

/// Run `op`, retrying up to [`MAX_RETRIES`] times on transient storage errors
///
/// Backoff is a short blocking sleep; the operations retried here are single
/// write transactions that either fully applied or did not apply at all, so
/// re-running them is safe.
pub fn with_retry<T>(
    op_name: &str,
    mut op: impl FnMut() -> StorageResult<T>,
) -> StorageResult<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                tracing::warn!(op = op_name, attempt, error = %e, "Transient storage error, retrying");
                std::thread::sleep(std::time::Duration::from_millis(10 * u64::from(attempt)));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Shop storage backed by redb
#[derive(Clone)]
pub struct StoreDb {
    db: Arc<Database>,
}

impl StoreDb {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (tests and ephemeral deployments)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never see a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(RATINGS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub(crate) fn begin_write(&self) -> StorageResult<redb::WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub(crate) fn begin_read(&self) -> StorageResult<redb::ReadTransaction> {
        Ok(self.db.begin_read()?)
    }
}
