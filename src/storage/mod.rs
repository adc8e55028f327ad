//! SQLite persistence: row store, semantic index, and checkpoints.
//!
//! The row store and semantic index live in the same database file and are
//! linked by a write-ahead journal (`index_backlog`): a row insert journals
//! its projection transactionally, the index write then lands, and only
//! after that the journal entry is cleared. [`replay_index_backlog`] runs at
//! data-agent startup and re-applies anything left behind by a crash
//! between the two writes. Index writes are idempotent upserts, so replay
//! after a crash between index write and journal clear is harmless.
//!
//! ```text
//!   insert_return_order
//!        │
//!        ▼
//!   ┌───────────────────────────┐   same transaction
//!   │ return_orders  + backlog  │◄──────────────┐
//!   └───────────────────────────┘               │
//!        │                                      │
//!        ▼                                      │
//!   ┌───────────────┐    ┌──────────────┐       │
//!   │ index_entries │ →  │ clear backlog│  (crash here → replay at startup)
//!   └───────────────┘    └──────────────┘
//! ```

pub mod checkpoint;
pub mod index;
pub mod row_store;

pub use checkpoint::CheckpointStore;
pub use index::SemanticIndex;
pub use row_store::{ReturnOrder, RowStore};

use crate::error::StorageError;

/// Inserts a new order into the row store and the semantic index.
///
/// Fails on a duplicate `order_id` without touching existing data. On
/// success returns the one-line-per-order listing of the whole table, which
/// the insert tool embeds in its confirmation.
pub fn insert_return_order(
    store: &RowStore,
    index: &SemanticIndex,
    order: &ReturnOrder,
) -> Result<String, StorageError> {
    let projection = order.projection();
    store.insert(order, &projection)?;
    index.upsert(&order.order_id, &projection)?;
    store.clear_backlog(&order.order_id)?;
    store.order_lines()
}

/// Inserts or replaces an order in both stores. Used by CSV seeding.
pub fn seed_return_order(
    store: &RowStore,
    index: &SemanticIndex,
    order: &ReturnOrder,
) -> Result<(), StorageError> {
    let projection = order.projection();
    store.upsert(order, &projection)?;
    index.upsert(&order.order_id, &projection)?;
    store.clear_backlog(&order.order_id)?;
    Ok(())
}

/// Re-applies journal entries whose index write never landed.
///
/// Returns the number of replayed entries.
pub fn replay_index_backlog(
    store: &RowStore,
    index: &SemanticIndex,
) -> Result<usize, StorageError> {
    let pending = store.pending_backlog()?;
    for (order_id, content) in &pending {
        index.upsert(order_id, content)?;
        store.clear_backlog(order_id)?;
    }
    Ok(pending.len())
}
