//! Read-side query interfaces over the synced store.
//!
//! Lightweight wrappers that borrow the store, in the same shape as the sync
//! engine's write path but for downstream consumers: card lookups and the
//! collection-tracking counters.

pub mod cards;
pub mod collection;
