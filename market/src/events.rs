//! # Notification Channel
//!
//! Every state-changing marketplace operation announces itself with a
//! [`MarketEvent`]. Events land in an append-only [`EventLog`] in emission
//! order; external indexers consume the log either whole or incrementally
//! via [`EventLog::since`]. Nothing is ever rewritten or removed.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MarketEvent
// ---------------------------------------------------------------------------

/// A marketplace state change, as announced to external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarketEvent {
    /// An item was offered for sale, or an existing offer was repriced —
    /// repricing re-announces on the same channel with the new price.
    #[serde(rename = "item_listed")]
    ItemListed {
        collection: String,
        token_id: u64,
        seller: String,
        price: u64,
    },

    /// An offer was withdrawn by its seller.
    #[serde(rename = "listing_deleted")]
    ListingDeleted { collection: String, token_id: u64 },

    /// An item was sold. `price` is the listing price credited to the
    /// seller, not the (possibly larger) payment the buyer attached.
    #[serde(rename = "item_bought")]
    ItemBought {
        collection: String,
        token_id: u64,
        buyer: String,
        price: u64,
    },
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only log of emitted events, ordered by emission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<MarketEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. There is no way to remove one.
    pub fn record(&mut self, event: MarketEvent) {
        self.entries.push(event);
    }

    /// Returns the full log in emission order.
    pub fn all(&self) -> &[MarketEvent] {
        &self.entries
    }

    /// Returns events recorded at or after position `offset`. Incremental
    /// consumers remember the last length they saw and pass it here.
    pub fn since(&self, offset: usize) -> &[MarketEvent] {
        self.entries.get(offset..).unwrap_or(&[])
    }

    /// Returns the number of events recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been announced yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
