//! # Listing Registry
//!
//! The keyed store of active listings. One rule matters here and it is
//! enforced at this layer: **at most one active listing per item key**.
//! Everything else — who may insert, remove, or reprice an entry — is the
//! marketplace facade's responsibility; this module is a map with
//! invariant-checked mutations and non-failing reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::types::ItemKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    /// A listing already exists for this item key.
    #[error("already listed: {key}")]
    AlreadyListed {
        /// The item that is already on offer.
        key: ItemKey,
    },

    /// No listing exists for this item key.
    #[error("not listed: {key}")]
    NotListed {
        /// The item that has no active listing.
        key: ItemKey,
    },
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// An active offer to sell one specific token at a fixed price.
///
/// A `Listing` exists in the registry if and only if its item is currently
/// offered, and its price is always positive — the facade rejects zero
/// prices before they reach this store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Account that created the offer. Only this account may cancel or
    /// reprice it, and sale proceeds are credited to it.
    pub seller: String,
    /// Asking price in the smallest currency unit. Always `> 0`.
    pub price: u64,
    /// Timestamp when the offer was created. Repricing does not touch it.
    pub listed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ListingBook
// ---------------------------------------------------------------------------

/// The registry of active listings, keyed by [`ItemKey`].
///
/// Mutations enforce the one-listing-per-key invariant; reads never fail.
/// The whole book serializes with `collection#token_id` string keys so it
/// can be snapshotted or shipped over the wire as plain JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingBook {
    /// Active listings indexed by item key.
    #[serde(with = "crate::types::item_key_map")]
    listings: HashMap<ItemKey, Listing>,
}

impl ListingBook {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
        }
    }

    /// Inserts a new listing for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::AlreadyListed`] if a listing exists for the
    /// key — the registry never overwrites an active offer.
    pub fn put(&mut self, key: ItemKey, seller: String, price: u64) -> Result<(), ListingError> {
        if self.listings.contains_key(&key) {
            return Err(ListingError::AlreadyListed { key });
        }

        self.listings.insert(
            key,
            Listing {
                seller,
                price,
                listed_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Removes and returns the listing for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::NotListed`] if no listing exists.
    pub fn remove(&mut self, key: &ItemKey) -> Result<Listing, ListingError> {
        self.listings
            .remove(key)
            .ok_or_else(|| ListingError::NotListed { key: key.clone() })
    }

    /// Returns the listing for `key`, or `None` if the item is not offered.
    pub fn get(&self, key: &ItemKey) -> Option<&Listing> {
        self.listings.get(key)
    }

    /// Replaces the price of an existing listing in place. The seller and
    /// the original `listed_at` timestamp are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::NotListed`] if no listing exists.
    pub fn update_price(&mut self, key: &ItemKey, new_price: u64) -> Result<(), ListingError> {
        let listing = self
            .listings
            .get_mut(key)
            .ok_or_else(|| ListingError::NotListed { key: key.clone() })?;
        listing.price = new_price;
        Ok(())
    }

    /// Re-inserts a listing exactly as it was removed, original timestamp
    /// included. Compensation path for a sale whose external transfer
    /// failed after the removal was committed; not public API.
    pub(crate) fn restore(&mut self, key: ItemKey, listing: Listing) {
        self.listings.insert(key, listing);
    }

    /// Returns the number of active listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Returns `true` if nothing is currently offered.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Returns an iterator over all `(key, listing)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &Listing)> {
        self.listings.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
