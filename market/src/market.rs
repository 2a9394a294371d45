//! # Marketplace Facade
//!
//! The public operation set of the marketplace: list, cancel, update, buy,
//! withdraw, and the read-only queries. The facade composes the listing
//! registry and the proceeds ledger, consults the injected
//! [`OwnershipOracle`] for every authorization decision, and announces
//! every state change on the notification channel.
//!
//! Per item key the lifecycle is a two-state machine:
//!
//! ```text
//! Unlisted --list--> Listed --cancel/buy--> Unlisted
//!                      |  ^
//!                      update (price only)
//! ```
//!
//! ## Effect ordering
//!
//! Every operation takes `&mut self` and runs to completion — there is no
//! interleaving inside an operation's effect sequence. Within `buy_item`
//! and `withdraw_proceeds` the ordering contract is: **registry and ledger
//! mutations commit strictly before any external collaborator call**. A
//! reentrant second invocation therefore finds the listing already gone
//! and the balance already zero. If the external call then fails, the
//! committed mutation is compensated (listing restored, balance
//! re-credited) before the error surfaces, so a failed operation leaves
//! state exactly as it found it.

use thiserror::Error;

use crate::config::MIN_LISTING_PRICE;
use crate::events::{EventLog, MarketEvent};
use crate::oracle::{OracleError, OwnershipOracle, PaymentRail, RailError};
use crate::proceeds::{ProceedsError, ProceedsLedger};
use crate::registry::{Listing, ListingBook, ListingError};
use crate::types::ItemKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during marketplace operations.
///
/// Every failure is an immediate synchronous rejection: when an operation
/// returns an error, the registry, the ledger, and the event log are
/// exactly as they were before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    /// The caller is not the recognized owner/seller for this action.
    /// Raised when listing a token one does not own, and also when
    /// cancelling or repricing somebody else's listing.
    #[error("only the item's owner can do that")]
    OnlyOwnerCanListItems,

    /// The listing price is below the floor (zero).
    #[error("listing price must be positive")]
    PriceTooLow,

    /// The attached payment does not cover the listed price.
    #[error("price not met: listed at {expected}, offered {offered}")]
    PriceNotMet {
        /// The listing price.
        expected: u64,
        /// The payment the buyer attached.
        offered: u64,
    },

    /// The marketplace has not been authorized to transfer the token on
    /// the owner's behalf.
    #[error("marketplace is not approved to transfer this item")]
    MarketPlaceNotApproved,

    /// A registry state conflict (`AlreadyListed` / `NotListed`).
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// A proceeds ledger failure (`NoProceeds`, overflow).
    #[error(transparent)]
    Proceeds(#[from] ProceedsError),

    /// The ownership oracle refused the token transfer — typically the
    /// seller no longer owns the token because it moved out-of-band.
    #[error("token transfer failed: {0}")]
    Transfer(#[from] OracleError),

    /// The payment rail refused the proceeds payout.
    #[error("proceeds payout failed: {0}")]
    Payout(#[from] RailError),
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// The marketplace: listing registry + proceeds ledger + event log, with
/// ownership authority and payouts delegated to injected collaborators.
#[derive(Debug)]
pub struct Marketplace<O, P>
where
    O: OwnershipOracle,
    P: PaymentRail,
{
    oracle: O,
    rail: P,
    listings: ListingBook,
    proceeds: ProceedsLedger,
    events: EventLog,
}

impl<O, P> Marketplace<O, P>
where
    O: OwnershipOracle,
    P: PaymentRail,
{
    /// Creates an empty marketplace around the given collaborators.
    pub fn new(oracle: O, rail: P) -> Self {
        Self {
            oracle,
            rail,
            listings: ListingBook::new(),
            proceeds: ProceedsLedger::new(),
            events: EventLog::new(),
        }
    }

    // -- Operations ---------------------------------------------------------

    /// Offers a token for sale at `price`.
    ///
    /// # Errors
    ///
    /// - [`MarketError::OnlyOwnerCanListItems`] if the caller is not the
    ///   token's current owner per the oracle (or the token is unknown —
    ///   a nonexistent token has no owner, so the caller isn't it).
    /// - [`MarketError::PriceTooLow`] if `price` is zero.
    /// - [`ListingError::AlreadyListed`] if the item is already offered.
    /// - [`MarketError::MarketPlaceNotApproved`] if the marketplace lacks
    ///   transfer authorization for the token.
    pub fn list_item(
        &mut self,
        caller: &str,
        collection: &str,
        token_id: u64,
        price: u64,
    ) -> Result<(), MarketError> {
        let key = ItemKey::new(collection, token_id);

        match self.oracle.owner_of(&key) {
            Some(owner) if owner == caller => {}
            _ => return Err(MarketError::OnlyOwnerCanListItems),
        }
        if price < MIN_LISTING_PRICE {
            return Err(MarketError::PriceTooLow);
        }
        if self.listings.get(&key).is_some() {
            return Err(ListingError::AlreadyListed { key }.into());
        }
        if !self.oracle.is_approved_for_marketplace(&key) {
            return Err(MarketError::MarketPlaceNotApproved);
        }

        self.listings.put(key, caller.to_string(), price)?;
        self.events.record(MarketEvent::ItemListed {
            collection: collection.to_string(),
            token_id,
            seller: caller.to_string(),
            price,
        });
        Ok(())
    }

    /// Withdraws the caller's own listing.
    ///
    /// # Errors
    ///
    /// - [`ListingError::NotListed`] if the item is not offered.
    /// - [`MarketError::OnlyOwnerCanListItems`] if the caller is not the
    ///   listing's seller.
    pub fn cancel_listing(
        &mut self,
        caller: &str,
        collection: &str,
        token_id: u64,
    ) -> Result<(), MarketError> {
        let key = ItemKey::new(collection, token_id);

        let listing = self
            .listings
            .get(&key)
            .ok_or_else(|| ListingError::NotListed { key: key.clone() })?;
        if listing.seller != caller {
            return Err(MarketError::OnlyOwnerCanListItems);
        }

        self.listings.remove(&key)?;
        self.events.record(MarketEvent::ListingDeleted {
            collection: collection.to_string(),
            token_id,
        });
        Ok(())
    }

    /// Replaces the price of the caller's own listing. The change is
    /// re-announced on the same channel as the initial listing.
    ///
    /// # Errors
    ///
    /// - [`ListingError::NotListed`] if the item is not offered.
    /// - [`MarketError::OnlyOwnerCanListItems`] if the caller is not the
    ///   listing's seller.
    /// - [`MarketError::PriceTooLow`] if `new_price` is zero.
    pub fn update_listing(
        &mut self,
        caller: &str,
        collection: &str,
        token_id: u64,
        new_price: u64,
    ) -> Result<(), MarketError> {
        let key = ItemKey::new(collection, token_id);

        let listing = self
            .listings
            .get(&key)
            .ok_or_else(|| ListingError::NotListed { key: key.clone() })?;
        if listing.seller != caller {
            return Err(MarketError::OnlyOwnerCanListItems);
        }
        if new_price < MIN_LISTING_PRICE {
            return Err(MarketError::PriceTooLow);
        }

        self.listings.update_price(&key, new_price)?;
        self.events.record(MarketEvent::ItemListed {
            collection: collection.to_string(),
            token_id,
            seller: caller.to_string(),
            price: new_price,
        });
        Ok(())
    }

    /// Buys a listed item, paying `payment`.
    ///
    /// The listing is removed and the seller credited with the listing
    /// price *before* the oracle moves the token — that ordering is what
    /// closes the reentrancy window. Payment above the listing price is
    /// retained, never refunded.
    ///
    /// # Errors
    ///
    /// - [`ListingError::NotListed`] if the item is not offered.
    /// - [`MarketError::PriceNotMet`] if `payment` is below the price.
    /// - [`MarketError::Transfer`] if the oracle refuses the transfer
    ///   (e.g. ownership moved out-of-band since listing); the listing
    ///   and the seller's balance are restored before this surfaces.
    pub fn buy_item(
        &mut self,
        buyer: &str,
        collection: &str,
        token_id: u64,
        payment: u64,
    ) -> Result<(), MarketError> {
        let key = ItemKey::new(collection, token_id);

        let listing = self
            .listings
            .get(&key)
            .ok_or_else(|| ListingError::NotListed { key: key.clone() })?;
        if payment < listing.price {
            return Err(MarketError::PriceNotMet {
                expected: listing.price,
                offered: payment,
            });
        }

        // Commit: listing gone and seller credited before the external
        // transfer fires.
        let listing = self.listings.remove(&key)?;
        if let Err(credit_err) = self.proceeds.credit(&listing.seller, listing.price) {
            self.listings.restore(key, listing);
            return Err(credit_err.into());
        }

        if let Err(transfer_err) = self.oracle.transfer(&key, &listing.seller, buyer) {
            // Compensate the commit. The debit reverses the exact credit
            // two steps up, so it cannot underflow.
            self.proceeds
                .debit(&listing.seller, listing.price)
                .expect("reversal of a just-committed credit");
            self.listings.restore(key, listing);
            return Err(transfer_err.into());
        }

        self.events.record(MarketEvent::ItemBought {
            collection: collection.to_string(),
            token_id,
            buyer: buyer.to_string(),
            price: listing.price,
        });
        Ok(())
    }

    /// Pays out the caller's full accumulated proceeds and returns the
    /// amount delivered.
    ///
    /// The balance is zeroed before the rail is invoked; a reentrant
    /// second withdrawal therefore fails `NoProceeds` instead of
    /// double-draining.
    ///
    /// # Errors
    ///
    /// - [`ProceedsError::NoProceeds`] if the caller's balance is zero.
    /// - [`MarketError::Payout`] if the rail refuses the payout; the
    ///   drained balance is re-credited before this surfaces.
    pub fn withdraw_proceeds(&mut self, caller: &str) -> Result<u64, MarketError> {
        let amount = self.proceeds.drain(caller)?;

        if let Err(payout_err) = self.rail.pay_out(caller, amount) {
            // Re-crediting what was just drained cannot overflow.
            self.proceeds
                .credit(caller, amount)
                .expect("re-credit of a just-drained balance");
            return Err(payout_err.into());
        }

        Ok(amount)
    }

    // -- Queries ------------------------------------------------------------

    /// Returns the active listing for the item, or `None` if unlisted.
    pub fn listing_of(&self, collection: &str, token_id: u64) -> Option<&Listing> {
        self.listings.get(&ItemKey::new(collection, token_id))
    }

    /// Returns the account's withdrawable proceeds, zero if none.
    pub fn proceeds_of(&self, account: &str) -> u64 {
        self.proceeds.balance_of(account)
    }

    /// The notification channel: every emitted event, in emission order.
    pub fn events(&self) -> &[MarketEvent] {
        self.events.all()
    }

    /// Returns the number of active listings.
    pub fn active_listings(&self) -> usize {
        self.listings.len()
    }

    /// Returns the sum of all withdrawable proceeds balances.
    pub fn escrowed_proceeds(&self) -> u64 {
        self.proceeds.total_escrowed()
    }

    /// Shared access to the injected ownership oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Exclusive access to the injected ownership oracle. The node uses
    /// this to drive the in-memory registry (minting, approvals).
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Shared access to the injected payment rail.
    pub fn rail(&self) -> &P {
        &self.rail
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
