//! # External Collaborators
//!
//! The marketplace never holds tokens and never moves money itself. Two
//! capabilities are injected into the facade instead:
//!
//! - [`OwnershipOracle`] — the authority on who owns a token, whether the
//!   marketplace may transfer it on the owner's behalf, and the transfer
//!   side effect itself.
//! - [`PaymentRail`] — the outbound payout used by proceeds withdrawal.
//!
//! Both are plain synchronous traits: every marketplace operation runs to
//! completion as one atomic unit, so a collaborator that blocks or retries
//! internally has no place here. Fakes implementing these traits are what
//! make the facade deterministically testable — see the failing-rail and
//! failing-oracle fakes in the integration tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ItemKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by an [`OwnershipOracle`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleError {
    /// The referenced token does not exist in any tracked collection.
    #[error("unknown token: {key}")]
    UnknownToken {
        /// The item that was looked up.
        key: ItemKey,
    },

    /// A transfer was requested from an account that is not the token's
    /// current owner. This is how out-of-band ownership changes show up:
    /// the listing says one seller, the oracle says another.
    #[error("account {from} is not the owner of {key}")]
    NotTokenOwner {
        /// The item whose transfer was refused.
        key: ItemKey,
        /// The account the transfer claimed as the current owner.
        from: String,
    },
}

/// Errors surfaced by a [`PaymentRail`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RailError {
    /// The rail refused or failed to deliver the payout. The marketplace
    /// treats this as a failure of the whole withdrawal — no silent loss.
    #[error("payout of {amount} to {to} rejected: {reason}")]
    PayoutRejected {
        /// Intended recipient.
        to: String,
        /// Amount that failed to deliver.
        amount: u64,
        /// Rail-specific explanation.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Capability Traits
// ---------------------------------------------------------------------------

/// The authority consulted for token ownership and transfer.
///
/// Reads (`owner_of`, `is_approved_for_marketplace`) answer questions;
/// `transfer` is the single externally visible side effect of a completed
/// sale. The facade always commits its own state before calling
/// `transfer` — implementations must not assume registry state mid-call.
pub trait OwnershipOracle {
    /// Returns the current owner of the token, or `None` if the token
    /// does not exist.
    fn owner_of(&self, key: &ItemKey) -> Option<String>;

    /// Returns `true` if the marketplace has been authorized to transfer
    /// this token on the owner's behalf.
    fn is_approved_for_marketplace(&self, key: &ItemKey) -> bool;

    /// Moves the token from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Fails with [`OracleError::NotTokenOwner`] if `from` is not the
    /// current owner, or [`OracleError::UnknownToken`] if the token does
    /// not exist.
    fn transfer(&mut self, key: &ItemKey, from: &str, to: &str) -> Result<(), OracleError>;
}

/// The outbound side of the payment rail.
///
/// Inbound payments arrive as the `payment` argument of `buy_item`; this
/// trait covers only the payout issued by `withdraw_proceeds`. A payout
/// failure must be reported — the facade compensates the drained balance
/// and surfaces the error to the caller.
pub trait PaymentRail {
    /// Delivers `amount` to `to`.
    fn pay_out(&mut self, to: &str, amount: u64) -> Result<(), RailError>;
}
