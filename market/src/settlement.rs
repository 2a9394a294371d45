//! # Settlement Rail
//!
//! The reference [`PaymentRail`]: an append-only journal of every payout
//! the marketplace has issued. It delivers unconditionally — modeling a
//! rail that can refuse a payout is a job for a test fake, which is
//! exactly what the trait seam is for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::oracle::{PaymentRail, RailError};

/// One delivered payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient account.
    pub to: String,
    /// Amount delivered, in the smallest currency unit.
    pub amount: u64,
    /// When the payout was issued.
    pub issued_at: DateTime<Utc>,
}

/// A payment rail that records everything and refuses nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementRail {
    payouts: Vec<Payout>,
}

impl SettlementRail {
    /// Creates a rail with an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every payout issued so far, in issue order.
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Returns the total amount delivered to `account`.
    pub fn delivered_to(&self, account: &str) -> u64 {
        self.payouts
            .iter()
            .filter(|p| p.to == account)
            .fold(0u64, |acc, p| acc.saturating_add(p.amount))
    }
}

impl PaymentRail for SettlementRail {
    fn pay_out(&mut self, to: &str, amount: u64) -> Result<(), RailError> {
        self.payouts.push(Payout {
            to: to.to_string(),
            amount,
            issued_at: Utc::now(),
        });
        Ok(())
    }
}
