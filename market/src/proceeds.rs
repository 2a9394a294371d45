//! # Proceeds Ledger
//!
//! Tracks what the marketplace owes each seller. Completed sales credit
//! the seller's balance here; the seller withdraws the full balance on
//! demand. Accounts are created implicitly on first credit and persist
//! (at zero) across withdrawals.
//!
//! Two properties are load-bearing:
//!
//! 1. A balance only increases via [`credit`](ProceedsLedger::credit) and
//!    only reaches zero via a full-balance [`drain`](ProceedsLedger::drain).
//! 2. `drain` zeroes the balance *before* the caller gets the amount, so a
//!    reentrant second drain of the same account finds nothing to take.
//!
//! All arithmetic is checked — wrapping arithmetic and money do not mix.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during proceeds operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProceedsError {
    /// Withdrawal requested against a zero balance.
    #[error("no proceeds for account {0}")]
    NoProceeds(String),

    /// A credit would overflow the account balance.
    #[error("proceeds overflow: account {account} holds {current}, credit {credit}")]
    Overflow {
        /// The account being credited.
        account: String,
        /// Balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },

    /// A compensating debit exceeded the available balance. Only reachable
    /// through a facade bug — the facade debits exactly what it credited.
    #[error("proceeds underflow: account {account} holds {current}, debit {debit}")]
    Underflow {
        /// The account being debited.
        account: String,
        /// Balance before the failed debit.
        current: u64,
        /// The amount that caused the underflow.
        debit: u64,
    },
}

// ---------------------------------------------------------------------------
// ProceedsLedger
// ---------------------------------------------------------------------------

/// Per-seller accumulated sale revenue, withdrawable on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProceedsLedger {
    /// Withdrawable balances keyed by account.
    balances: HashMap<String, u64>,
}

impl ProceedsLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Adds `amount` to the account's balance, creating the account at
    /// zero if it has never been credited.
    ///
    /// # Errors
    ///
    /// Returns [`ProceedsError::Overflow`] if the balance would exceed
    /// `u64::MAX`.
    pub fn credit(&mut self, account: &str, amount: u64) -> Result<u64, ProceedsError> {
        let balance = self.balances.entry(account.to_string()).or_insert(0);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(ProceedsError::Overflow {
                account: account.to_string(),
                current: *balance,
                credit: amount,
            })?;
        *balance = new_balance;
        Ok(new_balance)
    }

    /// Takes the account's full balance and resets it to zero.
    ///
    /// The reset happens before the amount is returned: by the time the
    /// caller can act on the funds, the ledger already shows zero.
    ///
    /// # Errors
    ///
    /// Returns [`ProceedsError::NoProceeds`] if the balance is zero or the
    /// account has never been credited.
    pub fn drain(&mut self, account: &str) -> Result<u64, ProceedsError> {
        match self.balances.get_mut(account) {
            Some(balance) if *balance > 0 => {
                let amount = std::mem::take(balance);
                Ok(amount)
            }
            _ => Err(ProceedsError::NoProceeds(account.to_string())),
        }
    }

    /// Returns the withdrawable balance, zero for unknown accounts.
    pub fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Removes exactly `amount` from the account's balance.
    ///
    /// Compensation path only: the facade uses this to reverse a sale
    /// credit when the external token transfer fails after the credit has
    /// been committed. Not public API — proceeds otherwise only leave via
    /// [`drain`](Self::drain).
    pub(crate) fn debit(&mut self, account: &str, amount: u64) -> Result<(), ProceedsError> {
        let balance = self
            .balances
            .get_mut(account)
            .ok_or_else(|| ProceedsError::Underflow {
                account: account.to_string(),
                current: 0,
                debit: amount,
            })?;

        *balance = balance.checked_sub(amount).ok_or(ProceedsError::Underflow {
            account: account.to_string(),
            current: *balance,
            debit: amount,
        })?;
        Ok(())
    }

    /// Returns the number of accounts that have ever been credited.
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Returns the sum of all withdrawable balances, saturating at
    /// `u64::MAX`. Used by the node's gauges, never for accounting.
    pub fn total_escrowed(&self) -> u64 {
        self.balances
            .values()
            .fold(0u64, |acc, b| acc.saturating_add(*b))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_creates_account() {
        let mut ledger = ProceedsLedger::new();
        assert_eq!(ledger.credit("alice", 100).unwrap(), 100);
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn credit_accumulates() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 100).unwrap();
        ledger.credit("alice", 250).unwrap();
        assert_eq!(ledger.balance_of("alice"), 350);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", u64::MAX).unwrap();

        let result = ledger.credit("alice", 1);
        assert!(matches!(
            result.unwrap_err(),
            ProceedsError::Overflow { .. }
        ));
        // Balance unchanged by the failed credit.
        assert_eq!(ledger.balance_of("alice"), u64::MAX);
    }

    #[test]
    fn drain_returns_full_balance_and_zeroes() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 400).unwrap();

        assert_eq!(ledger.drain("alice").unwrap(), 400);
        assert_eq!(ledger.balance_of("alice"), 0);
    }

    #[test]
    fn drain_zero_balance_rejected() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 400).unwrap();
        ledger.drain("alice").unwrap();

        // Second drain finds nothing.
        let result = ledger.drain("alice");
        assert_eq!(
            result.unwrap_err(),
            ProceedsError::NoProceeds("alice".into())
        );
    }

    #[test]
    fn drain_unknown_account_rejected() {
        let mut ledger = ProceedsLedger::new();
        let result = ledger.drain("nobody");
        assert_eq!(
            result.unwrap_err(),
            ProceedsError::NoProceeds("nobody".into())
        );
    }

    #[test]
    fn account_persists_after_drain() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 100).unwrap();
        ledger.drain("alice").unwrap();

        // The account survives at zero and can be credited again.
        assert_eq!(ledger.account_count(), 1);
        ledger.credit("alice", 50).unwrap();
        assert_eq!(ledger.balance_of("alice"), 50);
    }

    #[test]
    fn balance_of_unknown_is_zero() {
        let ledger = ProceedsLedger::new();
        assert_eq!(ledger.balance_of("nobody"), 0);
    }

    #[test]
    fn debit_reverses_exact_credit() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 100).unwrap();
        ledger.credit("alice", 40).unwrap();

        ledger.debit("alice", 40).unwrap();
        assert_eq!(ledger.balance_of("alice"), 100);
    }

    #[test]
    fn debit_beyond_balance_rejected() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 10).unwrap();

        let result = ledger.debit("alice", 20);
        assert!(matches!(
            result.unwrap_err(),
            ProceedsError::Underflow { .. }
        ));
        assert_eq!(ledger.balance_of("alice"), 10);
    }

    #[test]
    fn total_escrowed_sums_balances() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 100).unwrap();
        ledger.credit("bob", 250).unwrap();
        assert_eq!(ledger.total_escrowed(), 350);
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let mut ledger = ProceedsLedger::new();
        ledger.credit("alice", 42).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: ProceedsLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.balance_of("alice"), 42);
    }
}
