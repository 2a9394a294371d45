// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # VITRINE Marketplace — Core Library
//!
//! VITRINE is a peer-to-peer marketplace ledger for non-fungible tokens:
//! sellers list a token they own at a price, buyers purchase by paying
//! that price, and accumulated seller proceeds are withdrawn on demand.
//! This crate is the ledger itself — the part with actual invariants.
//! Everything network-facing lives in `vitrine-node`.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! marketplace:
//!
//! - **types** — Item identity. One key, one listable token.
//! - **registry** — Active listings. At most one per item, always priced.
//! - **proceeds** — What the marketplace owes each seller.
//! - **oracle** — The capability seams: who owns what, who moves money.
//! - **nft** — In-memory collections behind the oracle seam, for local
//!   deployments and deterministic tests.
//! - **settlement** — The reference payment rail: a payout journal.
//! - **market** — The facade composing all of the above.
//! - **events** — The append-only notification channel for indexers.
//! - **config** — Constants. All of them.
//!
//! ## Design Philosophy
//!
//! 1. If it touches money, the arithmetic is checked and it has tests.
//! 2. State commits before any external collaborator call — reentrancy is
//!    beaten by ordering, not by locks.
//! 3. A failed operation leaves no trace: no partial mutation, ever.
//! 4. Every public type is serializable (serde) for wire transport and
//!    snapshots.

pub mod config;
pub mod events;
pub mod market;
pub mod nft;
pub mod oracle;
pub mod proceeds;
pub mod registry;
pub mod settlement;
pub mod types;

pub use events::MarketEvent;
pub use market::{MarketError, Marketplace};
pub use types::ItemKey;
