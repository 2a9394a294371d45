//! # Marketplace Configuration & Constants
//!
//! Every magic number in VITRINE lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team
//! coffee.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version — bump on breaking changes to the ledger semantics.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version — bump on non-semantic bug fixes.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Market Parameters
// ---------------------------------------------------------------------------

/// The smallest price a listing may carry, in the smallest currency unit.
///
/// Zero-priced listings are rejected outright: a zero price is
/// indistinguishable from an uninitialized registry entry, and "free"
/// sales belong in a transfer, not a marketplace.
pub const MIN_LISTING_PRICE: u64 = 1;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the REST/WebSocket API served by `vitrine-node`.
pub const DEFAULT_RPC_PORT: u16 = 8890;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8891;

/// Capacity of the live-event broadcast channel in the node. Large enough
/// to absorb short bursts without dropping events for connected
/// WebSocket subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
