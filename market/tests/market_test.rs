//! Integration tests for the marketplace facade.
//!
//! These tests exercise full marketplace scenarios across module
//! boundaries: the listing lifecycle, sale settlement, proceeds
//! withdrawal, and the compensation paths taken when an external
//! collaborator fails mid-operation. Collaborator failures are modeled
//! with bespoke fakes implementing the capability traits — which is the
//! point of having the traits.

use vitrine_market::events::MarketEvent;
use vitrine_market::market::{MarketError, Marketplace};
use vitrine_market::nft::NftRegistry;
use vitrine_market::oracle::{OracleError, OwnershipOracle, PaymentRail, RailError};
use vitrine_market::proceeds::ProceedsError;
use vitrine_market::registry::ListingError;
use vitrine_market::settlement::SettlementRail;
use vitrine_market::types::ItemKey;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

type Market = Marketplace<NftRegistry, SettlementRail>;

/// Builds a marketplace with one approved token minted to `owner`;
/// returns the market and the token id.
fn market_with_token(collection: &str, owner: &str) -> (Market, u64) {
    let mut market = Marketplace::new(NftRegistry::new(), SettlementRail::new());
    let token_id = market.oracle_mut().mint(collection, owner);
    market
        .oracle_mut()
        .set_approval(&ItemKey::new(collection, token_id), owner, true)
        .unwrap();
    (market, token_id)
}

// ---------------------------------------------------------------------------
// Lifecycle Scenarios
// ---------------------------------------------------------------------------

#[test]
fn list_buy_withdraw_happy_path() {
    let (mut market, token) = market_with_token("origins", "alice");

    // List at 100.
    market.list_item("alice", "origins", token, 100).unwrap();
    let listing = market.listing_of("origins", token).unwrap();
    assert_eq!(listing.seller, "alice");
    assert_eq!(listing.price, 100);

    // Bob buys at exactly the asking price.
    market.buy_item("bob", "origins", token, 100).unwrap();
    assert!(market.listing_of("origins", token).is_none());
    assert_eq!(market.proceeds_of("alice"), 100);
    assert_eq!(
        market.oracle().owner_of(&ItemKey::new("origins", token)),
        Some("bob".to_string())
    );

    // Alice withdraws everything.
    assert_eq!(market.withdraw_proceeds("alice").unwrap(), 100);
    assert_eq!(market.proceeds_of("alice"), 0);
    assert_eq!(market.rail().delivered_to("alice"), 100);
}

#[test]
fn list_cancel_relist_reflects_new_price_only() {
    let (mut market, token) = market_with_token("origins", "alice");

    market.list_item("alice", "origins", token, 100).unwrap();
    market.cancel_listing("alice", "origins", token).unwrap();
    assert!(market.listing_of("origins", token).is_none());

    market.list_item("alice", "origins", token, 175).unwrap();
    let listing = market.listing_of("origins", token).unwrap();
    assert_eq!(listing.price, 175);
    assert_eq!(listing.seller, "alice");
}

#[test]
fn proceeds_accumulate_across_sales() {
    let mut market = Marketplace::new(NftRegistry::new(), SettlementRail::new());
    for price in [100u64, 250, 40] {
        let token = market.oracle_mut().mint("origins", "alice");
        market
            .oracle_mut()
            .set_approval(&ItemKey::new("origins", token), "alice", true)
            .unwrap();
        market
            .list_item("alice", "origins", token, price)
            .unwrap();
        market.buy_item("bob", "origins", token, price).unwrap();
    }

    assert_eq!(market.proceeds_of("alice"), 390);
    assert_eq!(market.withdraw_proceeds("alice").unwrap(), 390);

    // Drained: a second withdrawal has nothing to take.
    let result = market.withdraw_proceeds("alice");
    assert_eq!(
        result.unwrap_err(),
        MarketError::Proceeds(ProceedsError::NoProceeds("alice".into()))
    );
}

#[test]
fn buyer_can_resell_after_purchase() {
    let (mut market, token) = market_with_token("origins", "alice");
    market.list_item("alice", "origins", token, 100).unwrap();
    market.buy_item("bob", "origins", token, 100).unwrap();

    // Alice can no longer list the token she sold.
    let result = market.list_item("alice", "origins", token, 500);
    assert_eq!(result.unwrap_err(), MarketError::OnlyOwnerCanListItems);

    // Bob needs a fresh approval — transfers clear it.
    let key = ItemKey::new("origins", token);
    let result = market.list_item("bob", "origins", token, 500);
    assert_eq!(result.unwrap_err(), MarketError::MarketPlaceNotApproved);

    market.oracle_mut().set_approval(&key, "bob", true).unwrap();
    market.list_item("bob", "origins", token, 500).unwrap();
    assert_eq!(market.listing_of("origins", token).unwrap().seller, "bob");
}

// ---------------------------------------------------------------------------
// Observed-Behavior Properties
// ---------------------------------------------------------------------------

#[test]
fn overpayment_is_absorbed_not_refunded() {
    let (mut market, token) = market_with_token("origins", "alice");
    market.list_item("alice", "origins", token, 100).unwrap();

    market.buy_item("bob", "origins", token, 160).unwrap();

    // Seller sees exactly the listing price; the excess 60 is retained by
    // the marketplace and appears nowhere in the proceeds ledger.
    assert_eq!(market.proceeds_of("alice"), 100);
    assert_eq!(market.escrowed_proceeds(), 100);
    assert_eq!(market.withdraw_proceeds("alice").unwrap(), 100);
}

#[test]
fn cancel_by_stranger_reuses_owner_error() {
    let (mut market, token) = market_with_token("origins", "alice");
    market.list_item("alice", "origins", token, 100).unwrap();

    // Not a distinct "not seller" error — the listing-authorization
    // identifier is reused.
    let result = market.cancel_listing("mallory", "origins", token);
    assert_eq!(result.unwrap_err(), MarketError::OnlyOwnerCanListItems);
    assert!(market.listing_of("origins", token).is_some());
}

// ---------------------------------------------------------------------------
// Event Channel
// ---------------------------------------------------------------------------

#[test]
fn events_follow_emission_order() {
    let (mut market, token) = market_with_token("origins", "alice");

    market.list_item("alice", "origins", token, 100).unwrap();
    market.update_listing("alice", "origins", token, 120).unwrap();
    market.buy_item("bob", "origins", token, 120).unwrap();

    let events = market.events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        MarketEvent::ItemListed {
            collection: "origins".into(),
            token_id: token,
            seller: "alice".into(),
            price: 100,
        }
    );
    // Repricing re-announces on the listing channel with the new price.
    assert_eq!(
        events[1],
        MarketEvent::ItemListed {
            collection: "origins".into(),
            token_id: token,
            seller: "alice".into(),
            price: 120,
        }
    );
    assert_eq!(
        events[2],
        MarketEvent::ItemBought {
            collection: "origins".into(),
            token_id: token,
            buyer: "bob".into(),
            price: 120,
        }
    );
}

#[test]
fn failed_operations_emit_nothing() {
    let (mut market, token) = market_with_token("origins", "alice");
    market.list_item("alice", "origins", token, 100).unwrap();

    let _ = market.buy_item("bob", "origins", token, 1);
    let _ = market.cancel_listing("mallory", "origins", token);
    let _ = market.update_listing("alice", "origins", token, 0);

    // Only the successful list made it onto the channel.
    assert_eq!(market.events().len(), 1);
}

// ---------------------------------------------------------------------------
// Compensation on Collaborator Failure
// ---------------------------------------------------------------------------

/// An oracle whose transfers always fail, as if every token moved
/// out-of-band between listing and sale. Reads delegate to a real
/// registry so listing itself succeeds.
struct StolenTokenOracle {
    inner: NftRegistry,
}

impl OwnershipOracle for StolenTokenOracle {
    fn owner_of(&self, key: &ItemKey) -> Option<String> {
        self.inner.owner_of(key)
    }

    fn is_approved_for_marketplace(&self, key: &ItemKey) -> bool {
        self.inner.is_approved_for_marketplace(key)
    }

    fn transfer(&mut self, key: &ItemKey, from: &str, _to: &str) -> Result<(), OracleError> {
        Err(OracleError::NotTokenOwner {
            key: key.clone(),
            from: from.to_string(),
        })
    }
}

/// A rail that refuses every payout.
struct BrokenRail;

impl PaymentRail for BrokenRail {
    fn pay_out(&mut self, to: &str, amount: u64) -> Result<(), RailError> {
        Err(RailError::PayoutRejected {
            to: to.to_string(),
            amount,
            reason: "settlement endpoint unreachable".into(),
        })
    }
}

#[test]
fn failed_transfer_restores_listing_and_proceeds() {
    let mut inner = NftRegistry::new();
    let token = inner.mint("origins", "alice");
    inner
        .set_approval(&ItemKey::new("origins", token), "alice", true)
        .unwrap();

    let mut market = Marketplace::new(StolenTokenOracle { inner }, SettlementRail::new());
    market.list_item("alice", "origins", token, 100).unwrap();

    let result = market.buy_item("bob", "origins", token, 100);
    assert!(matches!(result.unwrap_err(), MarketError::Transfer(_)));

    // The committed removal and credit were compensated: the listing is
    // back (same price, same seller) and nothing was credited.
    let listing = market.listing_of("origins", token).unwrap();
    assert_eq!(listing.seller, "alice");
    assert_eq!(listing.price, 100);
    assert_eq!(market.proceeds_of("alice"), 0);

    // And the failed sale never reached the event channel.
    assert_eq!(market.events().len(), 1);
}

#[test]
fn failed_payout_restores_balance() {
    let mut nfts = NftRegistry::new();
    let token = nfts.mint("origins", "alice");
    nfts.set_approval(&ItemKey::new("origins", token), "alice", true)
        .unwrap();

    let mut market = Marketplace::new(nfts, BrokenRail);
    market.list_item("alice", "origins", token, 100).unwrap();
    market.buy_item("bob", "origins", token, 100).unwrap();

    let result = market.withdraw_proceeds("alice");
    assert!(matches!(result.unwrap_err(), MarketError::Payout(_)));

    // No silent loss: the drained balance was re-credited in full and a
    // later withdrawal (over a working rail) would deliver it.
    assert_eq!(market.proceeds_of("alice"), 100);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn listing_state_survives_json_roundtrip() {
    let (mut market, token) = market_with_token("origins", "alice");
    market.list_item("alice", "origins", token, 100).unwrap();

    let listing = market.listing_of("origins", token).unwrap();
    let json = serde_json::to_string(listing).unwrap();
    let restored: vitrine_market::registry::Listing = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, listing);
}

#[test]
fn unlisted_queries_return_sentinels() {
    let market = Marketplace::new(NftRegistry::new(), SettlementRail::new());

    assert!(market.listing_of("origins", 0).is_none());
    assert_eq!(market.proceeds_of("nobody"), 0);
    assert!(market.events().is_empty());
    assert_eq!(market.active_listings(), 0);
}

#[test]
fn not_listed_error_for_every_mutation_on_absent_key() {
    let (mut market, token) = market_with_token("origins", "alice");

    let cancel = market.cancel_listing("alice", "origins", token);
    assert!(matches!(
        cancel.unwrap_err(),
        MarketError::Listing(ListingError::NotListed { .. })
    ));

    let update = market.update_listing("alice", "origins", token, 50);
    assert!(matches!(
        update.unwrap_err(),
        MarketError::Listing(ListingError::NotListed { .. })
    ));

    let buy = market.buy_item("bob", "origins", token, 50);
    assert!(matches!(
        buy.unwrap_err(),
        MarketError::Listing(ListingError::NotListed { .. })
    ));
}
