//! Interactive CLI demo of the full VITRINE marketplace lifecycle.
//!
//! Walks through minting a collection, approving the marketplace, listing,
//! repricing, buying, and withdrawing proceeds. The output uses ANSI
//! escape codes for colored, storytelling-style terminal rendering.
//!
//! Run with:
//!   cargo run --example demo --release

use vitrine_market::market::Marketplace;
use vitrine_market::nft::NftRegistry;
use vitrine_market::oracle::OwnershipOracle;
use vitrine_market::settlement::SettlementRail;
use vitrine_market::types::ItemKey;

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                            {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    VITRINE  --  Marketplace Lifecycle Demo                 {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Version 0.1.0  |  list / buy / withdraw                 {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                            {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!("{CYAN}--------------------------------------------------------{RESET}");
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn ok(text: &str) {
    println!("{GREEN}  + {text}{RESET}");
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

fn main() {
    banner();

    let mut market = Marketplace::new(NftRegistry::new(), SettlementRail::new());

    section(1, "Mint the 'origins' collection");
    let token = market.oracle_mut().mint("origins", "alice");
    ok(&format!("minted origins#{token} to alice"));

    section(2, "Approve the marketplace");
    subsection("only the owner can grant transfer authority");
    market
        .oracle_mut()
        .set_approval(&ItemKey::new("origins", token), "alice", true)
        .expect("owner approval");
    ok("marketplace approved for origins#0");

    section(3, "List at 100");
    market
        .list_item("alice", "origins", token, 100)
        .expect("listing");
    let listing = market.listing_of("origins", token).expect("just listed");
    ok(&format!(
        "listed by {} at {} (since {})",
        listing.seller, listing.price, listing.listed_at
    ));

    section(4, "Reprice to 140");
    market
        .update_listing("alice", "origins", token, 140)
        .expect("reprice");
    ok(&format!(
        "asking price is now {}",
        market.listing_of("origins", token).unwrap().price
    ));

    section(5, "Bob buys (and overpays)");
    subsection("payment of 150 against a 140 listing -- the excess is retained");
    market
        .buy_item("bob", "origins", token, 150)
        .expect("purchase");
    ok(&format!(
        "origins#{token} now owned by {}",
        market
            .oracle()
            .owner_of(&ItemKey::new("origins", token))
            .unwrap()
    ));
    ok(&format!("alice's proceeds: {}", market.proceeds_of("alice")));

    section(6, "Alice withdraws her proceeds");
    let amount = market.withdraw_proceeds("alice").expect("withdrawal");
    ok(&format!("paid out {amount}; remaining balance is 0"));
    ok(&format!(
        "settlement journal shows {} delivered to alice",
        market.rail().delivered_to("alice")
    ));

    section(7, "The notification channel saw everything");
    for (i, event) in market.events().iter().enumerate() {
        subsection(&format!("{i}: {event:?}"));
    }

    println!();
    println!("{BOLD}{GREEN}Done.{RESET}");
    println!();
}
