// Marketplace hot-path benchmarks.
//
// Covers the list/cancel churn cycle, the full sale path, and registry
// reads at various book sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use vitrine_market::market::Marketplace;
use vitrine_market::nft::NftRegistry;
use vitrine_market::settlement::SettlementRail;
use vitrine_market::types::ItemKey;

type Market = Marketplace<NftRegistry, SettlementRail>;

/// Builds a market with `tokens` approved tokens minted to "alice".
fn seeded_market(tokens: u64) -> Market {
    let mut market = Marketplace::new(NftRegistry::new(), SettlementRail::new());
    for _ in 0..tokens {
        let id = market.oracle_mut().mint("origins", "alice");
        market
            .oracle_mut()
            .set_approval(&ItemKey::new("origins", id), "alice", true)
            .unwrap();
    }
    market
}

fn bench_list_cancel_cycle(c: &mut Criterion) {
    let mut market = seeded_market(1);

    c.bench_function("market/list_cancel_cycle", |b| {
        b.iter(|| {
            market.list_item("alice", "origins", 0, 100).unwrap();
            market.cancel_listing("alice", "origins", 0).unwrap();
        });
    });
}

fn bench_sale_cycle(c: &mut Criterion) {
    let mut market = seeded_market(1);
    let key = ItemKey::new("origins", 0);

    // Seller buys her own token each round: ownership is unchanged, so the
    // cycle only needs the approval (cleared by every transfer) restored.
    c.bench_function("market/list_buy_cycle", |b| {
        b.iter(|| {
            market
                .oracle_mut()
                .set_approval(&key, "alice", true)
                .unwrap();
            market.list_item("alice", "origins", 0, 100).unwrap();
            market.buy_item("alice", "origins", 0, 100).unwrap();
        });
    });
}

fn bench_listing_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("market/listing_of");

    for size in [10u64, 1_000, 10_000] {
        let mut market = seeded_market(size);
        for id in 0..size {
            market.list_item("alice", "origins", id, 100).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| market.listing_of("origins", size / 2));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_list_cancel_cycle,
    bench_sale_cycle,
    bench_listing_reads
);
criterion_main!(benches);
