//! critbit-slab - Binary Entry Point
//!
//! Builds a small ask-side slab in memory, decodes it back and prints the
//! views a market-data feed would publish. Set `RUST_LOG=critbit_slab=trace`
//! to watch individual slot decodes.

use critbit_slab::config::{AccountTag, MarketConfig};
use critbit_slab::orderbook::{Slab, SlabBuilder};
use critbit_slab::types::price::{format_ticks, make_key};
use critbit_slab::Side;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
    "callback_info_len": 8,
    "tick_size": "0.01"
}"#;

fn main() -> critbit_slab::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("===========================================");
    println!("  critbit-slab - order book slab reader");
    println!("===========================================");
    println!();

    let config = MarketConfig::from_json(CONFIG)?;

    // (price ticks, quantity) per resting ask
    let orders = [
        (10_050u64, 3u64),
        (10_000, 5),
        (10_000, 2),
        (10_100, 9),
        (10_025, 1),
    ];

    let mut builder = SlabBuilder::new(config.callback_info_len)
        .account_tag(AccountTag::Asks.to_u8())
        .spare_slots(4);
    for (sequence, (ticks, quantity)) in orders.iter().enumerate() {
        let owner_tag = (sequence as u64).to_le_bytes().to_vec();
        builder.insert(make_key(*ticks, sequence as u64), owner_tag, *quantity)?;
    }
    let bytes = builder.encode()?;
    println!("Encoded {} orders into {} bytes", orders.len(), bytes.len());

    let asks = Slab::from_config(bytes, &config)?;
    println!(
        "Decoded slab: {} leaves, slot size {}, capacity {} slots",
        asks.len(),
        asks.slot_size(),
        asks.capacity()
    );
    println!();

    if let Some(best) = asks.best(Side::Ask)? {
        println!(
            "Best ask: {} x {}",
            format_ticks(best.price_ticks(), config.tick_size),
            best.asset_quantity
        );
    }

    println!();
    println!("L2 depth (3 levels):");
    for level in asks.l2_depth(3, Side::Ask, &config.price_extractor())? {
        println!(
            "  {:>8}  qty {:>4}  ({} orders)",
            level.price, level.quantity, level.order_count
        );
    }

    println!();
    println!("Top 2 orders:");
    for leaf in asks.top_n(2, Side::Ask) {
        let leaf = leaf?;
        println!(
            "  key {:#034x}  qty {}",
            leaf.key, leaf.asset_quantity
        );
    }

    Ok(())
}
