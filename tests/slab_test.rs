//! Integration tests for slab decoding and queries.
//!
//! Random books are built with a seeded RNG, encoded to bytes and decoded
//! back; every query is checked against a `BTreeMap` holding the same orders.
//!
//! ```bash
//! cargo test --release --test slab_test -- --nocapture
//! ```

use std::collections::BTreeMap;

use critbit_slab::orderbook::{Node, Slab, SlabBuilder};
use critbit_slab::types::price::make_key;
use critbit_slab::{MarketConfig, RawPrice, ScaledPrice, Side, SlabError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

const CALLBACK_INFO_LEN: usize = 8;

const RANDOM_ORDER_COUNT: usize = 5_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Random book: key -> quantity. Same seed = same book.
fn generate_book(count: usize, seed: u64) -> BTreeMap<u128, u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut book = BTreeMap::new();
    for sequence in 0..count as u64 {
        let ticks = 1_000 + rng.gen_range(0..200u64);
        book.insert(make_key(ticks, sequence), rng.gen_range(1..=10_000));
    }
    book
}

fn encode_book(book: &BTreeMap<u128, u64>) -> Slab {
    let mut builder = SlabBuilder::with_capacity(CALLBACK_INFO_LEN, book.len())
        .free_slots(3)
        .spare_slots(5);
    for (&key, &quantity) in book {
        let callback_info = (key as u64).to_le_bytes().to_vec();
        builder.insert(key, callback_info, quantity).unwrap();
    }
    Slab::new(builder.encode().unwrap(), CALLBACK_INFO_LEN).unwrap()
}

fn keys(slab: &Slab, ascending: bool) -> Vec<u128> {
    slab.leaves(ascending)
        .unwrap()
        .into_iter()
        .map(|leaf| leaf.key)
        .collect()
}

/// (max key, min key) below `pointer`, checking the partition at every inner node
fn check_subtree(slab: &Slab, pointer: u32) -> (u128, u128) {
    match slab.node_at(pointer).unwrap() {
        Node::Leaf(leaf) => (leaf.key, leaf.key),
        Node::Inner(inner) => {
            let (low_max, low_min) = check_subtree(slab, inner.children[0]);
            let (high_max, high_min) = check_subtree(slab, inner.children[1]);
            assert!(
                low_max < high_min,
                "inner node at {pointer}: {low_max} !< {high_min}"
            );
            (high_max, low_min)
        }
        other => panic!("unexpected {} node at {pointer}", other.kind()),
    }
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn test_random_book_traversal_matches_model() {
    let book = generate_book(RANDOM_ORDER_COUNT, 42);
    let slab = encode_book(&book);

    let expected: Vec<u128> = book.keys().copied().collect();
    assert_eq!(keys(&slab, true), expected);

    let mut reversed = expected;
    reversed.reverse();
    assert_eq!(keys(&slab, false), reversed);

    assert_eq!(slab.traverse(true).count() as u64, slab.header().leaf_count);
    assert_eq!(slab.len(), book.len() as u64);
}

#[test]
fn test_leaves_carry_payload() {
    let book = generate_book(500, 9);
    let slab = encode_book(&book);

    for leaf in slab.leaves(true).unwrap() {
        assert_eq!(leaf.asset_quantity, book[&leaf.key]);
        assert_eq!(leaf.callback_info, (leaf.key as u64).to_le_bytes().to_vec());
    }
}

#[test]
fn test_critbit_partition_small_book() {
    let mut book = BTreeMap::new();
    for key in [3u128, 1, 5, 2, 4] {
        book.insert(key, 1);
    }
    let slab = encode_book(&book);

    let (max, min) = check_subtree(&slab, slab.header().root_node);
    assert_eq!((max, min), (5, 1));
    assert_eq!(keys(&slab, true), vec![1, 2, 3, 4, 5]);
    assert_eq!(keys(&slab, false), vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_critbit_partition_random_book() {
    let slab = encode_book(&generate_book(1_000, 5));
    check_subtree(&slab, slab.header().root_node);
}

// ============================================================================
// POINT QUERIES
// ============================================================================

#[test]
fn test_lookup_finds_every_present_key() {
    let book = generate_book(1_000, 17);
    let slab = encode_book(&book);

    for (&key, &quantity) in &book {
        let leaf = slab.lookup(key).unwrap().unwrap();
        assert_eq!(leaf.key, key);
        assert_eq!(leaf.asset_quantity, quantity);
    }
}

#[test]
fn test_lookup_absent_key_returns_longest_common_prefix() {
    let book = generate_book(1_000, 23);
    let slab = encode_book(&book);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..500 {
        let target = make_key(rng.gen_range(900..1_300), rng.gen());
        let best_prefix = book
            .keys()
            .map(|key| (key ^ target).leading_zeros())
            .max()
            .unwrap();

        let leaf = slab.lookup(target).unwrap().unwrap();
        assert_eq!((leaf.key ^ target).leading_zeros(), best_prefix);

        let exact = slab.find_exact(target).unwrap();
        assert_eq!(exact.is_some(), book.contains_key(&target));
    }
}

#[test]
fn test_min_max_match_model() {
    let book = generate_book(2_000, 31);
    let slab = encode_book(&book);

    let min = book.keys().next().copied();
    let max = book.keys().next_back().copied();

    assert_eq!(slab.find_min().unwrap().map(|leaf| leaf.key), min);
    assert_eq!(slab.find_max().unwrap().map(|leaf| leaf.key), max);
    assert_eq!(slab.best(Side::Ask).unwrap().map(|leaf| leaf.key), min);
    assert_eq!(slab.best(Side::Bid).unwrap().map(|leaf| leaf.key), max);
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[test]
fn test_l2_depth_matches_model() {
    let book = generate_book(RANDOM_ORDER_COUNT, 7);
    let slab = encode_book(&book);

    let mut model: BTreeMap<u64, (u64, usize)> = BTreeMap::new();
    for (&key, &quantity) in &book {
        let level = model.entry((key >> 64) as u64).or_default();
        level.0 += quantity;
        level.1 += 1;
    }

    let asks = slab.l2_depth(10, Side::Ask, &RawPrice).unwrap();
    let expected: Vec<_> = model.iter().take(10).collect();
    assert_eq!(asks.len(), 10);
    for (level, (&price, &(quantity, count))) in asks.iter().zip(expected) {
        assert_eq!(level.price, price);
        assert_eq!(level.quantity, quantity);
        assert_eq!(level.order_count, count);
    }

    let bids = slab.l2_depth(10, Side::Bid, &RawPrice).unwrap();
    let expected: Vec<_> = model.iter().rev().take(10).collect();
    for (level, (&price, &(quantity, _))) in bids.iter().zip(expected) {
        assert_eq!((level.price, level.quantity), (price, quantity));
    }

    // More levels requested than exist
    let all = slab.l2_depth(usize::MAX, Side::Ask, &RawPrice).unwrap();
    assert_eq!(all.len(), model.len());
}

#[test]
fn test_l2_depth_scaled_prices() {
    let mut builder = SlabBuilder::new(0);
    builder.insert(make_key(10_000, 0), vec![], 2).unwrap();
    builder.insert(make_key(10_000, 1), vec![], 3).unwrap();
    builder.insert(make_key(10_025, 2), vec![], 4).unwrap();
    let slab = builder.build().unwrap();

    let extractor = ScaledPrice::new(Decimal::new(1, 2));
    let levels = slab.l2_depth(5, Side::Ask, &extractor).unwrap();

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].price, Decimal::new(10_000, 2));
    assert_eq!(levels[0].quantity, 5);
    assert_eq!(levels[1].price, Decimal::new(10_025, 2));
}

#[test]
fn test_top_n_matches_model() {
    let book = generate_book(1_000, 13);
    let slab = encode_book(&book);

    let top: Vec<u128> = slab
        .top_n(25, Side::Bid)
        .map(|leaf| leaf.unwrap().key)
        .collect();
    let expected: Vec<u128> = book.keys().rev().take(25).copied().collect();
    assert_eq!(top, expected);

    assert_eq!(slab.top_n(0, Side::Ask).count(), 0);
    assert_eq!(slab.top_n(10_000, Side::Ask).count(), book.len());
}

// ============================================================================
// EDGE CASES
// ============================================================================

#[test]
fn test_empty_slab_answers_nothing() {
    let slab = SlabBuilder::new(CALLBACK_INFO_LEN)
        .spare_slots(2)
        .build()
        .unwrap();

    assert!(slab.is_empty());
    assert_eq!(slab.traverse(true).count(), 0);
    assert_eq!(slab.lookup(42).unwrap(), None);
    assert_eq!(slab.find_min().unwrap(), None);
    assert_eq!(slab.find_max().unwrap(), None);
    assert!(slab.l2_depth(5, Side::Bid, &RawPrice).unwrap().is_empty());
    assert_eq!(slab.top_n(5, Side::Ask).count(), 0);
}

#[test]
fn test_free_list_walk() {
    let slab = encode_book(&generate_book(100, 1));

    let free: Vec<_> = slab.free_list().collect::<Result<_, _>>().unwrap();
    assert_eq!(free.len() as u64, slab.header().free_list_len);
    let (_, last) = free.last().unwrap();
    assert!(last.is_last());
}

#[test]
fn test_corrupt_slot_fails_whole_query() {
    let book = generate_book(64, 3);
    let slab = encode_book(&book);
    let max_key = *book.keys().next_back().unwrap();

    // Find the slot holding the best bid and zero its tag byte
    let mut bytes = slab.as_bytes().to_vec();
    let pointer = (0..slab.capacity() as u32)
        .find(|&p| matches!(slab.node_at(p), Ok(Node::Leaf(ref leaf)) if leaf.key == max_key))
        .unwrap();
    let offset = 65 + pointer as usize * slab.slot_size();
    bytes[offset] = 0;
    let corrupt = Slab::new(bytes, CALLBACK_INFO_LEN).unwrap();

    assert!(matches!(
        corrupt.l2_depth(3, Side::Bid, &RawPrice),
        Err(SlabError::StructuralCorruption(_))
    ));
    assert!(corrupt.leaves(true).is_err());

    // The ask side never reaches that slot
    assert!(corrupt.top_n(3, Side::Ask).all(|leaf| leaf.is_ok()));
}

#[test]
fn test_slab_from_config() {
    let config = MarketConfig::from_json(r#"{ "callback_info_len": 8 }"#).unwrap();
    let book = generate_book(10, 77);
    let slab = encode_book(&book);

    let reread = Slab::from_config(slab.as_bytes().to_vec(), &config).unwrap();
    assert_eq!(reread.slot_size(), config.slot_size().unwrap());
    assert_eq!(keys(&reread, true), book.keys().copied().collect::<Vec<_>>());
}
