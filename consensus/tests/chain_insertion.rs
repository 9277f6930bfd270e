use ferra_consensus::model::stores::chain::ChainStore;
use ferra_consensus::pipeline::header_chain::{HeaderChain, InsertOutcome};
use ferra_consensus::pipeline::notifier::HeadNotifier;
use ferra_consensus::test_helpers::{chain_with_parent, genesis_params, header_with_parent, header_with_parent_and_time};
use ferra_consensus::{errors::RuleError, params::Params};
use ferra_consensus_core::api::counters::ProcessingCounters;
use ferra_consensus_core::{header::Header, Td};
use ferra_database::prelude::{ConnBuilder, StoreResultExtensions};
use ferra_database::utils::DbLifetime;
use ferra_database::create_temp_db;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CollectingNotifier {
    headers: Mutex<Vec<Arc<Header>>>,
}

impl HeadNotifier for CollectingNotifier {
    fn on_new_header(&self, header: Arc<Header>) {
        self.headers.lock().push(header);
    }
}

impl CollectingNotifier {
    fn numbers(&self) -> Vec<u64> {
        self.headers.lock().iter().map(|h| h.number).collect()
    }

    fn clear(&self) {
        self.headers.lock().clear();
    }
}

struct Context {
    chain: HeaderChain,
    params: Params,
    notifier: Arc<CollectingNotifier>,
    counters: Arc<ProcessingCounters>,
    // Dropped last, after the chain has released its DB references
    _lifetime: DbLifetime,
}

fn setup() -> Context {
    setup_with_params(genesis_params(1))
}

fn setup_with_params(params: Params) -> Context {
    let (lifetime, db) = create_temp_db!(ConnBuilder::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let counters = Arc::new(ProcessingCounters::default());
    let chain = HeaderChain::new(
        ChainStore::new(db, 64).into(),
        params.clone(),
        Arc::clone(&counters),
        Some(Arc::clone(&notifier) as Arc<dyn HeadNotifier>),
    )
    .unwrap();
    Context { chain, params, notifier, counters, _lifetime: lifetime }
}

fn insert(ctx: &Context, headers: &[Arc<Header>]) -> InsertOutcome {
    ctx.chain.insert_header_chain(headers, Duration::ZERO).unwrap()
}

#[test]
fn test_extending_genesis_by_two() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 2);
    let h2 = header_with_parent(&h1, 2);

    let outcome = insert(&ctx, &[Arc::clone(&h1), Arc::clone(&h2)]);
    assert_eq!(outcome, InsertOutcome { new_canonical: true, reorg: false, fork_block: 2 });

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), h2.hash);
    assert_eq!(store.td(2, h2.hash).unwrap(), Td::from(5u64));
    assert_eq!(store.canonical_hash(1).unwrap(), h1.hash);
    assert_eq!(store.canonical_hash(2).unwrap(), h2.hash);
    assert_eq!(store.header_number(h2.hash).unwrap(), 2);
    assert_eq!(ctx.notifier.numbers(), vec![1, 2]);
}

#[test]
fn test_lighter_sibling_is_stored_but_not_canonical() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 2);
    let h2 = header_with_parent(&h1, 2);
    insert(&ctx, &[Arc::clone(&h1), Arc::clone(&h2)]);
    ctx.notifier.clear();

    // TD 1 + 3 = 4 < 5
    let sibling = header_with_parent(&ctx.params.genesis, 3);
    let outcome = insert(&ctx, &[Arc::clone(&sibling)]);
    assert_eq!(outcome, InsertOutcome::default());

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), h2.hash);
    assert_eq!(store.canonical_hash(1).unwrap(), h1.hash);
    // The sibling is in the store with its TD, just not canonical
    assert!(store.has_header(1, sibling.hash).unwrap());
    assert_eq!(store.td(1, sibling.hash).unwrap(), Td::from(4u64));
    assert!(ctx.notifier.numbers().is_empty());
}

#[test]
fn test_equal_td_shorter_chain_is_not_canonical() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 2);
    let h2 = header_with_parent(&h1, 2);
    insert(&ctx, &[Arc::clone(&h1), Arc::clone(&h2)]);

    // TD 1 + 4 = 5 == 5, but the incoming tip is below the head
    let sibling = header_with_parent(&ctx.params.genesis, 4);
    let outcome = insert(&ctx, &[sibling]);
    assert_eq!(outcome, InsertOutcome::default());
    assert_eq!(ctx.chain.store().head_hash().unwrap(), h2.hash);
}

#[test]
fn test_heavier_fork_reorgs_from_genesis() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 2);
    let h2 = header_with_parent(&h1, 2);
    insert(&ctx, &[Arc::clone(&h1), Arc::clone(&h2)]);
    ctx.notifier.clear();

    // TD 1 + 9 = 10 > 5
    let fork = chain_with_parent(&ctx.params.genesis, 3, 3);
    let outcome = insert(&ctx, &fork);
    assert_eq!(outcome, InsertOutcome { new_canonical: true, reorg: true, fork_block: 0 });

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), fork[2].hash);
    assert_eq!(store.canonical_hash(1).unwrap(), fork[0].hash);
    assert_eq!(store.canonical_hash(2).unwrap(), fork[1].hash);
    assert_eq!(store.canonical_hash(3).unwrap(), fork[2].hash);
    // The replaced chain is still stored, just no longer canonical
    assert!(store.has_header(1, h1.hash).unwrap());
    assert!(store.has_header(2, h2.hash).unwrap());
    assert_eq!(ctx.notifier.numbers(), vec![3]);
}

#[test]
fn test_deep_fork_rewrites_prior_canonical_pointers() {
    let ctx = setup();
    let canonical = chain_with_parent(&ctx.params.genesis, 5, 3);
    insert(&ctx, &canonical);

    // A lighter branch stored alongside the canonical chain: TD 1 + 9 < 16
    let branch = chain_with_parent(&ctx.params.genesis, 3, 3);
    assert_eq!(insert(&ctx, &branch), InsertOutcome::default());

    // Extending the branch overtakes the head: TD 10 + 9 = 19 > 16. Its
    // divergence point lies three blocks before the incoming batch.
    let tip = header_with_parent(&branch[2], 9);
    let outcome = insert(&ctx, &[Arc::clone(&tip)]);
    assert_eq!(outcome, InsertOutcome { new_canonical: true, reorg: true, fork_block: 0 });

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), tip.hash);
    assert_eq!(store.canonical_hash(1).unwrap(), branch[0].hash);
    assert_eq!(store.canonical_hash(2).unwrap(), branch[1].hash);
    assert_eq!(store.canonical_hash(3).unwrap(), branch[2].hash);
    assert_eq!(store.canonical_hash(4).unwrap(), tip.hash);
}

#[test]
fn test_blacklisted_hash_aborts_without_writes() {
    let base = genesis_params(1);
    let h1 = header_with_parent(&base.genesis, 2);
    let h2 = header_with_parent(&h1, 2);
    let h3 = header_with_parent(&h2, 2);
    let params = genesis_params(1).with_bad_hashes([h3.hash]);
    let ctx = setup_with_params(params);

    let err = ctx.chain.insert_header_chain(&[Arc::clone(&h1), h2, h3], Duration::ZERO).unwrap_err();
    assert!(matches!(err, RuleError::BlacklistedHash(_)));

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), ctx.params.genesis.hash);
    assert!(!store.has_header(1, h1.hash).unwrap());
}

#[test]
fn test_empty_batch_is_a_noop() {
    let ctx = setup();
    assert_eq!(insert(&ctx, &[]), InsertOutcome::default());
    assert_eq!(ctx.chain.store().head_hash().unwrap(), ctx.params.genesis.hash);
}

#[test]
fn test_reinserting_canonical_prefix_is_a_noop() {
    let ctx = setup();
    let headers = chain_with_parent(&ctx.params.genesis, 2, 3);
    insert(&ctx, &headers);
    ctx.notifier.clear();

    assert_eq!(insert(&ctx, &headers), InsertOutcome::default());
    assert_eq!(ctx.chain.store().head_hash().unwrap(), headers[2].hash);
    assert!(ctx.notifier.numbers().is_empty());
}

#[test]
fn test_single_header_extends_head_by_one() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 2);
    insert(&ctx, &[Arc::clone(&h1)]);
    ctx.notifier.clear();

    let h2 = header_with_parent(&h1, 2);
    let outcome = insert(&ctx, &[Arc::clone(&h2)]);
    assert_eq!(outcome, InsertOutcome { new_canonical: true, reorg: false, fork_block: 2 });
    assert_eq!(ctx.chain.store().head_hash().unwrap(), h2.hash);
    assert_eq!(ctx.chain.store().canonical_hash(2).unwrap(), h2.hash);
    assert_eq!(ctx.notifier.numbers(), vec![2]);
}

#[test]
fn test_heavier_shorter_chain_truncates_canonical_numbers() {
    let ctx = setup();
    let headers = chain_with_parent(&ctx.params.genesis, 2, 2);
    insert(&ctx, &headers);
    ctx.notifier.clear();

    // TD 1 + 10 = 11 > 5 with a tip below the previous head
    let heavy = header_with_parent(&ctx.params.genesis, 10);
    let outcome = insert(&ctx, &[Arc::clone(&heavy)]);
    assert_eq!(outcome, InsertOutcome { new_canonical: true, reorg: true, fork_block: 0 });

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), heavy.hash);
    assert_eq!(store.canonical_hash(1).unwrap(), heavy.hash);
    // The old assignment above the new head is gone
    assert_eq!(store.canonical_hash(2).optional().unwrap(), None);
    // Head moved backwards, so no forward notifications are due
    assert!(ctx.notifier.numbers().is_empty());
}

#[test]
fn test_growing_a_previously_lighter_branch_without_reorg() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 4);
    insert(&ctx, &[Arc::clone(&h1)]);

    // Lighter branch: stored only
    let b1 = header_with_parent(&ctx.params.genesis, 2);
    assert_eq!(insert(&ctx, &[Arc::clone(&b1)]), InsertOutcome::default());

    // Re-submitting the branch together with a heavy extension: the stored
    // prefix is ignored for writes yet still contributes to the extern TD
    let b2 = header_with_parent(&b1, 9);
    let outcome = insert(&ctx, &[Arc::clone(&b1), Arc::clone(&b2)]);
    assert!(outcome.new_canonical);

    let store = ctx.chain.store();
    assert_eq!(store.head_hash().unwrap(), b2.hash);
    assert_eq!(store.td(2, b2.hash).unwrap(), Td::from(12u64));
    assert_eq!(store.canonical_hash(1).unwrap(), b1.hash);
    assert_eq!(store.canonical_hash(2).unwrap(), b2.hash);
}

#[test]
fn test_notifications_follow_each_advance_in_order() {
    let ctx = setup();
    let headers = chain_with_parent(&ctx.params.genesis, 2, 5);

    insert(&ctx, &headers[..2]);
    insert(&ctx, &headers[2..]);
    assert_eq!(ctx.notifier.numbers(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_missing_notifier_is_tolerated() {
    let (_lifetime, db) = create_temp_db!(ConnBuilder::default());
    let params = genesis_params(1);
    let chain = HeaderChain::new(ChainStore::new(db, 64).into(), params.clone(), Default::default(), None).unwrap();

    let headers = chain_with_parent(&params.genesis, 2, 2);
    let outcome = chain.insert_header_chain(&headers, Duration::ZERO).unwrap();
    assert!(outcome.new_canonical);
}

#[test]
fn test_ignored_headers_still_contribute_difficulty() {
    let ctx = setup();
    let h1 = header_with_parent(&ctx.params.genesis, 9);
    insert(&ctx, &[h1]);

    let branch = chain_with_parent(&ctx.params.genesis, 2, 2);
    assert_eq!(insert(&ctx, &branch), InsertOutcome::default());
    // Re-submitting the lighter branch skips the stored headers entirely
    assert_eq!(insert(&ctx, &branch), InsertOutcome::default());

    let snapshot = ctx.counters.snapshot();
    assert_eq!(snapshot.headers_ignored, 2);
    assert_eq!(snapshot.headers_submitted, 5);
    // Both TDs were computed through the stored headers on first insertion
    assert_eq!(ctx.chain.store().td(2, branch[1].hash).unwrap(), Td::from(5u64));
    assert_eq!(ctx.counters.snapshot().highest_header_number, 2);
}

#[test]
fn test_canonical_invariants_hold_after_reorgs() {
    let ctx = setup();
    let first = chain_with_parent(&ctx.params.genesis, 2, 4);
    insert(&ctx, &first);
    let second = chain_with_parent(&ctx.params.genesis, 3, 4);
    insert(&ctx, &second);
    // TD 1 + 15 = 16 beats 13 with a shorter chain
    let heavy = chain_with_parent(&ctx.params.genesis, 5, 3);
    insert(&ctx, &heavy);

    let store = ctx.chain.store();
    let head = store.current_header().unwrap();
    assert_eq!(head.hash, heavy[2].hash);

    // Every canonical entry exists and links to the canonical entry below it
    let mut number = head.number;
    let mut hash = head.hash;
    while number > 0 {
        let header = store.header(number, hash).unwrap();
        assert_eq!(store.canonical_hash(number).unwrap(), hash);
        assert_eq!(store.canonical_hash(number - 1).unwrap(), header.parent_hash);
        hash = header.parent_hash;
        number -= 1;
    }
    // The head number is the largest with a canonical entry
    assert_eq!(store.canonical_hash(head.number + 1).optional().unwrap(), None);
    // TD of the head is maximal among all stored tips
    let head_td = store.td(head.number, head.hash).unwrap();
    for tip in [&first[3], &second[3]] {
        assert!(head_td >= store.td(tip.number, tip.hash).unwrap());
    }
}
