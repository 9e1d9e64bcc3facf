//! Stress tests for serialised execution

use crate::{ScriptedVenue, TestUtils, EXIT, PASS_THROUGH, USDC, WETH};
use arbitrage_executor::{
    connectors::SimulatedOracle,
    route::{Identity, Leg, Route, VenueId},
    ArbitrageExecutor, EngineError, ExecutionResult, RevertReason, VenueRegistry,
};
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CUSTODY: u64 = 150_000;
const PRINCIPAL: u128 = 100_000;
const PROFIT: u128 = 1_000;

/// Engine whose venues sleep mid-swap, so overlapping routes would interleave
/// if the engine let them.
async fn slow_engine(delay: Duration) -> (Arc<ArbitrageExecutor>, Vec<Arc<ScriptedVenue>>) {
    let config = TestUtils::create_test_config(CUSTODY);
    let book = TestUtils::create_rate_book(10_100).await;

    let venues: Vec<Arc<ScriptedVenue>> = [PASS_THROUGH, EXIT]
        .into_iter()
        .map(|id| Arc::new(ScriptedVenue::new(id, book.clone()).with_delay(delay)))
        .collect();

    let mut registry = VenueRegistry::new();
    for venue in &venues {
        registry.register(venue.clone()).unwrap();
    }

    let oracle = Arc::new(SimulatedOracle::new(book));
    let engine = ArbitrageExecutor::new(&config, registry, oracle).unwrap();
    (Arc::new(engine), venues)
}

fn overlapping_route() -> Route {
    Route::new(vec![
        Leg::new(PASS_THROUGH, USDC, WETH, PRINCIPAL, PRINCIPAL),
        Leg::new(EXIT, WETH, USDC, PRINCIPAL, PRINCIPAL),
    ])
}

/// Every outcome either settled or was turned away while another route ran
fn assert_serial_outcomes(results: &[ExecutionResult]) -> usize {
    for result in results {
        if let Some(reason) = result.revert_reason() {
            assert_eq!(reason, &RevertReason::Reentrancy, "{:?}", result);
        }
    }
    results.iter().filter(|result| result.is_success()).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_overlapping_routes_serialise() {
    let (engine, venues) = slow_engine(Duration::from_millis(2)).await;
    let route = overlapping_route();
    let (submitter_a, submitter_b) = (Identity::new("submitter-a"), Identity::new("submitter-b"));

    // Together the two principals exceed custody; run concurrently against a
    // shared balance one of them could not be funded.
    let (a, b) = tokio::join!(
        engine.submit_route(&submitter_a, &route),
        engine.submit_route(&submitter_b, &route),
    );

    let settled = assert_serial_outcomes(&[a.clone(), b.clone()]);
    assert!(settled >= 1, "{:?} {:?}", a, b);

    let mut custody_after: Vec<u128> = [&a, &b]
        .iter()
        .filter_map(|result| result.receipt().map(|receipt| receipt.custody_after))
        .collect();
    custody_after.sort_unstable();
    let expected: Vec<u128> = (1..=settled as u128)
        .map(|count| CUSTODY as u128 + count * PROFIT)
        .collect();
    assert_eq!(custody_after, expected);
    assert_eq!(engine.custody_balance().await, CUSTODY as u128 + settled as u128 * PROFIT);

    for venue in venues {
        assert_eq!(venue.max_in_flight().load(Ordering::SeqCst), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sequential_routes_both_settle() {
    let (engine, _venues) = slow_engine(Duration::from_millis(1)).await;
    let route = overlapping_route();

    let first = engine.submit_route(&Identity::new("submitter-a"), &route).await;
    let second = engine.submit_route(&Identity::new("submitter-b"), &route).await;

    assert_eq!(first.receipt().map(|r| r.custody_after), Some(CUSTODY as u128 + PROFIT));
    assert_eq!(second.receipt().map(|r| r.custody_after), Some(CUSTODY as u128 + 2 * PROFIT));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_intermediate_balances() {
    let (engine, venues) = slow_engine(Duration::from_millis(2)).await;
    const SUBMISSIONS: usize = 16;

    let done = Arc::new(AtomicBool::new(false));
    let observer = {
        let engine = engine.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut seen = BTreeSet::new();
            while !done.load(Ordering::SeqCst) {
                seen.insert(engine.custody_balance().await);
                tokio::task::yield_now().await;
            }
            seen
        })
    };

    let submissions = (0..SUBMISSIONS).map(|index| {
        let engine = engine.clone();
        tokio::spawn(async move {
            let submitter = Identity::new(format!("submitter-{}", index));
            engine.submit_route(&submitter, &overlapping_route()).await
        })
    });
    let results: Vec<ExecutionResult> = join_all(submissions)
        .await
        .into_iter()
        .map(|joined| joined.expect("submission task panicked"))
        .collect();

    done.store(true, Ordering::SeqCst);
    let seen = observer.await.expect("observer task panicked");

    let settled = assert_serial_outcomes(&results);
    assert!(settled >= 1);

    let after = engine.custody_balance().await;
    assert_eq!(after, CUSTODY as u128 + settled as u128 * PROFIT);

    // Only committed balances: the opening custody plus whole profits
    for balance in seen {
        assert!(balance >= CUSTODY as u128, "observed {}", balance);
        assert_eq!((balance - CUSTODY as u128) % PROFIT, 0, "observed {}", balance);
    }

    let stats = engine.statistics().await;
    assert_eq!(stats.settled, settled as u64);
    assert_eq!(stats.total_attempts, SUBMISSIONS as u64);
    assert_eq!(engine.trade_history(100).await.len(), settled);
    for venue in venues {
        assert_eq!(venue.max_in_flight().load(Ordering::SeqCst), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_withdrawal_rejected_during_in_flight_route() {
    let (engine, _venues) = slow_engine(Duration::from_millis(100)).await;

    let submit = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .submit_route(&Identity::new("submitter"), &overlapping_route())
                .await
        })
    };

    while !engine.is_executing() && !submit.is_finished() {
        tokio::task::yield_now().await;
    }
    let during = engine.withdraw(&TestUtils::owner(), CUSTODY as u128).await;

    let result = submit.await.expect("submission task panicked");
    assert!(result.is_success());
    assert_eq!(during, Err(EngineError::Reentrancy));
    assert_eq!(engine.custody_balance().await, CUSTODY as u128 + PROFIT);

    // Once the route has settled the owner gets through
    assert_eq!(engine.withdraw(&TestUtils::owner(), CUSTODY as u128).await, Ok(PROFIT));
    assert_eq!(engine.venues().ids(), vec![VenueId::new(PASS_THROUGH), VenueId::new(EXIT)]);
}
