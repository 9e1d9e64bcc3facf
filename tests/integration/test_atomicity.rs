//! Integration tests for all-or-nothing execution

use crate::{Fault, TestUtils};
use arbitrage_executor::{connectors::RateBook, route::VenueId, RevertReason};
use proptest::prelude::*;

const CUSTODY: u64 = 1_000_000;
const PRINCIPAL: u128 = 100_000;

fn fault_strategy() -> impl Strategy<Value = Fault> {
    prop_oneof![
        Just(Fault::Reject),
        Just(Fault::ShortChange),
        Just(Fault::Overconsume),
    ]
}

fn expected_code(fault: Fault) -> &'static str {
    match fault {
        Fault::ShortChange => "SLIPPAGE_EXCEEDED",
        _ => "VENUE_FAILURE",
    }
}

#[tokio::test]
async fn test_honest_routes_settle_for_every_length() {
    for legs in 1..=10 {
        let (engine, _book) = TestUtils::create_engine(CUSTODY, 10_100, Fault::None).await;
        let route = TestUtils::create_route(legs, PRINCIPAL, None);

        let result = engine.submit_route(&TestUtils::submitter(), &route).await;
        let receipt = result.receipt().unwrap_or_else(|| panic!("{} legs: {:?}", legs, result));
        assert_eq!(receipt.legs.len(), legs);
        assert_eq!(receipt.realized_profit, 1_000);
        assert_eq!(engine.custody_balance().await, CUSTODY as u128 + 1_000);
    }
}

#[tokio::test]
async fn test_last_leg_failure_rolls_back_applied_legs() {
    let (engine, _book) = TestUtils::create_engine(CUSTODY, 10_100, Fault::Reject).await;
    let route = TestUtils::create_route(4, PRINCIPAL, Some(3));

    let result = engine.submit_route(&TestUtils::submitter(), &route).await;
    assert!(matches!(
        result.revert_reason(),
        Some(RevertReason::VenueFailure { leg: 3, .. })
    ));
    assert_eq!(engine.custody_balance().await, CUSTODY as u128);
    assert!(engine.trade_history(100).await.is_empty());
    assert!(!engine.is_executing());
}

#[tokio::test]
async fn test_claimed_success_with_short_delivery_is_slippage() {
    let (engine, _book) = TestUtils::create_engine(CUSTODY, 10_100, Fault::ShortChange).await;
    let route = TestUtils::create_route(3, PRINCIPAL, Some(1));

    let result = engine.submit_route(&TestUtils::submitter(), &route).await;
    assert_eq!(
        result.revert_reason(),
        Some(&RevertReason::SlippageExceeded {
            leg: 1,
            min_amount_out: PRINCIPAL,
            actual_amount_out: PRINCIPAL - 1,
        })
    );
    assert_eq!(engine.custody_balance().await, CUSTODY as u128);
}

#[tokio::test]
async fn test_oracle_gap_reverts_mid_route() {
    let (engine, book) = TestUtils::create_engine(CUSTODY, 10_100, Fault::None).await;
    crash_exit_rates(&book).await;

    let route = TestUtils::create_route(3, PRINCIPAL, None);
    let result = engine.submit_route(&TestUtils::submitter(), &route).await;

    assert!(matches!(
        result.revert_reason(),
        Some(RevertReason::PriceDeviation { leg: 2, .. })
    ));
    assert_eq!(engine.custody_balance().await, CUSTODY as u128);
}

/// Make the exit venue quote far below any declared minimum
async fn crash_exit_rates(book: &RateBook) {
    use arbitrage_executor::{connectors::Rate, route::AssetId};

    for asset in [crate::USDC, crate::WETH, crate::DAI] {
        book.set_rate(
            &VenueId::new(crate::EXIT),
            &AssetId::new(asset),
            &AssetId::new(crate::USDC),
            Rate::new(1, 2),
        )
        .await;
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        max_shrink_iters: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn proptest_forced_leg_failure_rolls_back(
        (legs, faulty_leg) in (1usize..=10).prop_flat_map(|legs| (Just(legs), 0..legs)),
        fault in fault_strategy(),
    ) {
        let (code, leg, custody, history, executing) = tokio_test::block_on(async {
            let (engine, _book) = TestUtils::create_engine(CUSTODY, 10_100, fault).await;
            let route = TestUtils::create_route(legs, PRINCIPAL, Some(faulty_leg));

            let result = engine.submit_route(&TestUtils::submitter(), &route).await;
            let reason = result.revert_reason().cloned();
            let leg = match &reason {
                Some(RevertReason::VenueFailure { leg, .. })
                | Some(RevertReason::SlippageExceeded { leg, .. }) => Some(*leg),
                _ => None,
            };
            (
                reason.map(|r| r.code()),
                leg,
                engine.custody_balance().await,
                engine.trade_history(100).await.len(),
                engine.is_executing(),
            )
        });

        prop_assert_eq!(code, Some(expected_code(fault)));
        prop_assert_eq!(leg, Some(faulty_leg));
        prop_assert_eq!(custody, CUSTODY as u128);
        prop_assert_eq!(history, 0);
        prop_assert!(!executing);
    }
}
