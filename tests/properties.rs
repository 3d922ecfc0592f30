//! Property tests for position and driver invariants.
//!
//! 1. High-water mark never decreases from bar to bar
//! 2. Ledger only grows and earlier entries never change
//! 3. After a buy the quote balance is zero; after a sell the base balance is zero
//! 4. Commission makes every fill strictly worse than the frictionless amount
//! 5. Guarded no-ops leave the position untouched

mod common;

use proptest::prelude::*;

use trailstop_backtester::backtesting::apply_bar;
use trailstop_backtester::models::{TradeKind, Transaction};
use trailstop_backtester::trading::{ExecutionPrice, Position};

use common::{bars_from_closes, base_time, make_quotes, test_settings};

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(50.0..200.0_f64, 2..80)
}

proptest! {
    #[test]
    fn high_water_mark_is_monotonic(closes in arb_closes()) {
        let quotes = make_quotes(&bars_from_closes(&closes));
        let mut pos = Position::new(&quotes, test_settings(), base_time());
        pos.buy(ExecutionPrice::Market);

        let mut last = pos.high_water_mark();
        for q in quotes.chronological() {
            apply_bar(&mut pos, q);
            prop_assert!(pos.high_water_mark() >= last);
            last = pos.high_water_mark();
        }
    }

    #[test]
    fn ledger_is_append_only(closes in arb_closes()) {
        let quotes = make_quotes(&bars_from_closes(&closes));
        let mut pos = Position::new(&quotes, test_settings(), base_time());
        pos.buy(ExecutionPrice::Market);

        let mut seen: Vec<Transaction> = pos.ledger().as_slice().to_vec();
        for q in quotes.chronological() {
            apply_bar(&mut pos, q);
            let now = pos.ledger().as_slice();
            prop_assert!(now.len() >= seen.len());
            prop_assert!(now.len() <= seen.len() + 1);
            prop_assert_eq!(&now[..seen.len()], &seen[..]);
            seen = now.to_vec();
        }
    }

    #[test]
    fn balances_are_mutually_exclusive_after_trades(closes in arb_closes()) {
        let quotes = make_quotes(&bars_from_closes(&closes));
        let mut pos = Position::new(&quotes, test_settings(), base_time());
        pos.buy(ExecutionPrice::Market);
        prop_assert_eq!(pos.quote_balance(), 0.0);

        for q in quotes.chronological() {
            match apply_bar(&mut pos, q) {
                Some(TradeKind::Buy) => {
                    prop_assert_eq!(pos.quote_balance(), 0.0);
                    prop_assert!(pos.base_balance() > 0.0);
                }
                Some(TradeKind::Sell) => {
                    prop_assert_eq!(pos.base_balance(), 0.0);
                    prop_assert!(pos.quote_balance() > 0.0);
                }
                None => {}
            }
        }
    }

    #[test]
    fn commission_reduces_fills(open in 10.0..100_000.0_f64, exit in 10.0..100_000.0_f64) {
        let quotes = make_quotes(&[(open, open, open, open)]);
        let mut pos = Position::new(&quotes, test_settings(), base_time());

        let spend = pos.quote_balance();
        pos.buy(ExecutionPrice::Market);
        prop_assert!(pos.base_balance() < spend / open);

        let held = pos.base_balance();
        pos.sell(ExecutionPrice::Limit(exit));
        prop_assert!(pos.quote_balance() < held * exit);
    }

    #[test]
    fn failed_orders_leave_state_unchanged(tries in 1usize..10, limit in 1.0..10_000.0_f64) {
        let quotes = make_quotes(&[(4000.0, 4100.0, 3900.0, 4050.0)]);
        let mut pos = Position::new(&quotes, test_settings(), base_time());
        pos.arm_limit_buy(limit);

        for _ in 0..tries {
            prop_assert!(pos.sell(ExecutionPrice::Market).is_none());
        }
        prop_assert_eq!(pos.quote_balance(), 1000.0);
        prop_assert_eq!(pos.base_balance(), 0.0);
        prop_assert!(pos.ledger().is_empty());
        prop_assert_eq!(pos.limit_buy(), Some(limit));

        pos.buy(ExecutionPrice::Market);
        let base = pos.base_balance();
        let len = pos.ledger().len();
        for _ in 0..tries {
            prop_assert!(pos.buy(ExecutionPrice::Limit(limit)).is_none());
        }
        prop_assert_eq!(pos.base_balance(), base);
        prop_assert_eq!(pos.ledger().len(), len);
    }
}
