//! Ledger accounting tests: record_trade, position summation, history.
//! Testable without HTTP; prices are explicit inputs here.

use papertrader::ledger::{Ledger, TradeError};
use papertrader::types::trade::Direction;
use uuid::Uuid;

fn funded_ledger(user_id: Uuid, cash: i64) -> Ledger {
    let mut ledger = Ledger::new();
    ledger.open_account(user_id, cash);
    ledger
}

#[test]
fn buy_debits_cash_and_opens_position() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    let record = ledger
        .record_trade(user_id, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap();

    assert_eq!(record.shares, 10);
    assert_eq!(record.price, 150_00);
    assert_eq!(record.direction, Direction::Buy);
    assert_eq!(ledger.cash_balance(user_id), Some(8_500_00));
    assert_eq!(ledger.position(user_id, "AAPL"), 10);
}

#[test]
fn sell_credits_cash_and_reduces_position() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    ledger
        .record_trade(user_id, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap();
    let record = ledger
        .record_trade(user_id, "AAPL", 5, Direction::Sell, 160_00)
        .unwrap();

    assert_eq!(record.shares, -5);
    assert_eq!(ledger.cash_balance(user_id), Some(9_300_00));
    assert_eq!(ledger.position(user_id, "AAPL"), 5);
}

#[test]
fn overselling_fails_and_leaves_state_unchanged() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    ledger
        .record_trade(user_id, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap();
    ledger
        .record_trade(user_id, "AAPL", 5, Direction::Sell, 160_00)
        .unwrap();

    let err = ledger
        .record_trade(user_id, "AAPL", 10, Direction::Sell, 160_00)
        .unwrap_err();
    assert_eq!(
        err,
        TradeError::InsufficientShares {
            requested: 10,
            held: 5
        }
    );
    assert_eq!(ledger.cash_balance(user_id), Some(9_300_00));
    assert_eq!(ledger.position(user_id, "AAPL"), 5);
    assert_eq!(ledger.history(user_id).len(), 2);
}

#[test]
fn buying_beyond_cash_fails_and_leaves_state_unchanged() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 100_00);

    let err = ledger
        .record_trade(user_id, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap_err();
    assert_eq!(
        err,
        TradeError::InsufficientFunds {
            required: 1_500_00,
            available: 100_00
        }
    );
    assert_eq!(ledger.cash_balance(user_id), Some(100_00));
    assert!(ledger.history(user_id).is_empty());
}

#[test]
fn selling_with_no_position_fails() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    let err = ledger
        .record_trade(user_id, "AAPL", 1, Direction::Sell, 150_00)
        .unwrap_err();
    assert_eq!(
        err,
        TradeError::InsufficientShares {
            requested: 1,
            held: 0
        }
    );
}

#[test]
fn non_positive_share_counts_are_rejected() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    for shares in [0, -5] {
        let err = ledger
            .record_trade(user_id, "AAPL", shares, Direction::Buy, 150_00)
            .unwrap_err();
        assert_eq!(err, TradeError::InvalidShareCount { shares });
    }
    assert!(ledger.history(user_id).is_empty());
}

#[test]
fn trades_for_unknown_account_fail() {
    let mut ledger = Ledger::new();
    let err = ledger
        .record_trade(Uuid::new_v4(), "AAPL", 1, Direction::Buy, 150_00)
        .unwrap_err();
    assert_eq!(err, TradeError::UnknownAccount);
}

#[test]
fn symbols_are_stored_uppercase() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);

    let record = ledger
        .record_trade(user_id, "aapl", 2, Direction::Buy, 150_00)
        .unwrap();
    assert_eq!(record.symbol, "AAPL");
    assert_eq!(ledger.position(user_id, "aapl"), 2);
}

#[test]
fn positions_sum_per_symbol_and_drop_closed_ones() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 100_000_00);

    ledger
        .record_trade(user_id, "MSFT", 3, Direction::Buy, 400_00)
        .unwrap();
    ledger
        .record_trade(user_id, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap();
    ledger
        .record_trade(user_id, "AAPL", 4, Direction::Sell, 150_00)
        .unwrap();
    ledger
        .record_trade(user_id, "MSFT", 3, Direction::Sell, 410_00)
        .unwrap();

    let positions = ledger.positions(user_id);
    assert_eq!(positions, vec![("AAPL".to_string(), 6)]);
    // The closed MSFT position is gone from the summary but not the log.
    assert_eq!(ledger.history(user_id).len(), 4);
}

#[test]
fn history_is_per_user_and_oldest_first() {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let mut ledger = Ledger::new();
    ledger.open_account(alice, 10_000_00);
    ledger.open_account(bob, 10_000_00);

    ledger
        .record_trade(alice, "AAPL", 1, Direction::Buy, 150_00)
        .unwrap();
    ledger
        .record_trade(bob, "TSLA", 2, Direction::Buy, 240_00)
        .unwrap();
    ledger
        .record_trade(alice, "AAPL", 1, Direction::Sell, 155_00)
        .unwrap();

    let history = ledger.history(alice);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].shares, 1);
    assert_eq!(history[1].shares, -1);
    assert!(history.iter().all(|r| r.user_id == alice));
}

#[test]
fn accounts_are_independent() {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let mut ledger = Ledger::new();
    ledger.open_account(alice, 10_000_00);
    ledger.open_account(bob, 50_00);

    ledger
        .record_trade(alice, "AAPL", 10, Direction::Buy, 150_00)
        .unwrap();

    assert_eq!(ledger.cash_balance(bob), Some(50_00));
    assert_eq!(ledger.position(bob, "AAPL"), 0);
    let err = ledger
        .record_trade(bob, "AAPL", 1, Direction::Sell, 150_00)
        .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares { .. }));
}

#[test]
fn open_account_is_idempotent() {
    let user_id = Uuid::new_v4();
    let mut ledger = funded_ledger(user_id, 10_000_00);
    ledger
        .record_trade(user_id, "AAPL", 1, Direction::Buy, 150_00)
        .unwrap();

    ledger.open_account(user_id, 10_000_00);
    assert_eq!(ledger.cash_balance(user_id), Some(8_500_00));
}

#[test]
fn refresh_display_cache_touches_only_matching_records() {
    let user_id = Uuid::new_v4();
    let other = Uuid::new_v4();
    let mut ledger = Ledger::new();
    ledger.open_account(user_id, 10_000_00);
    ledger.open_account(other, 10_000_00);

    ledger
        .record_trade(user_id, "AAPL", 2, Direction::Buy, 150_00)
        .unwrap();
    ledger
        .record_trade(user_id, "MSFT", 1, Direction::Buy, 400_00)
        .unwrap();
    ledger
        .record_trade(other, "AAPL", 1, Direction::Buy, 150_00)
        .unwrap();

    ledger.refresh_display_cache(user_id, "AAPL", "$160.00", "$320.00");

    let history = ledger.history(user_id);
    let aapl = history.iter().find(|r| r.symbol == "AAPL").unwrap();
    let msft = history.iter().find(|r| r.symbol == "MSFT").unwrap();
    assert_eq!(aapl.last_price.as_deref(), Some("$160.00"));
    assert_eq!(aapl.total_current_value.as_deref(), Some("$320.00"));
    assert_eq!(msft.last_price, None);

    let other_history = ledger.history(other);
    assert_eq!(other_history[0].last_price, None);
}
