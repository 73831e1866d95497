//! End-to-end scenarios over the public engine API: exact arithmetic
//! expectations, precondition gating, and terminal-state behavior.

use commodity_core::*;

const OWNER: AccountId = AccountId(1);
const REPORTER: AccountId = AccountId(2);
const ALICE: AccountId = AccountId(10);
const BOB: AccountId = AccountId(11);
const GOLD: CommodityId = CommodityId(1);

fn gold_params(initial_price: u64, margin_bps: u32) -> CommodityParams {
    CommodityParams {
        name: "Gold".to_string(),
        symbol: "XAU".to_string(),
        unit: "troy oz".to_string(),
        initial_price: Price::new_unchecked(initial_price),
        volatility_bps: Bps(150),
        margin_requirement_bps: Bps(margin_bps),
        contract_size: Quantity(1),
    }
}

/// Engine with one listed commodity, a live feed, funded traders, and a
/// funded custody so profitable closes can pay out.
fn setup(initial_price: u64, margin_bps: u32) -> Engine {
    let mut config = Environment::Development.config();
    config.fee_rate_bps = Bps(50);
    config.liquidation_threshold_bps = Bps(8_000);
    config.oracle_validity_window = 100;
    let mut engine = Engine::new(OWNER, config).unwrap();

    engine
        .list_commodity(OWNER, GOLD, gold_params(initial_price, margin_bps))
        .unwrap();
    engine.register_feed(OWNER, GOLD, REPORTER).unwrap();
    push_price(&mut engine, initial_price);

    engine.bank_mut().credit_account(ALICE, Amount(1_000_000_000_000));
    engine.bank_mut().credit_account(BOB, Amount(1_000_000_000_000));
    engine.bank_mut().fund_custody(Amount(1_000_000_000_000));
    engine
}

fn push_price(engine: &mut Engine, price: u64) {
    engine
        .record_price_update(REPORTER, GOLD, Price::new_unchecked(price), Bps(9_500))
        .unwrap();
}

// ---- exact arithmetic scenarios ----

#[test]
fn required_margin_is_bps_fraction_of_notional() {
    // price 2e9, margin rate 2000bps, quantity 10
    // 10 * 2_000_000_000 * 2000 / 10000 = 4_000_000_000
    let engine = setup(2_000_000_000, 2_000);
    let margin = engine.margin_requirement(GOLD, Quantity(10)).unwrap();
    assert_eq!(margin, Amount(4_000_000_000));
}

#[test]
fn long_close_settles_margin_plus_profit() {
    let mut engine = setup(2_000_000_000, 2_000);

    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(1_000))
        .unwrap();
    assert_eq!(
        engine.position(position_id).unwrap().margin_deposited,
        Amount(4_000_000_000)
    );

    push_price(&mut engine, 2_100_000_000);
    // pnl = 10 * (2_100_000_000 - 2_000_000_000) = 1_000_000_000
    assert_eq!(engine.position_value(position_id).unwrap(), 1_000_000_000);

    let close = engine.close_position(position_id, ALICE).unwrap();
    // settlement = 4_000_000_000 + 1_000_000_000
    assert_eq!(close.settlement, Amount(5_000_000_000));
    assert_eq!(close.pnl, 1_000_000_000);
}

#[test]
fn short_gains_when_price_drops() {
    let mut engine = setup(2_000_000_000, 2_000);

    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Short, Quantity(5), Tick(1_000))
        .unwrap();

    push_price(&mut engine, 1_900_000_000);
    // pnl = 5 * (2_000_000_000 - 1_900_000_000) = 500_000_000
    assert_eq!(engine.position_value(position_id).unwrap(), 500_000_000);
}

#[test]
fn tiny_buy_truncates_to_zero_tokens() {
    // 1e9 at price 1e9 with 50bps fee: fee 5e6, net 995e6, tokens floor to 0
    let mut engine = setup(1_000_000_000, 2_000);

    let balance_before = engine.bank().account_balance(ALICE);
    let receipt = engine
        .buy_tokens(ALICE, GOLD, Amount(1_000_000_000))
        .unwrap();

    assert_eq!(receipt.fee, Amount(5_000_000));
    assert_eq!(receipt.tokens, Quantity(0));
    assert_eq!(engine.token_balance(ALICE, GOLD), Quantity(0));
    // the payment still moved: truncation is the contract
    assert_eq!(
        engine.bank().account_balance(ALICE),
        balance_before.checked_sub(Amount(1_000_000_000)).unwrap()
    );
}

#[test]
fn round_trip_flat_close_refunds_margin_exactly() {
    let mut engine = setup(2_000_000_000, 2_000);

    let locked_before = engine
        .account_ledger(ALICE, GOLD)
        .map(|l| l.margin_locked)
        .unwrap_or(Amount::ZERO);
    let balance_before = engine.bank().account_balance(ALICE);

    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(1_000))
        .unwrap();
    let close = engine.close_position(position_id, ALICE).unwrap();

    assert_eq!(close.pnl, 0);
    assert_eq!(close.settlement, Amount(4_000_000_000));
    assert_eq!(engine.bank().account_balance(ALICE), balance_before);
    assert_eq!(
        engine.account_ledger(ALICE, GOLD).unwrap().margin_locked,
        locked_before
    );
}

// ---- token trading ----

#[test]
fn buy_and_sell_tokens_with_fees() {
    let mut engine = setup(2_000_000_000, 2_000);

    // 5e9 pay: fee 25e6, net 4_975e6, tokens = 2
    let receipt = engine
        .buy_tokens(ALICE, GOLD, Amount(5_000_000_000))
        .unwrap();
    assert_eq!(receipt.fee, Amount(25_000_000));
    assert_eq!(receipt.tokens, Quantity(2));
    assert_eq!(engine.token_balance(ALICE, GOLD), Quantity(2));

    let supply = engine.token_supply(GOLD);
    assert_eq!(supply.total_minted, 2);
    assert_eq!(supply.outstanding(), 2);

    // sell 2 tokens: value 4e9, fee 20e6, proceeds 3_980e6
    let sale = engine.sell_tokens(ALICE, GOLD, Quantity(2)).unwrap();
    assert_eq!(sale.fee, Amount(20_000_000));
    assert_eq!(sale.proceeds, Amount(3_980_000_000));
    assert_eq!(engine.token_balance(ALICE, GOLD), Quantity(0));
    assert_eq!(engine.token_supply(GOLD).outstanding(), 0);
}

#[test]
fn sell_more_than_balance_fails_cleanly() {
    let mut engine = setup(2_000_000_000, 2_000);
    engine.buy_tokens(ALICE, GOLD, Amount(5_000_000_000)).unwrap();

    let supply_before = engine.token_supply(GOLD);
    let result = engine.sell_tokens(ALICE, GOLD, Quantity(3));
    assert!(matches!(result, Err(EngineError::Token(_))));

    // nothing moved
    assert_eq!(engine.token_balance(ALICE, GOLD), Quantity(2));
    assert_eq!(
        engine.token_supply(GOLD).total_burned,
        supply_before.total_burned
    );
}

#[test]
fn token_transfer_moves_exposure_between_holders() {
    let mut engine = setup(2_000_000_000, 2_000);
    engine.buy_tokens(ALICE, GOLD, Amount(5_000_000_000)).unwrap();

    engine.transfer_tokens(ALICE, BOB, GOLD, Quantity(1)).unwrap();
    assert_eq!(engine.token_balance(ALICE, GOLD), Quantity(1));
    assert_eq!(engine.token_balance(BOB, GOLD), Quantity(1));
    assert_eq!(engine.token_supply(GOLD).outstanding(), 2);
}

// ---- precondition gating ----

#[test]
fn stale_oracle_blocks_every_price_dependent_operation() {
    let mut engine = setup(2_000_000_000, 2_000);
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(10_000))
        .unwrap();

    // past the validity window, the stored price still looks plausible but
    // nothing price-dependent may run
    engine.advance_tick(101);

    assert!(matches!(
        engine.buy_tokens(ALICE, GOLD, Amount(1_000_000_000)),
        Err(EngineError::OracleStale(_))
    ));
    assert!(matches!(
        engine.sell_tokens(ALICE, GOLD, Quantity(1)),
        Err(EngineError::OracleStale(_))
    ));
    assert!(matches!(
        engine.open_position(ALICE, GOLD, Direction::Long, Quantity(1), Tick(10_000)),
        Err(EngineError::OracleStale(_))
    ));
    assert!(matches!(
        engine.close_position(position_id, ALICE),
        Err(EngineError::OracleStale(_))
    ));

    // a fresh push reopens the path
    push_price(&mut engine, 2_000_000_000);
    assert!(engine.close_position(position_id, ALICE).is_ok());
}

#[test]
fn market_closed_blocks_trading() {
    let mut engine = setup(2_000_000_000, 2_000);
    engine.set_market_open(OWNER, false).unwrap();

    assert!(matches!(
        engine.buy_tokens(ALICE, GOLD, Amount(1_000_000_000)),
        Err(EngineError::MarketClosed)
    ));
    assert!(matches!(
        engine.open_position(ALICE, GOLD, Direction::Long, Quantity(1), Tick(1_000)),
        Err(EngineError::MarketClosed)
    ));
}

#[test]
fn inactive_commodity_rejected() {
    let mut engine = setup(2_000_000_000, 2_000);
    engine.set_commodity_active(OWNER, GOLD, false).unwrap();

    assert!(matches!(
        engine.buy_tokens(ALICE, GOLD, Amount(1_000_000_000)),
        Err(EngineError::InvalidCommodity(_))
    ));
    assert!(matches!(
        engine.open_position(ALICE, GOLD, Direction::Short, Quantity(1), Tick(1_000)),
        Err(EngineError::InvalidCommodity(_))
    ));
}

#[test]
fn zero_amounts_rejected() {
    let mut engine = setup(2_000_000_000, 2_000);

    assert!(matches!(
        engine.buy_tokens(ALICE, GOLD, Amount::ZERO),
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.open_position(ALICE, GOLD, Direction::Long, Quantity::ZERO, Tick(1_000)),
        Err(EngineError::InvalidAmount(_))
    ));
    // expiry must be in the future
    engine.set_tick(Tick(50));
    push_price(&mut engine, 2_000_000_000);
    assert!(matches!(
        engine.open_position(ALICE, GOLD, Direction::Long, Quantity(1), Tick(50)),
        Err(EngineError::InvalidAmount(_))
    ));
}

#[test]
fn failed_open_leaves_no_partial_state() {
    let mut engine = setup(2_000_000_000, 2_000);
    let pauper = AccountId(77);

    let result = engine.open_position(pauper, GOLD, Direction::Long, Quantity(10), Tick(1_000));
    assert!(matches!(result, Err(EngineError::Settlement(_))));

    assert!(engine.account_ledger(pauper, GOLD).is_none());
    let stats = engine.commodity_stats(GOLD);
    assert_eq!(stats.open_interest, 0);
    assert_eq!(stats.total_volume_24h, 0);
}

// ---- terminal-state behavior ----

#[test]
fn closed_position_is_immutable_and_terminal() {
    let mut engine = setup(2_000_000_000, 2_000);
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(1_000))
        .unwrap();
    engine.close_position(position_id, ALICE).unwrap();

    let snapshot = engine.position(position_id).unwrap().clone();
    assert!(snapshot.liquidated);

    assert!(matches!(
        engine.close_position(position_id, ALICE),
        Err(EngineError::AlreadyTerminal(_))
    ));
    assert!(matches!(
        engine.liquidate_position(position_id, BOB),
        Err(EngineError::AlreadyTerminal(_))
    ));

    // record untouched by the failed attempts
    let after = engine.position(position_id).unwrap();
    assert_eq!(after.quantity, snapshot.quantity);
    assert_eq!(after.entry_price, snapshot.entry_price);
    assert_eq!(after.direction, snapshot.direction);
    assert!(after.liquidated);
}

#[test]
fn only_the_owner_closes() {
    let mut engine = setup(2_000_000_000, 2_000);
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(1_000))
        .unwrap();

    assert!(matches!(
        engine.close_position(position_id, BOB),
        Err(EngineError::Unauthorized(_))
    ));
    // but anyone may liquidate once at risk
    push_price(&mut engine, 1_600_000_000);
    assert!(engine.liquidate_position(position_id, BOB).is_ok());
}

#[test]
fn losses_capped_at_deposited_margin() {
    let mut engine = setup(2_000_000_000, 2_000);
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(10), Tick(1_000))
        .unwrap();
    let balance_after_open = engine.bank().account_balance(ALICE);

    // loss 5e9 exceeds the 4e9 margin; the engine raises the threshold so a
    // close is still the owner's move here
    engine.set_liquidation_threshold(OWNER, Bps(9_500)).unwrap();
    push_price(&mut engine, 1_500_000_000);

    let close = engine.close_position(position_id, ALICE).unwrap();
    assert_eq!(close.pnl, -5_000_000_000);
    assert_eq!(close.settlement, Amount::ZERO);
    // no payout, and no clawback beyond the margin already custodied
    assert_eq!(engine.bank().account_balance(ALICE), balance_after_open);

    let ledger = engine.account_ledger(ALICE, GOLD).unwrap();
    assert_eq!(ledger.realized_pnl, -5_000_000_000);
    assert_eq!(ledger.margin_locked, Amount::ZERO);
}

// ---- oracle and administration ----

#[test]
fn unauthorized_reporter_rejected() {
    let mut engine = setup(2_000_000_000, 2_000);
    let result = engine.record_price_update(
        BOB,
        GOLD,
        Price::new_unchecked(2_100_000_000),
        Bps(9_500),
    );
    assert!(matches!(
        result,
        Err(EngineError::Oracle(OracleError::UnauthorizedReporter { .. }))
    ));
}

#[test]
fn low_confidence_push_rejected() {
    let mut engine = setup(2_000_000_000, 2_000);
    let result = engine.record_price_update(
        REPORTER,
        GOLD,
        Price::new_unchecked(2_100_000_000),
        Bps(7_999),
    );
    assert!(matches!(
        result,
        Err(EngineError::Oracle(OracleError::LowConfidence { .. }))
    ));
    // stored price untouched
    assert_eq!(
        engine.oracle_feed(GOLD).unwrap().last_price.value(),
        2_000_000_000
    );
}

#[test]
fn price_push_refreshes_registry_and_change_bps() {
    let mut engine = setup(2_000_000_000, 2_000);
    let prior = engine
        .record_price_update(REPORTER, GOLD, Price::new_unchecked(2_100_000_000), Bps(9_500))
        .unwrap();
    assert_eq!(prior.value(), 2_000_000_000);

    let gold = engine.commodity(GOLD).unwrap();
    assert_eq!(gold.price.value(), 2_100_000_000);
    assert_eq!(gold.daily_change_bps, SignedBps(500));
}

#[test]
fn admin_setters_are_owner_gated_and_bounded() {
    let mut engine = setup(2_000_000_000, 2_000);

    assert!(matches!(
        engine.set_fee_rate(ALICE, Bps(10)),
        Err(EngineError::Unauthorized(_))
    ));
    assert!(matches!(
        engine.set_market_open(ALICE, false),
        Err(EngineError::Unauthorized(_))
    ));

    // fee capped at 5%
    assert!(matches!(
        engine.set_fee_rate(OWNER, Bps(501)),
        Err(EngineError::Config(_))
    ));
    engine.set_fee_rate(OWNER, Bps(500)).unwrap();
    assert_eq!(engine.fee_rate(), Bps(500));

    // liquidation threshold banded [5000, 9500]
    assert!(engine.set_liquidation_threshold(OWNER, Bps(4_999)).is_err());
    assert!(engine.set_liquidation_threshold(OWNER, Bps(9_501)).is_err());
    engine.set_liquidation_threshold(OWNER, Bps(5_000)).unwrap();
    assert_eq!(engine.liquidation_threshold(), Bps(5_000));
}

#[test]
fn every_operation_leaves_an_audit_event() {
    let mut engine = setup(2_000_000_000, 2_000);
    let before = engine.events().len();

    engine.buy_tokens(ALICE, GOLD, Amount(5_000_000_000)).unwrap();
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Long, Quantity(1), Tick(1_000))
        .unwrap();
    engine.close_position(position_id, ALICE).unwrap();

    let tail = &engine.events()[before..];
    assert_eq!(tail.len(), 3);
    assert!(matches!(tail[0].payload, EventPayload::TokensPurchased(_)));
    assert!(matches!(tail[1].payload, EventPayload::PositionOpened(_)));
    assert!(matches!(tail[2].payload, EventPayload::PositionClosed(_)));
    // ids are strictly increasing
    assert!(tail[0].id < tail[1].id && tail[1].id < tail[2].id);
}

#[test]
fn position_snapshot_survives_serde_round_trip() {
    let mut engine = setup(2_000_000_000, 2_000);
    let position_id = engine
        .open_position(ALICE, GOLD, Direction::Short, Quantity(3), Tick(1_000))
        .unwrap();

    let position = engine.position(position_id).unwrap();
    let json = serde_json::to_string(position).unwrap();
    let decoded: Position = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded.id, position.id);
    assert_eq!(decoded.quantity, position.quantity);
    assert_eq!(decoded.entry_price, position.entry_price);
    assert_eq!(decoded.direction, position.direction);
}
