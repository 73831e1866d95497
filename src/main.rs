//! Commodity ledger engine simulation.
//!
//! Drives the full lifecycle against an in-memory settlement rail: listing,
//! oracle pushes, token trading, leveraged positions, and a liquidation.

use commodity_core::*;

const OWNER: AccountId = AccountId(1);
const REPORTER: AccountId = AccountId(2);

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("Commodity Ledger Engine Simulation");
    println!("Synthetic Tokens, Leveraged Positions, Permissionless Liquidation\n");

    scenario_1_token_round_trip();
    scenario_2_position_lifecycle();
    scenario_3_price_move_and_pnl();
    scenario_4_liquidation();

    println!("\nAll simulations completed successfully.");
}

fn setup_engine() -> Engine {
    let mut engine = Engine::new(OWNER, Environment::Development.config())
        .expect("preset config is valid");

    engine
        .list_commodity(
            OWNER,
            CommodityId(1),
            CommodityParams {
                name: "Gold".to_string(),
                symbol: "XAU".to_string(),
                unit: "troy oz".to_string(),
                initial_price: Price::new_unchecked(2_000_000_000),
                volatility_bps: Bps(150),
                margin_requirement_bps: Bps(2_000),
                contract_size: Quantity(1),
            },
        )
        .expect("fresh registry accepts the listing");
    engine
        .register_feed(OWNER, CommodityId(1), REPORTER)
        .expect("commodity is listed");
    push_price(&mut engine, 2_000_000_000);
    engine
}

fn push_price(engine: &mut Engine, price: u64) {
    engine
        .record_price_update(
            REPORTER,
            CommodityId(1),
            Price::new_unchecked(price),
            Bps(9_500),
        )
        .expect("reporter is registered");
}

/// Buy tokens, watch the fee and truncation, sell them back.
fn scenario_1_token_round_trip() {
    println!("Scenario 1: Token Round Trip\n");

    let mut engine = setup_engine();
    let alice = AccountId(10);
    engine.bank_mut().credit_account(alice, Amount(10_000_000_000));

    let receipt = engine
        .buy_tokens(alice, CommodityId(1), Amount(5_000_000_000))
        .expect("funded buy succeeds");
    println!(
        "  Alice pays {} micro-units, fee {}, receives {} XAU tokens",
        receipt.paid, receipt.fee, receipt.tokens
    );

    let sale = engine
        .sell_tokens(alice, CommodityId(1), receipt.tokens)
        .expect("balance covers the sale");
    println!(
        "  Alice sells {} tokens back for {} net of {} fee\n",
        sale.tokens, sale.proceeds, sale.fee
    );
}

/// Open a long, close it at an unchanged price, get the margin back exactly.
fn scenario_2_position_lifecycle() {
    println!("Scenario 2: Position Lifecycle at Flat Price\n");

    let mut engine = setup_engine();
    let bob = AccountId(11);
    engine.bank_mut().credit_account(bob, Amount(10_000_000_000));

    let margin = engine
        .margin_requirement(CommodityId(1), Quantity(10))
        .expect("commodity listed");
    println!("  Required margin for 10 oz: {margin}");

    let position_id = engine
        .open_position(bob, CommodityId(1), Direction::Long, Quantity(10), Tick(500))
        .expect("funded open succeeds");
    let close = engine
        .close_position(position_id, bob)
        .expect("owner closes own position");
    println!(
        "  Flat close settles {} (pnl {})\n",
        close.settlement, close.pnl
    );
}

/// Price rallies; the long captures the move on close.
fn scenario_3_price_move_and_pnl() {
    println!("Scenario 3: Price Move and PnL\n");

    let mut engine = setup_engine();
    let carol = AccountId(12);
    engine.bank_mut().credit_account(carol, Amount(10_000_000_000));
    // profits are paid from custody, so the treasury seeds it
    engine.bank_mut().fund_custody(Amount(5_000_000_000));

    let position_id = engine
        .open_position(carol, CommodityId(1), Direction::Long, Quantity(10), Tick(500))
        .expect("funded open succeeds");

    push_price(&mut engine, 2_100_000_000);
    let pnl = engine.position_value(position_id).expect("position exists");
    println!("  Mark-to-market pnl after +5% move: {pnl}");

    let close = engine
        .close_position(position_id, carol)
        .expect("custody funded for the payout");
    println!("  Close settles {}\n", close.settlement);
}

/// A crash pushes losses past the threshold; a third party liquidates.
fn scenario_4_liquidation() {
    println!("Scenario 4: Permissionless Liquidation\n");

    let mut engine = setup_engine();
    let dave = AccountId(13);
    let keeper = AccountId(99);
    engine.bank_mut().credit_account(dave, Amount(10_000_000_000));

    let position_id = engine
        .open_position(dave, CommodityId(1), Direction::Long, Quantity(10), Tick(500))
        .expect("funded open succeeds");

    push_price(&mut engine, 1_650_000_000);
    let at_risk = engine.is_liquidatable(position_id).expect("position exists");
    println!("  After the crash, at risk: {at_risk}");

    let outcome = engine
        .liquidate_position(position_id, keeper)
        .expect("threshold breached");
    println!(
        "  Keeper {:?} liquidated position {:?}; margin {} retained, reserve now {}",
        outcome.liquidator,
        outcome.position_id,
        outcome.margin_retained,
        engine.insurance_reserve()
    );

    let stats = engine.commodity_stats(CommodityId(1));
    println!(
        "  Open interest {} | volume {}\n",
        stats.open_interest, stats.total_volume_24h
    );
}
