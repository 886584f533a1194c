//! Wager Engine Demo
//!
//! Runs a scripted session against the in-memory token and chain:
//! funding, a handful of bets, reveals and forfeits, and a treasury
//! withdrawal. Every event is printed as a JSON line.
//!
//! Configuration comes from `WAGER_*` environment variables; log level
//! from `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wager_engine::core::hash::hash_bytes;
use wager_engine::engine::guard;
use wager_engine::ledger::BetTicket;
use wager_engine::{
    Address, ChainView, EngineConfig, EngineError, InMemoryToken, SimulatedChain, TokenLedger,
    WagerEngine, REVEAL_WINDOW, VERSION,
};

type DemoEngine = WagerEngine<InMemoryToken, SimulatedChain>;

const POOL: Address = Address::from_low_u8(0xF0);
const OPERATOR: Address = Address::from_low_u8(0x01);
const TREASURY: Address = Address::from_low_u8(0x7E);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Wager Engine v{}", VERSION);

    let config = EngineConfig::from_env().context("loading engine config")?;
    info!(?config, "Config loaded");

    let mut engine = setup(config)?;
    play_session(&mut engine)?;
    withdraw(&mut engine)?;

    let stats = serde_json::to_string(&engine.pool_stats())?;
    info!(%stats, "Session complete");
    Ok(())
}

/// Mint balances and approvals, then build the engine and fund the pool.
fn setup(config: EngineConfig) -> Result<DemoEngine> {
    let mut token = InMemoryToken::new();
    token.mint(&OPERATOR, 50_000_000)?;
    token.approve(&OPERATOR, &POOL, u128::MAX);
    for tag in 0xA0..0xA4u8 {
        let bettor = Address::from_low_u8(tag);
        token.mint(&bettor, 5_000_000)?;
        token.approve(&bettor, &POOL, u128::MAX);
    }

    let genesis = Utc::now().timestamp().max(0) as u64;
    let chain = SimulatedChain::new(hash_bytes(b"demo chain"), genesis);
    let mut engine = WagerEngine::new(POOL, OPERATOR, token, chain, config)?;

    engine.fund(OPERATOR, 20_000_000)?;
    engine.chain_mut().advance(1);

    flush_events(&mut engine)?;
    Ok(engine)
}

/// Deterministic ticket for the demo; real clients draw secrets from a CSPRNG.
fn demo_ticket(bettor: Address, round: u32) -> BetTicket {
    let mut seed = bettor.as_bytes().to_vec();
    seed.extend_from_slice(&round.to_le_bytes());
    let secret = hash_bytes(&seed);
    seed.push(0xFF);
    BetTicket::new(secret, hash_bytes(&seed))
}

fn play_session(engine: &mut DemoEngine) -> Result<()> {
    let shapes: [(u128, u32, u8); 4] =
        [(1_000, 2, 5), (10_000, 16, 3), (500, 1024, 20), (100_000, 4, 1)];

    for round in 0..3u32 {
        info!(round, "=== Round ===");
        let mut receipts = Vec::new();

        for (i, (stake, multiplier, rolls)) in shapes.iter().copied().enumerate() {
            let bettor = Address::from_low_u8(0xA0 + i as u8);
            let ticket = demo_ticket(bettor, round);
            let preview = engine.preview_payout(stake, multiplier, rolls)?;
            info!(%bettor, stake, multiplier, rolls, worst_case = preview.worst_case, "Committing");

            match engine.commit(bettor, ticket.commitment(), stake, multiplier, rolls) {
                Ok(index) => {
                    let position = engine.chain().position();
                    receipts.push((bettor, ticket.into_receipt(index, position)));
                }
                Err(err @ EngineError::InsufficientCapacity { .. }) => {
                    let best = engine.max_affordable_multiplier(stake, rolls)?;
                    warn!(%bettor, %err, ?best, "Bet too large for pool");
                }
                Err(err) => return Err(err.into()),
            }
        }

        engine.chain_mut().advance(3);

        for (bettor, receipt) in receipts {
            let ticket = &receipt.ticket;
            match engine.reveal(bettor, receipt.bet_index, &ticket.secret, &ticket.salt) {
                Ok(outcome) => {
                    info!(%bettor, wins = outcome.wins, net = outcome.net_payout, "Winner");
                }
                Err(EngineError::NoWinningRoll { index }) => {
                    engine.forfeit(bettor, index)?;
                    info!(%bettor, index, "Lost, forfeited");
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            balance = engine.pool_balance(),
            reserved = engine.reserved_liability(),
            "Pool after round"
        );
        flush_events(engine)?;
    }

    // One bet left open past its window to show the stale reservation
    let bettor = Address::from_low_u8(0xA0);
    let ticket = demo_ticket(bettor, 99);
    let index = engine.commit(bettor, ticket.commitment(), 1_000, 8, 2)?;
    engine.chain_mut().advance(REVEAL_WINDOW + 1);
    if let Some(view) = engine.get_bet(&bettor, index) {
        let reserved = engine.reserved_liability();
        warn!(index, status = ?view.status, reserved, "Unrevealed bet");
    }
    let released = engine.forfeit(bettor, index)?;
    info!(index, released, "Expired bet forfeited");

    let per_win = guard::payout_per_win(10_000, 1024)?;
    info!(per_win, "Reference payout 10,000 @ 1024x");
    flush_events(engine)?;
    Ok(())
}

fn withdraw(engine: &mut DemoEngine) -> Result<()> {
    let ready_at = engine.request_withdraw(OPERATOR, TREASURY)?;
    let ready = DateTime::<Utc>::from_timestamp(ready_at as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ready_at.to_string());
    info!(%ready, "Withdrawal requested");

    if let Err(err) = engine.execute_withdraw(OPERATOR) {
        info!(%err, "Execution refused during cooldown");
    }

    let cooldown = engine.config().withdraw_cooldown_secs;
    engine.chain_mut().advance_time(cooldown);

    let status = engine.withdrawal_status();
    info!(phase = ?status.phase, withdrawable = status.withdrawable, "Cooldown elapsed");

    let sent = engine.execute_withdraw(OPERATOR)?;
    info!(
        sent,
        treasury = engine.token().balance_of(&TREASURY),
        remaining = engine.pool_balance(),
        paused = engine.is_paused(),
        "Withdrawal executed"
    );

    flush_events(engine)?;
    Ok(())
}

fn flush_events(engine: &mut DemoEngine) -> Result<()> {
    for event in engine.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
