//! Walk-forward simulator.
//!
//! Replays each planned order against the realized bar for its date:
//! enter at the open, exit at the stop if the day's low touches it,
//! otherwise at the close. Brokerage is charged on both legs. The running
//! balance is a strict left fold over days in ascending date order.

use super::equity::EquityCurve;
use super::error::RiskplanError;
use super::ohlcv::Bar;
use super::order_plan::OrderRecord;
use super::sizing::Signal;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Fraction of turnover charged per leg (0.0005 = 0.05%).
    pub brokerage_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_capital: 100_000.0,
            brokerage_rate: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopHit,
    CloseExit,
    NoTrade,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopHit => write!(f, "STOP_HIT"),
            ExitReason::CloseExit => write!(f, "CLOSE_EXIT"),
            ExitReason::NoTrade => write!(f, "NO_TRADE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationDay {
    pub date: NaiveDate,
    pub signal: Signal,
    pub qty: u64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
    pub balance_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub initial_capital: f64,
    pub days: Vec<SimulationDay>,
    pub equity_curve: EquityCurve,
}

impl SimulationResult {
    pub fn pnl_series(&self) -> impl Iterator<Item = f64> + '_ {
        self.days.iter().map(|d| d.pnl)
    }
}

pub fn brokerage(entry_price: f64, exit_price: f64, qty: u64, rate: f64) -> f64 {
    let qty = qty as f64;
    (entry_price * qty + exit_price * qty) * rate
}

/// Settle one order against its realized bar.
pub fn simulate_day(
    order: &OrderRecord,
    bar: &Bar,
    balance_before: f64,
    config: &SimulationConfig,
) -> SimulationDay {
    if !order.is_trade() {
        return SimulationDay {
            date: order.date,
            signal: order.signal,
            qty: order.qty,
            entry_price: 0.0,
            stop_loss: order.stop_loss,
            exit_price: 0.0,
            exit_reason: ExitReason::NoTrade,
            pnl: 0.0,
            balance_after: balance_before,
        };
    }

    let entry_price = bar.open;
    // Stop fills at the stop price; gap-through is not modelled.
    let (exit_price, exit_reason) = if bar.low <= order.stop_loss {
        (order.stop_loss, ExitReason::StopHit)
    } else {
        (bar.close, ExitReason::CloseExit)
    };

    let gross = (exit_price - entry_price) * order.qty as f64;
    let costs = brokerage(entry_price, exit_price, order.qty, config.brokerage_rate);
    let pnl = gross - costs;

    SimulationDay {
        date: order.date,
        signal: order.signal,
        qty: order.qty,
        entry_price,
        stop_loss: order.stop_loss,
        exit_price,
        exit_reason,
        pnl,
        balance_after: balance_before + pnl,
    }
}

/// Lazy fold over joined (order, bar) pairs. The running balance is owned
/// by the iterator and advanced once per yielded day.
#[derive(Debug, Clone)]
pub struct WalkForward<'a, I> {
    pairs: I,
    balance: f64,
    config: &'a SimulationConfig,
}

impl<'a, I> WalkForward<'a, I>
where
    I: Iterator<Item = (&'a OrderRecord, &'a Bar)>,
{
    pub fn new(pairs: I, config: &'a SimulationConfig) -> Self {
        WalkForward {
            pairs,
            balance: config.initial_capital,
            config,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }
}

impl<'a, I> Iterator for WalkForward<'a, I>
where
    I: Iterator<Item = (&'a OrderRecord, &'a Bar)>,
{
    type Item = SimulationDay;

    fn next(&mut self) -> Option<Self::Item> {
        let (order, bar) = self.pairs.next()?;
        let day = simulate_day(order, bar, self.balance, self.config);
        self.balance = day.balance_after;
        Some(day)
    }
}

/// Inner join of orders to bars on date, ascending by date. Orders with no
/// realized bar are dropped.
pub fn join_orders<'a>(orders: &'a [OrderRecord], bars: &'a [Bar]) -> Vec<(&'a OrderRecord, &'a Bar)> {
    let by_date: HashMap<NaiveDate, &Bar> = bars.iter().map(|b| (b.date, b)).collect();

    let mut joined: Vec<(&OrderRecord, &Bar)> = Vec::with_capacity(orders.len());
    for order in orders {
        match by_date.get(&order.date) {
            Some(bar) => joined.push((order, *bar)),
            None => tracing::warn!(date = %order.date, "no realized bar for order, dropping"),
        }
    }
    joined.sort_by_key(|(o, _)| o.date);
    joined
}

pub fn run_simulation(
    orders: &[OrderRecord],
    bars: &[Bar],
    config: &SimulationConfig,
) -> Result<SimulationResult, RiskplanError> {
    if orders.is_empty() {
        return Err(RiskplanError::missing("orders", "order plan has no rows"));
    }
    if bars.is_empty() {
        return Err(RiskplanError::missing("bars", "bar history has no rows"));
    }

    let joined = join_orders(orders, bars);
    let Some((first, _)) = joined.first() else {
        return Err(RiskplanError::EmptyJoin {
            left: "orders".into(),
            left_rows: orders.len(),
            right: "bars".into(),
            right_rows: bars.len(),
        });
    };

    tracing::info!(days = joined.len(), "simulating trading days");

    let start = first.date.pred_opt().unwrap_or(first.date);
    let mut equity_curve = EquityCurve::new(start, config.initial_capital);
    let days: Vec<SimulationDay> = WalkForward::new(joined.into_iter(), config)
        .inspect(|day| equity_curve.record(day.date, day.balance_after))
        .collect();

    Ok(SimulationResult {
        initial_capital: config.initial_capital,
        days,
        equity_curve,
    })
}
