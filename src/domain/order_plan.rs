//! Order plan builder: one order per forecast, sized from the last
//! completed bar strictly before the forecast date.

use super::forecast::Forecast;
use super::ohlcv::Bar;
use super::sizing::{size_position, Signal, SizingConfig};
use super::volatility::{compute_volatility, VolatilityConfig, VolatilityPoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub signal: Signal,
    pub qty: u64,
    pub stop_loss: f64,
    pub approx_entry: f64,
}

impl OrderRecord {
    pub fn is_trade(&self) -> bool {
        self.signal == Signal::Buy && self.qty > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanConfig {
    pub volatility: VolatilityConfig,
    pub sizing: SizingConfig,
}

/// Bars plus their trailing ATR, ready to answer "what did we know before D".
#[derive(Debug, Clone)]
pub struct OrderPlanBuilder<'a> {
    bars: &'a [Bar],
    volatility: Vec<VolatilityPoint>,
    sizing: SizingConfig,
}

impl<'a> OrderPlanBuilder<'a> {
    /// `bars` must be ascending and unique by date (see `normalize_bars`).
    pub fn new(bars: &'a [Bar], config: &PlanConfig) -> Self {
        debug_assert!(
            bars.windows(2).all(|w| w[0].date < w[1].date),
            "bars must be ascending and unique by date"
        );
        OrderPlanBuilder {
            bars,
            volatility: compute_volatility(bars, &config.volatility),
            sizing: config.sizing.clone(),
        }
    }

    /// Index of the latest bar dated strictly before `date`.
    fn predecessor(&self, date: NaiveDate) -> Option<usize> {
        self.bars
            .partition_point(|b| b.date < date)
            .checked_sub(1)
    }

    /// Order for a single forecast, or `None` when no earlier bar exists.
    pub fn order_for(&self, forecast: &Forecast) -> Option<OrderRecord> {
        let Some(idx) = self.predecessor(forecast.date) else {
            tracing::debug!(date = %forecast.date, "no bar before forecast date, skipping");
            return None;
        };
        let entry = self.bars[idx].close;
        let atr = self.volatility[idx].atr;
        let sizing = size_position(forecast.direction, entry, atr, &self.sizing);

        Some(OrderRecord {
            date: forecast.date,
            signal: sizing.signal,
            qty: sizing.qty,
            stop_loss: sizing.stop_loss,
            approx_entry: sizing.approx_entry,
        })
    }

    /// Lazily yields one order per eligible forecast, in forecast order.
    pub fn plan<'f>(&'f self, forecasts: &'f [Forecast]) -> impl Iterator<Item = OrderRecord> + 'f {
        forecasts.iter().filter_map(move |f| self.order_for(f))
    }
}

pub fn build_order_plan(forecasts: &[Forecast], bars: &[Bar], config: &PlanConfig) -> Vec<OrderRecord> {
    let builder = OrderPlanBuilder::new(bars, config);
    let orders: Vec<OrderRecord> = builder.plan(forecasts).collect();
    tracing::info!(
        forecasts = forecasts.len(),
        orders = orders.len(),
        trades = orders.iter().filter(|o| o.is_trade()).count(),
        "order plan built"
    );
    orders
}
