#![allow(dead_code)]

use chrono::NaiveDate;
use riskplan::domain::error::RiskplanError;
pub use riskplan::domain::forecast::{Direction, Forecast};
pub use riskplan::domain::ohlcv::Bar;
use riskplan::domain::order_plan::OrderRecord;
use riskplan::ports::data_port::DataPort;

/// In-memory tables; `None` models an absent table.
pub struct MockDataPort {
    pub bars: Option<Vec<Bar>>,
    pub forecasts: Option<Vec<Forecast>>,
    pub orders: Option<Vec<OrderRecord>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: None,
            forecasts: None,
            orders: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        self.bars = Some(bars);
        self
    }

    pub fn with_forecasts(mut self, forecasts: Vec<Forecast>) -> Self {
        self.forecasts = Some(forecasts);
        self
    }

    pub fn with_orders(mut self, orders: Vec<OrderRecord>) -> Self {
        self.orders = Some(orders);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, RiskplanError> {
        self.bars
            .clone()
            .ok_or_else(|| RiskplanError::missing("bars", "not provided"))
    }

    fn fetch_forecasts(&self) -> Result<Vec<Forecast>, RiskplanError> {
        self.forecasts
            .clone()
            .ok_or_else(|| RiskplanError::missing("forecasts", "not provided"))
    }

    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, RiskplanError> {
        self.orders
            .clone()
            .ok_or_else(|| RiskplanError::missing("orders", "not provided"))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open,
        high,
        low,
        close,
    )
}

/// Steadily rising bars: open = start + i, range ±1 around the close.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let px = start_price + i as f64;
            Bar::new(
                start + chrono::Duration::days(i as i64),
                px,
                px + 1.5,
                px - 1.0,
                px + 0.5,
            )
        })
        .collect()
}

pub fn forecasts_for(bars: &[Bar], skip: usize, direction: Direction) -> Vec<Forecast> {
    bars.iter()
        .skip(skip)
        .map(|b| Forecast::new(b.date, direction))
        .collect()
}
