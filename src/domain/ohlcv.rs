//! Daily OHLC bar representation.

use super::error::RiskplanError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Bar {
            date,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// max(|high - low|, |high - prev_close|, |low - prev_close|).
    /// Without a prior close only the bar's own range counts.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = (self.high - self.low).abs();
        match prev_close {
            Some(pc) => {
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }

    /// ((close - low) - (high - close)) / (high - low), in [-1, 1].
    /// A zero-range bar has no location and yields 0.
    pub fn close_location_value(&self) -> f64 {
        let range = self.high - self.low;
        if range == 0.0 {
            return 0.0;
        }
        ((self.close - self.low) - (self.high - self.close)) / range
    }

    pub fn validate(&self) -> Result<(), RiskplanError> {
        let invalid = |reason: &str| RiskplanError::InvalidBar {
            date: self.date,
            reason: reason.to_string(),
        };

        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(&format!("{name} must be a positive number")));
            }
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(invalid("high is below open, close or low"));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(invalid("low is above open, close or high"));
        }
        Ok(())
    }
}

/// Validate, sort ascending and de-duplicate by date. When a date appears
/// more than once the last occurrence in input order is kept.
pub fn normalize_bars(bars: Vec<Bar>) -> Result<Vec<Bar>, RiskplanError> {
    let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    for bar in bars {
        bar.validate()?;
        if by_date.insert(bar.date, bar).is_some() {
            tracing::debug!("duplicate bar date, keeping latest row");
        }
    }
    Ok(by_date.into_values().collect())
}
