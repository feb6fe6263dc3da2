//! Fixed-fractional, volatility-adjusted position sizing.
//!
//! stop_loss      = entry - atr * atr_multiplier
//! risk_per_share = entry - stop_loss
//! qty            = min(floor(capital * risk_fraction / risk_per_share),
//!                      floor(capital / entry))

use super::forecast::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Wait,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Wait => write!(f, "WAIT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingConfig {
    pub capital: f64,
    pub risk_fraction: f64,
    pub atr_multiplier: f64,
    /// Decimal places the emitted stop is rounded to; `None` keeps full precision.
    pub stop_loss_decimals: Option<u32>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            capital: 100_000.0,
            risk_fraction: 0.02,
            atr_multiplier: 1.5,
            stop_loss_decimals: Some(2),
        }
    }
}

/// Result of sizing a single forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    pub signal: Signal,
    pub qty: u64,
    pub stop_loss: f64,
    pub approx_entry: f64,
}

impl Sizing {
    pub fn wait() -> Self {
        Sizing {
            signal: Signal::Wait,
            qty: 0,
            stop_loss: 0.0,
            approx_entry: 0.0,
        }
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Largest whole-share quantity whose notional fits in `capital`.
pub fn max_affordable(capital: f64, entry: f64) -> u64 {
    if entry > 0.0 && capital > 0.0 {
        (capital / entry).floor() as u64
    } else {
        0
    }
}

pub fn size_position(
    direction: Direction,
    entry_price_estimate: f64,
    atr: f64,
    config: &SizingConfig,
) -> Sizing {
    if direction == Direction::Down {
        return Sizing::wait();
    }

    let entry = entry_price_estimate;
    let stop_loss = entry - atr * config.atr_multiplier;
    let risk_per_share = entry - stop_loss;

    // Negated comparison so NaN falls through to the degenerate branch.
    let qty = if !(risk_per_share > 0.0) || !(entry > 0.0) {
        tracing::warn!(
            entry,
            atr,
            risk_per_share,
            "degenerate sizing: non-positive risk per share, emitting zero quantity"
        );
        0
    } else {
        let risk_budget = config.capital * config.risk_fraction;
        let by_risk = (risk_budget / risk_per_share).floor();
        let by_risk = if by_risk.is_finite() && by_risk > 0.0 {
            by_risk as u64
        } else {
            0
        };
        by_risk.min(max_affordable(config.capital, entry))
    };

    let stop_loss = match config.stop_loss_decimals {
        Some(d) => round_to(stop_loss, d),
        None => stop_loss,
    };

    Sizing {
        signal: Signal::Buy,
        qty,
        stop_loss,
        approx_entry: entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn down_forecast_waits() {
        let s = size_position(Direction::Down, 100.0, 2.0, &SizingConfig::default());
        assert_eq!(s, Sizing::wait());
    }

    #[test]
    fn risk_based_quantity() {
        let s = size_position(Direction::Up, 100.0, 2.0, &SizingConfig::default());
        assert_eq!(s.signal, Signal::Buy);
        assert_relative_eq!(s.stop_loss, 97.0);
        // floor(2000 / 3) = 666, below the cash cap of 1000
        assert_eq!(s.qty, 666);
        assert_relative_eq!(s.approx_entry, 100.0);
    }

    #[test]
    fn quantity_capped_by_capital() {
        // risk budget 2000 / (0.01 * 1.5) would buy 133_333 shares
        let s = size_position(Direction::Up, 100.0, 0.01, &SizingConfig::default());
        assert_eq!(s.qty, 1000);
    }

    #[test]
    fn zero_atr_is_degenerate_buy() {
        let s = size_position(Direction::Up, 100.0, 0.0, &SizingConfig::default());
        assert_eq!(s.signal, Signal::Buy);
        assert_eq!(s.qty, 0);
        assert_relative_eq!(s.stop_loss, 100.0);
    }

    #[test]
    fn nan_atr_is_degenerate() {
        let s = size_position(Direction::Up, 100.0, f64::NAN, &SizingConfig::default());
        assert_eq!(s.signal, Signal::Buy);
        assert_eq!(s.qty, 0);
    }

    #[test]
    fn stop_below_zero_is_preserved() {
        let config = SizingConfig {
            stop_loss_decimals: None,
            ..SizingConfig::default()
        };
        let s = size_position(Direction::Up, 2.0, 4.0, &config);
        assert_relative_eq!(s.stop_loss, -4.0);
        assert!(s.qty <= max_affordable(config.capital, 2.0));
    }

    #[test]
    fn stop_rounded_but_quantity_from_raw_risk() {
        // atr 1.234 * 1.5 = 1.851 → stop 48.149 → 48.15
        let s = size_position(Direction::Up, 50.0, 1.234, &SizingConfig::default());
        assert_relative_eq!(s.stop_loss, 48.15);
        // 2000 / 1.851 = 1080.5; the rounded risk of 1.85 would give 1081
        assert_eq!(s.qty, 1080);
    }

    #[test]
    fn full_precision_when_rounding_disabled() {
        let config = SizingConfig {
            stop_loss_decimals: None,
            ..SizingConfig::default()
        };
        let s = size_position(Direction::Up, 50.0, 1.2345, &config);
        assert_relative_eq!(s.stop_loss, 50.0 - 1.2345 * 1.5);
    }

    #[test]
    fn custom_risk_parameters() {
        let config = SizingConfig {
            capital: 50_000.0,
            risk_fraction: 0.01,
            atr_multiplier: 2.0,
            stop_loss_decimals: Some(2),
        };
        // stop 196, rps 4, budget 500 → 125; cap floor(50000/200)=250
        let s = size_position(Direction::Up, 200.0, 2.0, &config);
        assert_relative_eq!(s.stop_loss, 196.0);
        assert_eq!(s.qty, 125);
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Wait.to_string(), "WAIT");
    }
}
