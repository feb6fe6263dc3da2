//! Average True Range volatility estimator.
//!
//! TR[0] = |H[0] - L[0]|
//! TR[i] = max(|H[i] - L[i]|, |H[i] - C[i-1]|, |L[i] - C[i-1]|)
//! ATR(n)[i] = mean(TR[i-n+1..=i])
//!
//! Warmup (fewer than n bars seen) is governed by [`WarmupPolicy`].

use super::ohlcv::Bar;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityPoint {
    pub date: NaiveDate,
    pub atr: f64,
}

/// How ATR is reported before a full window of true ranges exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupPolicy {
    /// Mean of every true range seen so far.
    #[default]
    ExpandingMean,
    /// Zero until the window is full.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityConfig {
    pub period: usize,
    pub warmup: WarmupPolicy,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        VolatilityConfig {
            period: DEFAULT_ATR_PERIOD,
            warmup: WarmupPolicy::default(),
        }
    }
}

impl fmt::Display for WarmupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmupPolicy::ExpandingMean => write!(f, "expanding"),
            WarmupPolicy::Zero => write!(f, "zero"),
        }
    }
}

impl FromStr for WarmupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expanding" | "expanding_mean" => Ok(WarmupPolicy::ExpandingMean),
            "zero" => Ok(WarmupPolicy::Zero),
            other => Err(format!("unknown warmup policy '{other}'")),
        }
    }
}

/// Lazy ATR over a bar slice. Each call to `next` advances the trailing
/// window by one bar; the value for bar `i` depends only on `bars[..=i]`.
#[derive(Debug, Clone)]
pub struct AtrStream<'a> {
    bars: std::slice::Iter<'a, Bar>,
    config: VolatilityConfig,
    prev_close: Option<f64>,
    window: VecDeque<f64>,
}

impl<'a> AtrStream<'a> {
    pub fn new(bars: &'a [Bar], config: VolatilityConfig) -> Self {
        let period = config.period.max(1);
        AtrStream {
            bars: bars.iter(),
            config: VolatilityConfig { period, ..config },
            prev_close: None,
            window: VecDeque::with_capacity(period.min(bars.len())),
        }
    }

    fn current_atr(&self) -> f64 {
        let warm = self.window.len() >= self.config.period;
        if !warm && self.config.warmup == WarmupPolicy::Zero {
            return 0.0;
        }
        if self.window.is_empty() {
            return 0.0;
        }
        // Re-summed each step; no running total.
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        if mean.is_finite() { mean.max(0.0) } else { 0.0 }
    }
}

impl Iterator for AtrStream<'_> {
    type Item = VolatilityPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let bar = self.bars.next()?;
        let tr = bar.true_range(self.prev_close);
        self.prev_close = Some(bar.close);

        if self.window.len() == self.config.period {
            self.window.pop_front();
        }
        self.window.push_back(if tr.is_finite() { tr } else { 0.0 });

        Some(VolatilityPoint {
            date: bar.date,
            atr: self.current_atr(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bars.size_hint()
    }
}

pub fn compute_volatility(bars: &[Bar], config: &VolatilityConfig) -> Vec<VolatilityPoint> {
    AtrStream::new(bars, *config).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_bars(hlc: &[(f64, f64, f64)]) -> Vec<Bar> {
        hlc.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2026, 1, (i + 1) as u32).unwrap(),
                    close,
                    high,
                    low,
                    close,
                )
            })
            .collect()
    }

    fn config(period: usize, warmup: WarmupPolicy) -> VolatilityConfig {
        VolatilityConfig { period, warmup }
    }

    #[test]
    fn one_point_per_bar() {
        let bars = make_bars(&[(11.0, 9.0, 10.0); 20]);
        let series = compute_volatility(&bars, &VolatilityConfig::default());
        assert_eq!(series.len(), 20);
        for (p, b) in series.iter().zip(&bars) {
            assert_eq!(p.date, b.date);
        }
    }

    #[test]
    fn first_bar_uses_high_low() {
        let bars = make_bars(&[(12.0, 9.0, 10.0)]);
        let series = compute_volatility(&bars, &config(3, WarmupPolicy::ExpandingMean));
        assert_relative_eq!(series[0].atr, 3.0);
    }

    #[test]
    fn expanding_mean_during_warmup() {
        // TR: 2, max(2,|12-10|,|10-10|)=2, max(4,|14-11|,|10-11|)=4
        let bars = make_bars(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0), (14.0, 10.0, 12.0)]);
        let series = compute_volatility(&bars, &config(5, WarmupPolicy::ExpandingMean));
        assert_relative_eq!(series[0].atr, 2.0);
        assert_relative_eq!(series[1].atr, 2.0);
        assert_relative_eq!(series[2].atr, 8.0 / 3.0);
    }

    #[test]
    fn zero_policy_reports_zero_until_window_full() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0), (14.0, 10.0, 12.0)]);
        let series = compute_volatility(&bars, &config(3, WarmupPolicy::Zero));
        assert_eq!(series[0].atr, 0.0);
        assert_eq!(series[1].atr, 0.0);
        assert_relative_eq!(series[2].atr, 8.0 / 3.0);
    }

    #[test]
    fn window_slides_after_warmup() {
        // TRs: 2, 2, 4, 10 → period 2 means: 2, 2, 3, 7
        let bars = make_bars(&[
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 11.0),
            (14.0, 10.0, 12.0),
            (20.0, 10.0, 15.0),
        ]);
        let series = compute_volatility(&bars, &config(2, WarmupPolicy::ExpandingMean));
        assert_relative_eq!(series[2].atr, 3.0);
        assert_relative_eq!(series[3].atr, 7.0);
    }

    #[test]
    fn gap_uses_previous_close() {
        // second bar gaps up: |30-10| = 20 dominates range of 2
        let bars = make_bars(&[(11.0, 9.0, 10.0), (30.0, 28.0, 29.0)]);
        let series = compute_volatility(&bars, &config(1, WarmupPolicy::ExpandingMean));
        assert_relative_eq!(series[1].atr, 20.0);
    }

    #[test]
    fn flat_bars_have_zero_atr() {
        let bars = make_bars(&[(10.0, 10.0, 10.0); 5]);
        let series = compute_volatility(&bars, &VolatilityConfig::default());
        assert!(series.iter().all(|p| p.atr == 0.0));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(compute_volatility(&[], &VolatilityConfig::default()).is_empty());
    }

    #[test]
    fn prefix_matches_full_series() {
        let bars = make_bars(&[
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 11.0),
            (14.0, 10.0, 12.0),
            (20.0, 10.0, 15.0),
            (16.0, 13.0, 14.0),
        ]);
        let cfg = config(3, WarmupPolicy::ExpandingMean);
        let full = compute_volatility(&bars, &cfg);
        for end in 1..=bars.len() {
            let prefix = compute_volatility(&bars[..end], &cfg);
            assert_eq!(prefix.last(), full.get(end - 1));
        }
    }

    #[test]
    fn stream_is_restartable() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0)]);
        let stream = AtrStream::new(&bars, VolatilityConfig::default());
        let a: Vec<_> = stream.clone().collect();
        let b: Vec<_> = stream.collect();
        assert_eq!(a, b);
    }

    #[test]
    fn warmup_policy_parse() {
        assert_eq!("expanding".parse::<WarmupPolicy>(), Ok(WarmupPolicy::ExpandingMean));
        assert_eq!("ZERO".parse::<WarmupPolicy>(), Ok(WarmupPolicy::Zero));
        assert!("rolling".parse::<WarmupPolicy>().is_err());
    }

    #[test]
    fn period_longer_than_history_is_expanding_mean() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0), (14.0, 10.0, 12.0)]);
        let series = compute_volatility(&bars, &config(100_000_000_000, WarmupPolicy::ExpandingMean));
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[2].atr, 8.0 / 3.0);

        let zero = compute_volatility(&bars, &config(100_000_000_000, WarmupPolicy::Zero));
        assert!(zero.iter().all(|p| p.atr == 0.0));
    }
}
