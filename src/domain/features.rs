//! Daily feature rows for the external direction classifier.
//!
//! return_k[i]  = C[i] / C[i-k] - 1            (k = 1, 3, 5)
//! clv[i]       = ((C - L) - (H - C)) / (H - L), 0 on a zero range
//! up_streak    = consecutive closes above the previous close
//! down_streak  = consecutive closes below the previous close
//! accel[i]     = return_1[i] - return_1[i-1]
//! target[i]    = 1 if C[i+1] > C[i] else 0
//!
//! Rows missing any lagged value (the first five bars) and the final bar,
//! which has no next close to label it, are dropped.

use super::ohlcv::Bar;
use chrono::NaiveDate;
use serde::Serialize;

const MAX_LAG: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub return_1d: f64,
    pub return_3d: f64,
    pub return_5d: f64,
    pub clv: f64,
    pub up_streak: u32,
    pub down_streak: u32,
    pub accel: f64,
    pub target: u8,
}

fn pct_change(bars: &[Bar], i: usize, lag: usize) -> f64 {
    let prev = bars[i - lag].close;
    if prev == 0.0 {
        return 0.0;
    }
    bars[i].close / prev - 1.0
}

/// Streak counters per bar, including the warm-up bars.
pub fn streaks(bars: &[Bar]) -> Vec<(u32, u32)> {
    let mut up = 0u32;
    let mut down = 0u32;
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let diff = if i == 0 { 0.0 } else { bar.close - bars[i - 1].close };
        up = if diff > 0.0 { up + 1 } else { 0 };
        down = if diff < 0.0 { down + 1 } else { 0 };
        out.push((up, down));
    }
    out
}

pub fn build_features(bars: &[Bar]) -> Vec<FeatureRow> {
    if bars.len() <= MAX_LAG + 1 {
        return Vec::new();
    }
    let streaks = streaks(bars);

    (MAX_LAG..bars.len() - 1)
        .map(|i| {
            let return_1d = pct_change(bars, i, 1);
            let (up_streak, down_streak) = streaks[i];
            FeatureRow {
                date: bars[i].date,
                return_1d,
                return_3d: pct_change(bars, i, 3),
                return_5d: pct_change(bars, i, 5),
                clv: bars[i].close_location_value(),
                up_streak,
                down_streak,
                accel: return_1d - pct_change(bars, i - 1, 1),
                target: u8::from(bars[i + 1].close > bars[i].close),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2026, 1, (i + 1) as u32).unwrap(),
                    c,
                    c + 1.0,
                    c - 1.0,
                    c,
                )
            })
            .collect()
    }

    #[test]
    fn too_short_history_yields_nothing() {
        assert!(build_features(&make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).is_empty());
    }

    #[test]
    fn drops_warmup_and_last_row() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        let rows = build_features(&bars);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, bars[5].date);
        assert_eq!(rows[1].date, bars[6].date);
    }

    #[test]
    fn returns_and_accel() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 11.0, 12.0]);
        let rows = build_features(&bars);
        let r = &rows[1]; // bar 6, close 11
        assert_relative_eq!(r.return_1d, 0.1);
        assert_relative_eq!(r.return_3d, 0.1);
        assert_relative_eq!(r.return_5d, 0.1);
        assert_relative_eq!(r.accel, 0.1);
        assert_eq!(r.target, 1);
    }

    #[test]
    fn target_zero_when_next_close_not_higher() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]);
        let rows = build_features(&bars);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].target, 0);
    }

    #[test]
    fn streaks_reset_on_reversal() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 11.0, 10.0, 10.0, 11.0]);
        let s = streaks(&bars);
        assert_eq!(s, vec![(0, 0), (1, 0), (2, 0), (0, 1), (0, 2), (0, 0), (1, 0)]);
    }

    #[test]
    fn clv_uses_bar_location() {
        let mut bars = make_bars(&[10.0; 8]);
        bars[5].high = 12.0;
        bars[5].low = 10.0;
        let rows = build_features(&bars);
        assert_relative_eq!(rows[0].clv, -1.0);
    }
}
