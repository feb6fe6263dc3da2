//! Equity curve produced by the walk-forward simulator.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Account balance over time. The first point is the initial capital at a
/// synthetic date one day before the first simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn new(start: NaiveDate, initial_capital: f64) -> Self {
        EquityCurve {
            points: vec![EquityPoint {
                date: start,
                equity: initial_capital,
            }],
        }
    }

    pub fn record(&mut self, date: NaiveDate, equity: f64) {
        self.points.push(EquityPoint { date, equity });
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn balances(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.equity)
    }

    pub fn initial(&self) -> f64 {
        self.points[0].equity
    }

    pub fn final_balance(&self) -> f64 {
        self.points.last().map_or(self.initial(), |p| p.equity)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fractional decline from the running peak at each point (always ≤ 0).
    pub fn drawdowns(&self) -> Vec<f64> {
        let mut peak = f64::NEG_INFINITY;
        self.points
            .iter()
            .map(|p| {
                peak = peak.max(p.equity);
                if peak > 0.0 {
                    ((p.equity - peak) / peak).min(0.0)
                } else {
                    0.0
                }
            })
            .collect()
    }
}
