//! Performance statistics over a completed simulation.

use super::equity::EquityCurve;
use super::simulation::{ExitReason, SimulationResult};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub net_pnl: f64,
    pub roi_pct: f64,
    /// Worst peak-to-trough decline in percent (≤ 0).
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub simulated_days: usize,
    pub trades: usize,
    pub stops_hit: usize,
}

impl PerformanceReport {
    pub fn compute(result: &SimulationResult) -> Self {
        let initial_capital = result.initial_capital;
        let final_capital = result.equity_curve.final_balance();
        let net_pnl = final_capital - initial_capital;
        let roi_pct = if initial_capital > 0.0 {
            net_pnl / initial_capital * 100.0
        } else {
            0.0
        };

        let pnls: Vec<f64> = result.pnl_series().collect();

        PerformanceReport {
            initial_capital,
            final_capital,
            net_pnl,
            roi_pct,
            max_drawdown_pct: max_drawdown(&result.equity_curve) * 100.0,
            sharpe_ratio: sharpe_ratio(&pnls, initial_capital),
            simulated_days: result.days.len(),
            trades: result
                .days
                .iter()
                .filter(|d| d.exit_reason != ExitReason::NoTrade)
                .count(),
            stops_hit: result
                .days
                .iter()
                .filter(|d| d.exit_reason == ExitReason::StopHit)
                .count(),
        }
    }
}

/// Most negative drawdown over the whole curve, as a fraction.
pub fn max_drawdown(curve: &EquityCurve) -> f64 {
    curve.drawdowns().into_iter().fold(0.0, f64::min)
}

/// Annualized Sharpe of daily returns measured against initial capital.
///
/// Uses the sample standard deviation. Zero when there is no variance to
/// measure (fewer than two days, or every return identical). The 252-day
/// annualization applies regardless of sample length.
pub fn sharpe_ratio(pnls: &[f64], initial_capital: f64) -> f64 {
    if pnls.len() < 2 || initial_capital <= 0.0 {
        return 0.0;
    }

    let returns: Vec<f64> = pnls.iter().map(|p| p / initial_capital).collect();
    if returns.iter().all(|&r| r == returns[0]) {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
