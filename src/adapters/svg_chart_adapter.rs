//! Standalone SVG equity-curve chart.

use crate::domain::equity::EquityCurve;
use crate::domain::error::RiskplanError;
use crate::ports::report_port::ChartPort;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct SvgChartAdapter;

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn fmt_money(value: f64) -> String {
    if value >= 0.0 {
        format!("{:.2}", value)
    } else {
        format!("-{:.2}", value.abs())
    }
}

/// Equity line with point markers and a dashed initial-capital baseline.
pub fn equity_svg(curve: &EquityCurve, initial_capital: f64) -> String {
    let points = curve.points();

    let lo = curve.balances().fold(initial_capital, f64::min);
    let hi = curve.balances().fold(initial_capital, f64::max);
    let range = (hi - lo).max(1.0);

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_scale =
        |i: usize| -> f64 { MARGIN_LEFT + (i as f64 / (points.len() - 1).max(1) as f64) * plot_width };
    let y_scale = |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - lo) / range) * plot_height };

    let roi = if initial_capital > 0.0 {
        (curve.final_balance() - initial_capital) / initial_capital * 100.0
    } else {
        0.0
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    let _ = writeln!(
        svg,
        "  <text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">Equity Curve: {:.2}% Return</text>",
        CHART_WIDTH / 2.0,
        roi
    );

    // axes
    let _ = writeln!(
        svg,
        "  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = CHART_HEIGHT - MARGIN_BOTTOM
    );
    let _ = writeln!(
        svg,
        "  <line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>",
        l = MARGIN_LEFT,
        b = CHART_HEIGHT - MARGIN_BOTTOM,
        r = CHART_WIDTH - MARGIN_RIGHT
    );

    for value in [hi, lo] {
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>",
            MARGIN_LEFT - 5.0,
            y_scale(value) + 4.0,
            fmt_money(value)
        );
    }

    let baseline = y_scale(initial_capital);
    let _ = writeln!(
        svg,
        "  <line class=\"baseline\" x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#dc2626\" stroke-dasharray=\"6 4\" stroke-width=\"1\"/>",
        MARGIN_LEFT,
        baseline,
        CHART_WIDTH - MARGIN_RIGHT,
        baseline
    );

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"start\" font-size=\"10\" fill=\"#666\">{}</text>",
            MARGIN_LEFT,
            CHART_HEIGHT - 10.0,
            first.date
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>",
            CHART_WIDTH - MARGIN_RIGHT,
            CHART_HEIGHT - 10.0,
            last.date
        );
    }

    let mut path_data = String::new();
    for (i, point) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        let _ = write!(path_data, "{} {:.1} {:.1}", cmd, x_scale(i), y_scale(point.equity));
    }
    let _ = writeln!(
        svg,
        "  <path d=\"{}\" fill=\"none\" stroke=\"#16a34a\" stroke-width=\"2\"/>",
        path_data
    );
    for (i, point) in points.iter().enumerate() {
        let _ = writeln!(
            svg,
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"#16a34a\"/>",
            x_scale(i),
            y_scale(point.equity)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

impl ChartPort for SvgChartAdapter {
    fn render_equity(
        &self,
        curve: &EquityCurve,
        initial_capital: f64,
        path: &Path,
    ) -> Result<(), RiskplanError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, equity_svg(curve, initial_capital))?;
        Ok(())
    }
}
