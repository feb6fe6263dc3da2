//! Output port traits for tabular results and the equity chart.

use crate::domain::equity::EquityCurve;
use crate::domain::error::RiskplanError;
use crate::domain::features::FeatureRow;
use crate::domain::order_plan::OrderRecord;
use crate::domain::simulation::SimulationDay;
use std::path::Path;

/// Port for writing the pipeline's tables.
pub trait ReportPort {
    fn write_orders(&self, orders: &[OrderRecord], path: &Path) -> Result<(), RiskplanError>;

    fn write_simulation(&self, days: &[SimulationDay], path: &Path) -> Result<(), RiskplanError>;

    fn write_features(&self, rows: &[FeatureRow], path: &Path) -> Result<(), RiskplanError>;
}

/// Sink for the equity-curve visualization.
pub trait ChartPort {
    fn render_equity(
        &self,
        curve: &EquityCurve,
        initial_capital: f64,
        path: &Path,
    ) -> Result<(), RiskplanError>;
}
