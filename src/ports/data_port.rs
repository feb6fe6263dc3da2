//! Data access port trait: the tables the pipeline consumes.

use crate::domain::error::RiskplanError;
use crate::domain::forecast::Forecast;
use crate::domain::ohlcv::Bar;
use crate::domain::order_plan::OrderRecord;

/// Source of input tables. An absent table is `RiskplanError::MissingInput`;
/// a present but empty one is returned as an empty vector.
pub trait DataPort {
    /// Daily bars in table order; `normalize_bars` validates and sorts them.
    fn fetch_bars(&self) -> Result<Vec<Bar>, RiskplanError>;

    /// Forecasts in table order.
    fn fetch_forecasts(&self) -> Result<Vec<Forecast>, RiskplanError>;

    /// A previously written order plan.
    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, RiskplanError>;
}
