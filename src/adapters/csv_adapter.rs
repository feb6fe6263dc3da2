//! CSV file adapter for input tables and tabular output.

use crate::domain::error::RiskplanError;
use crate::domain::features::FeatureRow;
use crate::domain::forecast::{Direction, Forecast};
use crate::domain::ohlcv::{normalize_bars, Bar};
use crate::domain::order_plan::OrderRecord;
use crate::domain::simulation::SimulationDay;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CsvAdapter {
    bars_path: Option<PathBuf>,
    forecasts_path: Option<PathBuf>,
    orders_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, path: impl Into<PathBuf>) -> Self {
        self.bars_path = Some(path.into());
        self
    }

    pub fn with_forecasts(mut self, path: impl Into<PathBuf>) -> Self {
        self.forecasts_path = Some(path.into());
        self
    }

    pub fn with_orders(mut self, path: impl Into<PathBuf>) -> Self {
        self.orders_path = Some(path.into());
        self
    }

    fn open(table: &str, path: Option<&PathBuf>) -> Result<csv::Reader<fs::File>, RiskplanError> {
        let path = path.ok_or_else(|| RiskplanError::missing(table, "no path configured"))?;
        if !path.exists() {
            return Err(RiskplanError::missing(
                table,
                format!("{} does not exist", path.display()),
            ));
        }
        let file = fs::File::open(path)?;
        Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
    }
}

/// Column positions resolved from the header row by name.
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn read(rdr: &mut csv::Reader<fs::File>) -> Result<Self, RiskplanError> {
        let names = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        Ok(Columns { names })
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn require(&self, table: &str, name: &str) -> Result<usize, RiskplanError> {
        self.find(name)
            .ok_or_else(|| RiskplanError::data(format!("{table}: missing {name} column")))
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, RiskplanError> {
    record
        .get(idx)
        .ok_or_else(|| RiskplanError::data(format!("missing {name} value")))
}

fn parse_f64(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, RiskplanError> {
    let raw = field(record, idx, name)?;
    raw.parse()
        .map_err(|e| RiskplanError::data(format!("invalid {name} value '{raw}': {e}")))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
pub fn parse_date(raw: &str) -> Result<NaiveDate, RiskplanError> {
    let day = raw.split([' ', 'T']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| RiskplanError::data(format!("invalid date '{raw}': {e}")))
}

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<(), RiskplanError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, RiskplanError> {
        let mut rdr = Self::open("bars", self.bars_path.as_ref())?;
        let cols = Columns::read(&mut rdr)?;
        let date_i = cols.require("bars", "date")?;
        let open_i = cols.require("bars", "open")?;
        let high_i = cols.require("bars", "high")?;
        let low_i = cols.require("bars", "low")?;
        let close_i = cols.require("bars", "close")?;
        let volume_i = cols.find("volume");

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let volume = match volume_i.and_then(|i| record.get(i)).filter(|v| !v.is_empty()) {
                Some(raw) => Some(
                    raw.parse::<f64>()
                        .map_err(|e| RiskplanError::data(format!("invalid volume value '{raw}': {e}")))?
                        as i64,
                ),
                None => None,
            };
            bars.push(Bar {
                date: parse_date(field(&record, date_i, "date")?)?,
                open: parse_f64(&record, open_i, "open")?,
                high: parse_f64(&record, high_i, "high")?,
                low: parse_f64(&record, low_i, "low")?,
                close: parse_f64(&record, close_i, "close")?,
                volume,
            });
        }

        normalize_bars(bars)
    }

    fn fetch_forecasts(&self) -> Result<Vec<Forecast>, RiskplanError> {
        let mut rdr = Self::open("forecasts", self.forecasts_path.as_ref())?;
        let cols = Columns::read(&mut rdr)?;
        let date_i = cols.require("forecasts", "date")?;
        let dir_i = cols
            .find("direction")
            .or_else(|| cols.find("prediction"))
            .ok_or_else(|| RiskplanError::data("forecasts: missing direction column"))?;

        let mut forecasts = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let direction: Direction = field(&record, dir_i, "direction")?
                .parse()
                .map_err(RiskplanError::data)?;
            forecasts.push(Forecast::new(
                parse_date(field(&record, date_i, "date")?)?,
                direction,
            ));
        }
        Ok(forecasts)
    }

    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, RiskplanError> {
        let mut rdr = Self::open("orders", self.orders_path.as_ref())?;
        let mut orders = Vec::new();
        for result in rdr.deserialize() {
            let order: OrderRecord = result?;
            orders.push(order);
        }
        Ok(orders)
    }
}

impl ReportPort for CsvAdapter {
    fn write_orders(&self, orders: &[OrderRecord], path: &Path) -> Result<(), RiskplanError> {
        write_rows(orders, path)
    }

    fn write_simulation(&self, days: &[SimulationDay], path: &Path) -> Result<(), RiskplanError> {
        write_rows(days, path)
    }

    fn write_features(&self, rows: &[FeatureRow], path: &Path) -> Result<(), RiskplanError> {
        write_rows(rows, path)
    }
}
