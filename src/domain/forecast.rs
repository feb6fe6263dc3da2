//! Daily directional forecasts produced by the external classifier.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub date: NaiveDate,
    pub direction: Direction,
}

impl Forecast {
    pub fn new(date: NaiveDate, direction: Direction) -> Self {
        Forecast { date, direction }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts `UP`/`DOWN` in any case, or the classifier's `1`/`0` labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UP" | "1" | "1.0" => Ok(Direction::Up),
            "DOWN" | "0" | "0.0" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}
