//! Core domain types and logic.

pub mod ohlcv;
pub mod forecast;
pub mod volatility;
pub mod sizing;
pub mod order_plan;
pub mod equity;
pub mod simulation;
pub mod report;
pub mod features;
pub mod config_validation;
pub mod error;
