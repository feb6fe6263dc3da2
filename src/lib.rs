//! riskplan: turns daily direction forecasts into risk-sized orders and
//! replays them walk-forward against realized bars.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
