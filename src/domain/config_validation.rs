//! Configuration validation.
//!
//! Checks the `[plan]` and `[backtest]` sections before any data is read.
//! Absent keys fall back to defaults and are not errors.

use crate::domain::error::RiskplanError;
use crate::domain::volatility::WarmupPolicy;
use crate::ports::config_port::ConfigPort;

pub const MAX_STOP_LOSS_DECIMALS: i64 = 8;

pub fn validate_plan_config(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    validate_capital(config)?;
    validate_risk_fraction(config)?;
    validate_atr_multiplier(config)?;
    validate_atr_period(config)?;
    validate_atr_warmup(config)?;
    validate_stop_loss_decimals(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    validate_initial_capital(config)?;
    validate_brokerage_rate(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RiskplanError {
    RiskplanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// A present value must parse to a finite number; `nan` and `inf` parse as
/// `f64` but slip past every range check.
fn check_numeric(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), RiskplanError> {
    if let Some(raw) = config.get_string(section, key) {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => {}
            _ => return Err(invalid(section, key, &format!("'{raw}' is not a finite number"))),
        }
    }
    Ok(())
}

/// `get_int` falls back to its default on `14.5`, so reject it here.
fn check_integer(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), RiskplanError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<i64>().is_err() {
            return Err(invalid(section, key, &format!("'{raw}' is not an integer")));
        }
    }
    Ok(())
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_numeric(config, "plan", "capital")?;
    if config.get_double("plan", "capital", 100_000.0) <= 0.0 {
        return Err(invalid("plan", "capital", "capital must be positive"));
    }
    Ok(())
}

fn validate_risk_fraction(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_numeric(config, "plan", "risk_fraction")?;
    let value = config.get_double("plan", "risk_fraction", 0.02);
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "plan",
            "risk_fraction",
            "risk_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_atr_multiplier(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_numeric(config, "plan", "atr_multiplier")?;
    if config.get_double("plan", "atr_multiplier", 1.5) <= 0.0 {
        return Err(invalid(
            "plan",
            "atr_multiplier",
            "atr_multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_atr_period(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_integer(config, "plan", "atr_period")?;
    if config.get_int("plan", "atr_period", 14) < 1 {
        return Err(invalid("plan", "atr_period", "atr_period must be at least 1"));
    }
    Ok(())
}

fn validate_atr_warmup(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    match config.get_string("plan", "atr_warmup") {
        Some(s) => s
            .parse::<WarmupPolicy>()
            .map(|_| ())
            .map_err(|e| invalid("plan", "atr_warmup", &e)),
        None => Ok(()),
    }
}

fn validate_stop_loss_decimals(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    match config.get_string("plan", "stop_loss_decimals") {
        Some(s) if s.trim().eq_ignore_ascii_case("none") => Ok(()),
        Some(s) => match s.trim().parse::<i64>() {
            Ok(v) if (0..=MAX_STOP_LOSS_DECIMALS).contains(&v) => Ok(()),
            _ => Err(invalid(
                "plan",
                "stop_loss_decimals",
                "stop_loss_decimals must be 0..=8 or 'none'",
            )),
        },
        None => Ok(()),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_numeric(config, "backtest", "initial_capital")?;
    if config.get_double("backtest", "initial_capital", 100_000.0) <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_brokerage_rate(config: &dyn ConfigPort) -> Result<(), RiskplanError> {
    check_numeric(config, "backtest", "brokerage_rate")?;
    let value = config.get_double("backtest", "brokerage_rate", 0.0005);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "brokerage_rate",
            "brokerage_rate must be in [0, 1)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(result: Result<(), RiskplanError>, expected_key: &str) {
        match result {
            Err(RiskplanError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        let cfg = adapter("");
        assert!(validate_plan_config(&cfg).is_ok());
        assert!(validate_backtest_config(&cfg).is_ok());
    }

    #[test]
    fn full_valid_config() {
        let cfg = adapter(
            "[plan]\ncapital = 50000\nrisk_fraction = 0.01\natr_multiplier = 2\n\
             atr_period = 10\natr_warmup = zero\nstop_loss_decimals = 4\n\
             [backtest]\ninitial_capital = 50000\nbrokerage_rate = 0.001\n",
        );
        assert!(validate_plan_config(&cfg).is_ok());
        assert!(validate_backtest_config(&cfg).is_ok());
    }

    #[test]
    fn negative_capital_rejected() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\ncapital = -1\n")),
            "capital",
        );
    }

    #[test]
    fn non_numeric_capital_rejected() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\ncapital = lots\n")),
            "capital",
        );
    }

    #[test]
    fn risk_fraction_out_of_range() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\nrisk_fraction = 0\n")),
            "risk_fraction",
        );
        assert_invalid(
            validate_plan_config(&adapter("[plan]\nrisk_fraction = 1.5\n")),
            "risk_fraction",
        );
    }

    #[test]
    fn atr_multiplier_must_be_positive() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\natr_multiplier = 0\n")),
            "atr_multiplier",
        );
    }

    #[test]
    fn atr_period_must_be_positive() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\natr_period = 0\n")),
            "atr_period",
        );
    }

    #[test]
    fn unknown_warmup_rejected() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\natr_warmup = rolling\n")),
            "atr_warmup",
        );
    }

    #[test]
    fn stop_loss_decimals_bounds() {
        assert!(validate_plan_config(&adapter("[plan]\nstop_loss_decimals = none\n")).is_ok());
        assert_invalid(
            validate_plan_config(&adapter("[plan]\nstop_loss_decimals = 12\n")),
            "stop_loss_decimals",
        );
    }

    #[test]
    fn brokerage_rate_bounds() {
        assert!(validate_backtest_config(&adapter("[backtest]\nbrokerage_rate = 0\n")).is_ok());
        assert_invalid(
            validate_backtest_config(&adapter("[backtest]\nbrokerage_rate = -0.1\n")),
            "brokerage_rate",
        );
        assert_invalid(
            validate_backtest_config(&adapter("[backtest]\nbrokerage_rate = 1\n")),
            "brokerage_rate",
        );
    }

    #[test]
    fn initial_capital_must_be_positive() {
        assert_invalid(
            validate_backtest_config(&adapter("[backtest]\ninitial_capital = 0\n")),
            "initial_capital",
        );
    }

    #[test]
    fn non_finite_values_rejected() {
        for raw in ["nan", "NaN", "inf", "-inf", "infinity"] {
            assert_invalid(
                validate_plan_config(&adapter(&format!("[plan]\ncapital = {raw}\n"))),
                "capital",
            );
            assert_invalid(
                validate_plan_config(&adapter(&format!("[plan]\nrisk_fraction = {raw}\n"))),
                "risk_fraction",
            );
            assert_invalid(
                validate_plan_config(&adapter(&format!("[plan]\natr_multiplier = {raw}\n"))),
                "atr_multiplier",
            );
            assert_invalid(
                validate_backtest_config(&adapter(&format!("[backtest]\ninitial_capital = {raw}\n"))),
                "initial_capital",
            );
            assert_invalid(
                validate_backtest_config(&adapter(&format!("[backtest]\nbrokerage_rate = {raw}\n"))),
                "brokerage_rate",
            );
        }
    }

    #[test]
    fn fractional_atr_period_rejected() {
        assert_invalid(
            validate_plan_config(&adapter("[plan]\natr_period = 14.5\n")),
            "atr_period",
        );
        assert_invalid(
            validate_plan_config(&adapter("[plan]\natr_period = nan\n")),
            "atr_period",
        );
        assert!(validate_plan_config(&adapter("[plan]\natr_period = 20\n")).is_ok());
    }
}
