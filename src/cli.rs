//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::domain::config_validation::{validate_backtest_config, validate_plan_config};
use crate::domain::error::RiskplanError;
use crate::domain::features::build_features;
use crate::domain::ohlcv::normalize_bars;
use crate::domain::order_plan::{build_order_plan, OrderRecord, PlanConfig};
use crate::domain::report::PerformanceReport;
use crate::domain::simulation::{run_simulation, SimulationConfig, SimulationDay, SimulationResult};
use crate::domain::sizing::SizingConfig;
use crate::domain::volatility::{VolatilityConfig, WarmupPolicy, DEFAULT_ATR_PERIOD};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ChartPort, ReportPort};

#[derive(Parser, Debug)]
#[command(
    name = "riskplan",
    about = "Risk-sized order planning and walk-forward backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the order plan from forecasts and bar history
    Plan {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bars: Option<PathBuf>,
        #[arg(long)]
        forecasts: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay an order plan against realized bars
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bars: Option<PathBuf>,
        #[arg(long)]
        orders: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Plan and backtest in one pass
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bars: Option<PathBuf>,
        #[arg(long)]
        forecasts: Option<PathBuf>,
        #[arg(long)]
        orders: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Build classifier features from bar history
    Features {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bars: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Output paths for a run; `None` means the artifact is not written.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub orders: Option<PathBuf>,
    pub simulation: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Plan {
            config,
            bars,
            forecasts,
            output,
        } => run_plan(config.as_deref(), bars, forecasts, output),
        Command::Backtest {
            config,
            bars,
            orders,
            output,
            chart,
        } => run_backtest(config.as_deref(), bars, orders, output, chart),
        Command::Run {
            config,
            bars,
            forecasts,
            orders,
            output,
            chart,
        } => run_pipeline(config.as_deref(), bars, forecasts, orders, output, chart),
        Command::Features {
            config,
            bars,
            output,
        } => run_features(config.as_deref(), bars, output),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, RiskplanError> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| RiskplanError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Command-line flag first, then the `[data]` section.
pub fn resolve_path(flag: Option<PathBuf>, config: &dyn ConfigPort, key: &str) -> Option<PathBuf> {
    flag.or_else(|| config.get_trimmed("data", key).map(PathBuf::from))
}

pub fn require_path(
    flag: Option<PathBuf>,
    config: &dyn ConfigPort,
    key: &str,
) -> Result<PathBuf, RiskplanError> {
    resolve_path(flag, config, key).ok_or_else(|| RiskplanError::ConfigMissing {
        section: "data".into(),
        key: key.into(),
    })
}

pub fn build_plan_config(config: &dyn ConfigPort) -> Result<PlanConfig, RiskplanError> {
    validate_plan_config(config)?;

    let warmup = match config.get_string("plan", "atr_warmup") {
        Some(s) => s.parse::<WarmupPolicy>().map_err(|reason| RiskplanError::ConfigInvalid {
            section: "plan".into(),
            key: "atr_warmup".into(),
            reason,
        })?,
        None => WarmupPolicy::default(),
    };

    let stop_loss_decimals = match config.get_trimmed("plan", "stop_loss_decimals") {
        Some(s) if s.eq_ignore_ascii_case("none") => None,
        _ => Some(config.get_int("plan", "stop_loss_decimals", 2) as u32),
    };

    Ok(PlanConfig {
        volatility: VolatilityConfig {
            period: config.get_int("plan", "atr_period", DEFAULT_ATR_PERIOD as i64) as usize,
            warmup,
        },
        sizing: SizingConfig {
            capital: config.get_double("plan", "capital", 100_000.0),
            risk_fraction: config.get_double("plan", "risk_fraction", 0.02),
            atr_multiplier: config.get_double("plan", "atr_multiplier", 1.5),
            stop_loss_decimals,
        },
    })
}

pub fn build_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, RiskplanError> {
    validate_backtest_config(config)?;
    Ok(SimulationConfig {
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        brokerage_rate: config.get_double("backtest", "brokerage_rate", 0.0005),
    })
}

/// Fetch forecasts and bars, then build the plan.
pub fn plan_orders(data: &dyn DataPort, config: &PlanConfig) -> Result<Vec<OrderRecord>, RiskplanError> {
    let forecasts = data.fetch_forecasts()?;
    let bars = normalize_bars(data.fetch_bars()?)?;
    tracing::info!(forecasts = forecasts.len(), bars = bars.len(), "inputs loaded");
    Ok(build_order_plan(&forecasts, &bars, config))
}

/// Replay `orders` against the port's bars and summarize.
pub fn backtest_orders(
    data: &dyn DataPort,
    orders: &[OrderRecord],
    config: &SimulationConfig,
) -> Result<(SimulationResult, PerformanceReport), RiskplanError> {
    let bars = normalize_bars(data.fetch_bars()?)?;
    let result = run_simulation(orders, &bars, config)?;
    let report = PerformanceReport::compute(&result);
    Ok((result, report))
}

/// Write whichever artifacts have a path.
pub fn write_outputs(
    writer: &dyn ReportPort,
    chart: &dyn ChartPort,
    orders: &[OrderRecord],
    result: Option<&SimulationResult>,
    outputs: &Outputs,
) -> Result<(), RiskplanError> {
    if let Some(path) = &outputs.orders {
        writer.write_orders(orders, path)?;
        tracing::info!("order book written to {}", path.display());
    }
    if let Some(result) = result {
        if let Some(path) = &outputs.simulation {
            writer.write_simulation(&result.days, path)?;
            tracing::info!("simulation ledger written to {}", path.display());
        }
        if let Some(path) = &outputs.chart {
            chart.render_equity(&result.equity_curve, result.initial_capital, path)?;
            tracing::info!("equity chart written to {}", path.display());
        }
    }
    Ok(())
}

pub fn format_orders(orders: &[OrderRecord]) -> String {
    let mut out = format!(
        "{:<12} | {:<6} | {:>6} | {:>10} | {:>12}\n",
        "DATE", "SIGNAL", "QTY", "STOP LOSS", "APPROX ENTRY"
    );
    for o in orders {
        out.push_str(&format!(
            "{:<12} | {:<6} | {:>6} | {:>10.2} | {:>12.2}\n",
            o.date.to_string(),
            o.signal.to_string(),
            o.qty,
            o.stop_loss,
            o.approx_entry
        ));
    }
    out
}

pub fn format_ledger(days: &[SimulationDay]) -> String {
    let rule = "=".repeat(104);
    let mut out = format!(
        "{rule}\n{:<12} | {:<6} | {:>9} | {:>9} | {:>9} | {:<10} | {:>12} | {:>14}\n{rule}\n",
        "DATE", "SIGNAL", "ENTRY", "STOP LOSS", "EXIT", "REASON", "PNL", "BALANCE"
    );
    for d in days {
        out.push_str(&format!(
            "{:<12} | {:<6} | {:>9.2} | {:>9.2} | {:>9.2} | {:<10} | {:>12.2} | {:>14.2}\n",
            d.date.to_string(),
            d.signal.to_string(),
            d.entry_price,
            d.stop_loss,
            d.exit_price,
            d.exit_reason.to_string(),
            d.pnl,
            d.balance_after
        ));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

pub fn format_report(report: &PerformanceReport) -> String {
    let mut out = String::from("=== Performance Report ===\n");
    out.push_str(&format!("Initial Capital:  {:.2}\n", report.initial_capital));
    out.push_str(&format!("Final Capital:    {:.2}\n", report.final_capital));
    out.push_str(&format!(
        "Net Profit:       {:.2} ({:.2}%)\n",
        report.net_pnl, report.roi_pct
    ));
    out.push_str(&format!("Max Drawdown:     {:.2}%\n", report.max_drawdown_pct));
    out.push_str(&format!("Sharpe Ratio:     {:.2}\n", report.sharpe_ratio));
    out.push_str(&format!(
        "Trades:           {} over {} days ({} stopped out)\n",
        report.trades, report.simulated_days, report.stops_hit
    ));
    out
}

fn run_plan(
    config_path: Option<&Path>,
    bars: Option<PathBuf>,
    forecasts: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), RiskplanError> {
    let config = load_config(config_path)?;
    let plan_config = build_plan_config(&config)?;

    let adapter = CsvAdapter::new()
        .with_bars(require_path(bars, &config, "bars")?)
        .with_forecasts(require_path(forecasts, &config, "forecasts")?);
    let outputs = Outputs {
        orders: Some(require_path(output, &config, "orders")?),
        ..Outputs::default()
    };

    let orders = plan_orders(&adapter, &plan_config)?;
    write_outputs(&adapter, &SvgChartAdapter::new(), &orders, None, &outputs)?;
    print!("{}", format_orders(&orders));
    Ok(())
}

fn run_backtest(
    config_path: Option<&Path>,
    bars: Option<PathBuf>,
    orders: Option<PathBuf>,
    output: Option<PathBuf>,
    chart: Option<PathBuf>,
) -> Result<(), RiskplanError> {
    let config = load_config(config_path)?;
    let sim_config = build_simulation_config(&config)?;

    let adapter = CsvAdapter::new()
        .with_bars(require_path(bars, &config, "bars")?)
        .with_orders(require_path(orders, &config, "orders")?);
    let outputs = Outputs {
        orders: None,
        simulation: resolve_path(output, &config, "simulation"),
        chart: resolve_path(chart, &config, "chart"),
    };

    let orders = adapter.fetch_orders()?;
    let (result, report) = backtest_orders(&adapter, &orders, &sim_config)?;
    print!("{}", format_ledger(&result.days));
    print!("{}", format_report(&report));
    write_outputs(&adapter, &SvgChartAdapter::new(), &orders, Some(&result), &outputs)
}

fn run_pipeline(
    config_path: Option<&Path>,
    bars: Option<PathBuf>,
    forecasts: Option<PathBuf>,
    orders: Option<PathBuf>,
    output: Option<PathBuf>,
    chart: Option<PathBuf>,
) -> Result<(), RiskplanError> {
    let config = load_config(config_path)?;
    let plan_config = build_plan_config(&config)?;
    let sim_config = build_simulation_config(&config)?;

    let adapter = CsvAdapter::new()
        .with_bars(require_path(bars, &config, "bars")?)
        .with_forecasts(require_path(forecasts, &config, "forecasts")?);
    let outputs = Outputs {
        orders: resolve_path(orders, &config, "orders"),
        simulation: resolve_path(output, &config, "simulation"),
        chart: resolve_path(chart, &config, "chart"),
    };

    let orders = plan_orders(&adapter, &plan_config)?;
    let (result, report) = backtest_orders(&adapter, &orders, &sim_config)?;
    print!("{}", format_ledger(&result.days));
    print!("{}", format_report(&report));
    write_outputs(&adapter, &SvgChartAdapter::new(), &orders, Some(&result), &outputs)
}

fn run_features(
    config_path: Option<&Path>,
    bars: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), RiskplanError> {
    let config = load_config(config_path)?;
    let adapter = CsvAdapter::new().with_bars(require_path(bars, &config, "bars")?);
    let output = require_path(output, &config, "features")?;

    let bars = adapter.fetch_bars()?;
    let rows = build_features(&bars);
    adapter.write_features(&rows, &output)?;
    tracing::info!(rows = rows.len(), "feature table written to {}", output.display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RiskplanError> {
    let config = load_config(Some(config_path))?;
    let plan = build_plan_config(&config)?;
    let sim = build_simulation_config(&config)?;

    eprintln!("Plan:");
    eprintln!(
        "  capital {:.2}, risk_fraction {}, atr_multiplier {}",
        plan.sizing.capital, plan.sizing.risk_fraction, plan.sizing.atr_multiplier
    );
    eprintln!(
        "  atr_period {}, warmup {}",
        plan.volatility.period, plan.volatility.warmup
    );
    eprintln!("Backtest:");
    eprintln!(
        "  initial_capital {:.2}, brokerage_rate {}",
        sim.initial_capital, sim.brokerage_rate
    );
    for key in ["bars", "forecasts", "orders", "simulation", "chart", "features"] {
        if let Some(path) = config.get_trimmed("data", key) {
            eprintln!("  data.{key} = {path}");
        }
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
