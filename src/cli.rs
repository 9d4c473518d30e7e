//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, RunConfig};
use crate::domain::config_validation::validate_all;
use crate::domain::error::EngineError;
use crate::domain::indicator::params::{
    BollingerParams, MacdParams, MovingAveragePair, RsiParams, VolumeSpikeParams,
};
use crate::domain::indicator::IndicatorParams;
use crate::domain::ohlcv::validate_series;
use crate::domain::risk::RiskConfig;
use crate::domain::signal_eval::CompiledStrategy;
use crate::domain::sizing::PositionSizingConfig;
use crate::domain::strategy::{Slot, StrategyConfig, PRESETS};
use crate::domain::sweep::TrialRunner;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_BB_STD_DEV: f64 = 2.0;
const DEFAULT_RSI_OVERBOUGHT: f64 = 70.0;
const DEFAULT_RSI_OVERSOLD: f64 = 30.0;
const DEFAULT_MACD_SIGNAL: usize = 9;
const DEFAULT_VOLUME_SPIKE_MULTIPLIER: f64 = 1.5;

const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("backtest", &["ticker", "period", "interval", "initial_capital", "leverage"]),
    (
        "indicators",
        &[
            "sma_fast",
            "sma_slow",
            "ema_fast",
            "ema_slow",
            "bb_period",
            "bb_std_dev",
            "atr_period",
            "rsi_period",
            "rsi_overbought",
            "rsi_oversold",
            "macd_fast",
            "macd_slow",
            "macd_signal",
            "breakout_window",
            "volume_spike_window",
            "volume_spike_multiplier",
        ],
    ),
    ("strategy", &["preset", "long_entry", "short_entry", "long_exit", "short_exit"]),
    ("risk", &["mode", "stop_loss", "take_profit", "spread_pct", "slippage_pct"]),
    (
        "sizing",
        &[
            "volatility_threshold",
            "high_vol_fraction",
            "low_vol_base_fraction",
            "performance_window",
            "volatility_lookback_minutes",
        ],
    ),
];

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Deterministic single-asset backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding `<ticker>.csv`
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run several configurations against one bar series in parallel
    Sweep {
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long, num_args = 1.., required = true)]
        config: Vec<PathBuf>,
        /// Write one JSON report per configuration here instead of stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List the built-in strategy presets
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, &data_dir)
            } else {
                run_backtest(&config, &data_dir, output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Sweep {
            data_dir,
            config,
            output_dir,
        } => run_sweep(&data_dir, &config, output_dir.as_deref()),
        Command::Presets => run_presets(),
    }
}

fn fail(err: &EngineError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    FileConfigAdapter::from_file(path).map_err(|e| EngineError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn missing(section: &str, key: &str) -> EngineError {
    EngineError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn optional_usize(adapter: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<usize>, EngineError> {
    match adapter.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| EngineError::invalid(section, key, format!("expected a positive integer, got '{raw}'"))),
    }
}

fn optional_f64(adapter: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, EngineError> {
    match adapter.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| EngineError::invalid(section, key, format!("expected a number, got '{raw}'"))),
    }
}

fn optional_i64(adapter: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, EngineError> {
    match adapter.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| EngineError::invalid(section, key, format!("expected an integer, got '{raw}'"))),
    }
}

fn f64_or(adapter: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
    Ok(optional_f64(adapter, section, key)?.unwrap_or(default))
}

/// Both keys, or neither.
fn optional_pair(
    adapter: &dyn ConfigPort,
    fast_key: &str,
    slow_key: &str,
) -> Result<Option<MovingAveragePair>, EngineError> {
    let fast = optional_usize(adapter, "indicators", fast_key)?;
    let slow = optional_usize(adapter, "indicators", slow_key)?;
    match (fast, slow) {
        (Some(fast), Some(slow)) => Ok(Some(MovingAveragePair { fast, slow })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(missing("indicators", slow_key)),
        (None, Some(_)) => Err(missing("indicators", fast_key)),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, EngineError> {
    let ticker = adapter
        .get_string("backtest", "ticker")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing("backtest", "ticker"))?;
    let defaults = BacktestConfig::default();

    Ok(BacktestConfig {
        ticker,
        period_tested: adapter
            .get_string("backtest", "period")
            .filter(|p| !p.trim().is_empty()),
        interval_tested: adapter.get_string("backtest", "interval").unwrap_or_default(),
        initial_capital: f64_or(adapter, "backtest", "initial_capital", defaults.initial_capital)?,
        leverage: f64_or(adapter, "backtest", "leverage", defaults.leverage)?,
    })
}

pub fn build_indicator_params(adapter: &dyn ConfigPort) -> Result<IndicatorParams, EngineError> {
    let bollinger = match optional_usize(adapter, "indicators", "bb_period")? {
        Some(period) => Some(BollingerParams {
            period,
            std_dev: f64_or(adapter, "indicators", "bb_std_dev", DEFAULT_BB_STD_DEV)?,
        }),
        None => None,
    };

    let rsi = match optional_usize(adapter, "indicators", "rsi_period")? {
        Some(period) => Some(RsiParams {
            period,
            overbought: f64_or(adapter, "indicators", "rsi_overbought", DEFAULT_RSI_OVERBOUGHT)?,
            oversold: f64_or(adapter, "indicators", "rsi_oversold", DEFAULT_RSI_OVERSOLD)?,
        }),
        None => None,
    };

    let macd = match optional_pair(adapter, "macd_fast", "macd_slow")? {
        Some(pair) => Some(MacdParams {
            fast: pair.fast,
            slow: pair.slow,
            signal: optional_usize(adapter, "indicators", "macd_signal")?
                .unwrap_or(DEFAULT_MACD_SIGNAL),
        }),
        None => None,
    };

    let volume_spike = match optional_usize(adapter, "indicators", "volume_spike_window")? {
        Some(window) => Some(VolumeSpikeParams {
            window,
            multiplier: f64_or(
                adapter,
                "indicators",
                "volume_spike_multiplier",
                DEFAULT_VOLUME_SPIKE_MULTIPLIER,
            )?,
        }),
        None => None,
    };

    Ok(IndicatorParams {
        sma: optional_pair(adapter, "sma_fast", "sma_slow")?,
        ema: optional_pair(adapter, "ema_fast", "ema_slow")?,
        bollinger,
        atr_period: optional_usize(adapter, "indicators", "atr_period")?,
        rsi,
        macd,
        breakout_window: optional_usize(adapter, "indicators", "breakout_window")?,
        volume_spike,
    })
}

/// Comma-separated expression names; blanks are dropped.
pub fn parse_slot(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A `preset` key selects a built-in strategy; explicit slot keys override
/// the preset's slots.
pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, EngineError> {
    let mut strategy = match adapter
        .get_string("strategy", "preset")
        .filter(|p| !p.trim().is_empty())
    {
        Some(name) => StrategyConfig::preset(name.trim())?,
        None => StrategyConfig::default(),
    };

    for slot in Slot::ALL {
        if let Some(raw) = adapter.get_string("strategy", slot.name()) {
            let names = parse_slot(&raw);
            match slot {
                Slot::LongEntry => strategy.long_entry = names,
                Slot::ShortEntry => strategy.short_entry = names,
                Slot::LongExit => strategy.long_exit = names,
                Slot::ShortExit => strategy.short_exit = names,
            }
        }
    }
    Ok(strategy)
}

pub fn build_risk_config(adapter: &dyn ConfigPort) -> Result<RiskConfig, EngineError> {
    let defaults = RiskConfig::default();
    let mode = match adapter.get_string("risk", "mode") {
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| EngineError::invalid("risk", "mode", reason))?,
        None => defaults.mode,
    };

    Ok(RiskConfig {
        mode,
        stop_loss: f64_or(adapter, "risk", "stop_loss", defaults.stop_loss)?,
        take_profit: f64_or(adapter, "risk", "take_profit", defaults.take_profit)?,
        spread_pct: f64_or(adapter, "risk", "spread_pct", defaults.spread_pct)?,
        slippage_pct: f64_or(adapter, "risk", "slippage_pct", defaults.slippage_pct)?,
    })
}

pub fn build_sizing_config(adapter: &dyn ConfigPort) -> Result<PositionSizingConfig, EngineError> {
    let defaults = PositionSizingConfig::default();
    Ok(PositionSizingConfig {
        volatility_threshold: f64_or(adapter, "sizing", "volatility_threshold", defaults.volatility_threshold)?,
        high_vol_fraction: f64_or(adapter, "sizing", "high_vol_fraction", defaults.high_vol_fraction)?,
        low_vol_base_fraction: f64_or(adapter, "sizing", "low_vol_base_fraction", defaults.low_vol_base_fraction)?,
        performance_window: optional_usize(adapter, "sizing", "performance_window")?
            .unwrap_or(defaults.performance_window),
        volatility_lookback_minutes: optional_i64(adapter, "sizing", "volatility_lookback_minutes")?
            .unwrap_or(defaults.volatility_lookback_minutes),
    })
}

/// `section.key` for every entry no builder reads.
pub fn unrecognized_keys(adapter: &dyn ConfigPort) -> Vec<String> {
    let mut unknown = Vec::new();
    for section in adapter.sections() {
        let known = KNOWN_KEYS
            .iter()
            .find(|(name, _)| *name == section)
            .map(|(_, keys)| *keys);
        for key in adapter.keys(&section) {
            if !known.is_some_and(|keys| keys.contains(&key.as_str())) {
                unknown.push(format!("{section}.{key}"));
            }
        }
    }
    unknown
}

pub fn build_run_config(adapter: &dyn ConfigPort) -> Result<RunConfig, EngineError> {
    for key in unrecognized_keys(adapter) {
        warn!(key = %key, "ignoring unrecognized config key");
    }
    Ok(RunConfig {
        backtest: build_backtest_config(adapter)?,
        indicators: build_indicator_params(adapter)?,
        strategy: build_strategy_config(adapter)?,
        risk: build_risk_config(adapter)?,
        sizing: build_sizing_config(adapter)?,
    })
}

/// Load, validate, and compile a configuration file.
pub fn prepare(config_path: &Path) -> Result<(RunConfig, CompiledStrategy), EngineError> {
    let adapter = load_config(config_path)?;
    let run_config = build_run_config(&adapter)?;
    validate_all(
        &run_config.indicators,
        &run_config.risk,
        &run_config.sizing,
        &run_config.backtest,
    )?;
    let compiled = CompiledStrategy::compile(&run_config.strategy, &run_config.indicators)?;
    Ok((run_config, compiled))
}

fn print_plan(run_config: &RunConfig, compiled: &CompiledStrategy) {
    eprintln!("\nTicker:   {}", run_config.backtest.ticker);
    eprintln!("Capital:  {:.2} (leverage {})", run_config.backtest.initial_capital, run_config.backtest.leverage);
    eprintln!("Risk:     {} stop {} / target {}", run_config.risk.mode, run_config.risk.stop_loss, run_config.risk.take_profit);

    eprintln!("\nStrategy slots:");
    for slot in Slot::ALL {
        let names: Vec<&str> = compiled.slot(slot).iter().map(|e| e.name.as_str()).collect();
        eprintln!("  {:<12} {}", slot.name(), names.join(", "));
    }

    eprintln!("\nIndicators to compute:");
    for t in run_config.indicators.indicator_types() {
        eprintln!("  {t}");
    }
    eprintln!("\nWarm-up gate: {} bars", compiled.warmup_gate());
}

fn print_summary(result: &BacktestResult) {
    let r = &result.report;
    eprintln!("\n=== {} ===", r.ticker);
    eprintln!("Bars:             {}", r.total_data_points);
    eprintln!("Total Trades:     {}", r.total_trades);
    eprintln!("Win Rate:         {:.1}%", r.win_rate_pct);
    eprintln!("Net Profit:       {:.2}", r.net_profit);
    eprintln!("Profit Factor:    {:.2}", r.profit_factor);
    eprintln!("Max Drawdown:     {:.2}%", r.max_drawdown_percentage);
    eprintln!("Sharpe/trade:     {:.4}", r.sharpe_ratio_simplified_per_trade);
}

fn emit(result: &BacktestResult, output: Option<&Path>) -> Result<(), EngineError> {
    let adapter = JsonReportAdapter::new();
    match output {
        Some(path) => {
            adapter.write(&result.report, &result.trades, path)?;
            eprintln!("\nReport written to: {}", path.display());
        }
        None => println!("{}", adapter.render(&result.report, &result.trades)?),
    }
    Ok(())
}

fn run_backtest(config_path: &Path, data_dir: &Path, output: Option<&Path>) -> ExitCode {
    // Stage 1: Load, validate, and compile config
    eprintln!("Loading config from {}", config_path.display());
    let (run_config, _) = match prepare(config_path) {
        Ok(prepared) => prepared,
        Err(e) => return fail(&e),
    };

    // Stage 2: Fetch bars
    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let bars = match data_port.fetch_bars(&run_config.backtest.ticker) {
        Ok(bars) => bars,
        Err(e) => return fail(&e),
    };
    eprintln!("Loaded {} bars for {}", bars.len(), run_config.backtest.ticker);

    // Stage 3: Run backtest
    let result = match run_config.run(&bars) {
        Ok(result) => result,
        Err(e) => return fail(&e),
    };

    // Stage 4: Summary and report
    print_summary(&result);
    match emit(&result, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

pub fn run_dry_run(config_path: &Path, data_dir: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let (run_config, compiled) = match prepare(config_path) {
        Ok(prepared) => prepared,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");
    print_plan(&run_config, &compiled);

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let bars = match data_port
        .fetch_bars(&run_config.backtest.ticker)
        .and_then(|bars| validate_series(&bars).map(|()| bars))
    {
        Ok(bars) => bars,
        Err(e) => return fail(&e),
    };
    eprintln!("\nData: {} bars", bars.len());
    if bars.len() <= compiled.warmup_gate() {
        eprintln!("warning: series is no longer than the warm-up gate, no signals can fire");
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    match prepare(config_path) {
        Ok((run_config, compiled)) => {
            print_plan(&run_config, &compiled);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_sweep(data_dir: &Path, config_paths: &[PathBuf], output_dir: Option<&Path>) -> ExitCode {
    let mut trials = Vec::with_capacity(config_paths.len());
    for path in config_paths {
        match prepare(path) {
            Ok((run_config, _)) => trials.push(run_config),
            Err(e) => {
                eprintln!("error in {}:", path.display());
                return fail(&e);
            }
        }
    }
    let Some(first) = trials.first() else {
        eprintln!("error: no configurations given");
        return ExitCode::from(2);
    };

    let ticker = first.backtest.ticker.clone();
    let bars = match CsvAdapter::new(data_dir.to_path_buf()).fetch_bars(&ticker) {
        Ok(bars) => bars,
        Err(e) => return fail(&e),
    };
    eprintln!("Running {} trials over {} bars of {}", trials.len(), bars.len(), ticker);

    let results = TrialRunner::new().run(&bars, &trials);
    let adapter = JsonReportAdapter::new();
    let mut reports = Vec::new();
    let mut exit = ExitCode::SUCCESS;

    for (path, result) in config_paths.iter().zip(&results) {
        match result {
            Ok(result) => {
                eprintln!(
                    "  {}: {} trades, net {:.2}, win rate {:.1}%",
                    path.display(),
                    result.report.total_trades,
                    result.report.net_profit,
                    result.report.win_rate_pct
                );
                match output_dir {
                    Some(dir) => {
                        let stem = path.file_stem().map_or_else(
                            || "trial".to_string(),
                            |s| s.to_string_lossy().into_owned(),
                        );
                        let out = dir.join(format!("{stem}.json"));
                        if let Err(e) = adapter.write(&result.report, &result.trades, &out) {
                            exit = fail(&e);
                        }
                    }
                    None => reports.push(&result.report),
                }
            }
            Err(e) => {
                eprintln!("  {}: failed", path.display());
                exit = fail(e);
            }
        }
    }

    if output_dir.is_none() {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                return fail(&EngineError::Report {
                    reason: format!("failed to serialize reports: {e}"),
                });
            }
        }
    }
    exit
}

fn run_presets() -> ExitCode {
    for preset in PRESETS {
        println!("{}", preset.name);
        let config = preset.config();
        for slot in Slot::ALL {
            let names = config.slot(slot);
            if !names.is_empty() {
                println!("  {:<12} {}", slot.name(), names.join(", "));
            }
        }
    }
    ExitCode::SUCCESS
}
