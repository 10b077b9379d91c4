//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::signal_manager::SignalManager;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::code_data::{build_unified_timeline, CodeData};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::TrendtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{BuyAndHold, FollowTrend, Strategy, StrategyKind, StrategyProperties};
use crate::domain::tick::build_ticks;
use crate::domain::universe::{parse_codes, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(
    name = "trendtrader",
    about = "Backtest buy-and-hold and trend-following strategies on daily bars"
)]
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
        /// Directory of {CODE}_{EXCHANGE}.csv files, overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Directory for records.csv, fills.csv and equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// buy_and_hold or follow_trend, overrides [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available symbols on an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            strategy,
            code,
            exchange,
        } => run_backtest(
            &config,
            data.as_deref(),
            output.as_deref(),
            strategy.as_deref(),
            code.as_deref(),
            exchange.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols {
            exchange,
            data,
            config,
        } => run_list_symbols(&exchange, data.as_deref(), config.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendtraderError> {
    FileConfigAdapter::from_file(path)
}

/// Directory relative config paths resolve against.
fn config_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

pub fn resolve_data_dir(
    data_override: Option<&Path>,
    config: &dyn ConfigPort,
    base_dir: &Path,
) -> PathBuf {
    if let Some(dir) = data_override {
        return dir.to_path_buf();
    }
    let configured = config
        .get_string("data", "path")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    base_dir.join(configured)
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_dir: Option<&Path>,
    strategy_override: Option<&str>,
    code_override: Option<&str>,
    exchange_override: Option<&str>,
) -> Result<(), TrendtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let kind = build_strategy_kind(strategy_override, &adapter)?;
    let properties = StrategyProperties::from_config(&adapter);
    let bt_config = build_backtest_config(&adapter)?;
    let codes = resolve_codes(code_override, &adapter)?;
    let exchange = resolve_exchange(exchange_override, &adapter)?;

    let base_dir = config_dir(config_path);
    let data_dir = resolve_data_dir(data_override, &adapter, &base_dir);
    let router = SignalManager::from_config(&adapter, &base_dir)?;
    let mut strategy = build_strategy(kind, router);

    eprintln!(
        "Strategy: {} (refresh_period={}, window_length={})",
        kind, properties.refresh_period, properties.window_length
    );
    eprintln!(
        "Validating {} codes on {} from {}...",
        codes.len(),
        exchange,
        data_dir.display()
    );

    let data_port = CsvAdapter::new(data_dir);
    let result = run_backtest_pipeline(
        &data_port,
        strategy.as_mut(),
        &properties,
        &bt_config,
        &codes,
        &exchange,
        min_bars_for(kind, &properties),
    )?;

    let metrics = Metrics::compute(&result, bt_config.risk_free_rate);
    print_summary(&result, &metrics);

    let output = output_dir.map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), Path::to_path_buf);
    CsvReportAdapter::new().write(&result, &output)?;
    eprintln!("\nReport written to: {}", output.display());
    Ok(())
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TrendtraderError> {
    let start_date = parse_date(adapter.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string("backtest", "end_date").as_deref(), "end_date")?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0),
        commission_per_trade: adapter.get_double("backtest", "commission_per_trade", 0.0),
        commission_pct: adapter.get_double("backtest", "commission_pct", 0.0),
        slippage_pct: adapter.get_double("backtest", "slippage_pct", 0.0),
        allow_shorting: adapter.get_bool("backtest", "allow_shorting", false),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.05),
    })
}

/// Command line first, then `[strategy] name`.
pub fn build_strategy_kind(
    strategy_override: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<StrategyKind, TrendtraderError> {
    match strategy_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("strategy", "name"))
        .filter(|s| !s.trim().is_empty())
    {
        Some(name) => name.parse(),
        None => Err(TrendtraderError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        }),
    }
}

pub fn build_strategy(kind: StrategyKind, router: SignalManager) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::BuyAndHold => Box::new(BuyAndHold::new(router)),
        StrategyKind::FollowTrend => Box::new(FollowTrend::new()),
    }
}

/// Bars an instrument needs before the strategy can act on it.
pub fn min_bars_for(kind: StrategyKind, properties: &StrategyProperties) -> usize {
    match kind {
        StrategyKind::BuyAndHold => 1,
        StrategyKind::FollowTrend => properties.window_length,
    }
}

pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, TrendtraderError> {
    let raw = code_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "codes"))
        .or_else(|| config.get_string("backtest", "code"))
        .ok_or_else(|| TrendtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "code".into(),
        })?;
    Ok(parse_codes(&raw)?)
}

pub fn resolve_exchange(
    exchange_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, TrendtraderError> {
    exchange_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "exchange"))
        .map(|e| e.trim().to_uppercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| TrendtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "exchange".into(),
        })
}

/// Load and check the universe, build the tick stream and run the strategy.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &mut dyn Strategy,
    properties: &StrategyProperties,
    bt_config: &BacktestConfig,
    codes: &[String],
    exchange: &str,
    min_bars: usize,
) -> Result<BacktestResult, TrendtraderError> {
    let validation = validate_universe(
        data_port,
        codes.to_vec(),
        exchange,
        bt_config.start_date,
        bt_config.end_date,
        min_bars,
    )?;

    let code_data: Vec<CodeData> = validation
        .universe
        .codes
        .into_iter()
        .zip(validation.data)
        .map(|(code, ohlcv)| CodeData::new(code, exchange.to_string(), ohlcv))
        .collect();

    let timeline = build_unified_timeline(&code_data);
    let ticks = build_ticks(&code_data, &timeline);

    eprintln!(
        "Running backtest: {} codes, {} to {}",
        code_data.len(),
        bt_config.start_date,
        bt_config.end_date,
    );
    eprintln!("  Processing: {} dates", timeline.len());

    backtest_engine::run_backtest(&ticks, strategy, properties, bt_config)
}

fn print_summary(result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== Results: {} ===", result.strategy);
    eprintln!("Ticks:            {}", result.ticks_processed);
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!(
        "Max Drawdown:     -{:.1}% ({} days)",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    eprintln!(
        "Orders:           {} filled, {} rejected",
        metrics.orders_filled, metrics.orders_rejected
    );
    eprintln!(
        "Shares:           {} bought, {} sold",
        metrics.shares_bought, metrics.shares_sold
    );
    eprintln!("Realized PnL:     {:.2}", metrics.realized_pnl);
    eprintln!("Unrealized PnL:   {:.2}", metrics.unrealized_pnl);
    eprintln!("Commissions:      {:.2}", metrics.commissions_paid);

    if result.portfolio.holding_count() > 0 {
        eprintln!("\n=== Open Holdings ===");
        for holding in result.portfolio.holdings.values() {
            let last = result
                .last_prices
                .get(&holding.code)
                .copied()
                .unwrap_or(holding.average_price);
            eprintln!(
                "  {}: {} @ {:.2} (last {:.2}, unrealized {:.2})",
                holding.code,
                holding.quantity,
                holding.average_price,
                last,
                holding.unrealized_pnl(last)
            );
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), TrendtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let kind = build_strategy_kind(None, &adapter)?;
    let properties = StrategyProperties::from_config(&adapter);
    let bt_config = build_backtest_config(&adapter)?;
    let codes = resolve_codes(None, &adapter)?;
    let exchange = resolve_exchange(None, &adapter)?;
    let base_dir = config_dir(config_path);
    let manager = SignalManager::from_config(&adapter, &base_dir)?;

    eprintln!("\nStrategy:");
    eprintln!("  name:           {}", kind);
    if kind == StrategyKind::FollowTrend {
        eprintln!("  refresh_period: {}", properties.refresh_period);
        eprintln!("  window_length:  {}", properties.window_length);
    }
    eprintln!("\nManager:");
    eprintln!("  position_size:  {}", manager.position_size());
    eprintln!("  instructions:   {}", manager.pending_instructions());
    eprintln!("\nBacktest:");
    eprintln!("  period:         {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  capital:        {:.2}", bt_config.initial_capital);
    eprintln!("\nUniverse:");
    eprintln!("  exchange:       {}", exchange);
    eprintln!("  codes:          {}", codes.join(", "));
    eprintln!(
        "  data:           {}",
        resolve_data_dir(None, &adapter, &base_dir).display()
    );

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(
    exchange: &str,
    data_override: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), TrendtraderError> {
    let data_dir = match config_path {
        Some(path) => {
            let adapter = load_config(path)?;
            resolve_data_dir(data_override, &adapter, &config_dir(path))
        }
        None => data_override.map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), Path::to_path_buf),
    };

    let symbols = CsvAdapter::new(data_dir).list_symbols(exchange)?;
    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
