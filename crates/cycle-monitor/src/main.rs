//! Cycle Monitor
//!
//! Scores cached BTC on-chain indicators for cycle bottoms and tops, prints a
//! report with exposure and loan guidance, and optionally sizes paper trades.

mod alert;
mod cycle;
mod report;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use cycle_core::config::{AgentConfig, AgentMode};
use cycle_core::sources::{
    Balances, FallbackIndicatorSource, FileIndicatorSource, FileLendingSource, IndicatorSource,
    LendingSource, NoLendingPositions, StaticBalanceSource,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trading_engine::{ExecutorConfig, PaperVenue, SwapExecutor, TradeSizer, TradeSizerConfig};

use crate::cycle::{AutoTrading, CycleOutcome, CycleRunner};

const DEFAULT_LOG_FILTER: &str =
    "cycle_monitor=info,cycle_core=info,signal_detector=info,risk_manager=info,trading_engine=info";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Alert,
    Auto,
}

impl From<ModeArg> for AgentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Alert => AgentMode::Alert,
            ModeArg::Auto => AgentMode::Auto,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "BTC on-chain cycle monitor", long_about = None)]
struct Cli {
    /// Operating mode (overrides AGENT_MODE)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Indicator snapshot JSON file (overrides INDICATORS_PATH)
    #[arg(long)]
    indicators: Option<PathBuf>,

    /// Lending positions JSON file (overrides POSITIONS_PATH)
    #[arg(long)]
    positions: Option<PathBuf>,

    /// Threshold and exposure table file (overrides ANALYSIS_CONFIG)
    #[arg(long)]
    analysis_config: Option<PathBuf>,

    /// Keep running on a fixed interval
    #[arg(long)]
    watch: bool,

    /// Minutes between cycles in watch mode (overrides LOOP_INTERVAL_MINUTES)
    #[arg(long)]
    interval_minutes: Option<u64>,

    /// Print the cycle outcome as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, config: &mut AgentConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(path) = &self.indicators {
            config.indicators_path = path.clone();
        }
        if let Some(path) = &self.positions {
            config.positions_path = Some(path.clone());
        }
        if let Some(path) = &self.analysis_config {
            config.analysis_config_path = Some(path.clone());
        }
        if let Some(minutes) = self.interval_minutes {
            config.loop_interval_minutes = minutes.max(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout carries only the report
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn touch_health_file(path: &Path) {
    let _ = std::fs::write(path, format!("{}", Utc::now().timestamp()));
}

fn indicator_source(config: &AgentConfig) -> Box<dyn IndicatorSource> {
    let primary = FileIndicatorSource::new(&config.indicators_path);
    match &config.indicators_fallback_path {
        Some(fallback) => Box::new(FallbackIndicatorSource::new(
            primary,
            FileIndicatorSource::new(fallback),
        )),
        None => Box::new(primary),
    }
}

fn lending_source(config: &AgentConfig) -> Box<dyn LendingSource> {
    match &config.positions_path {
        Some(path) => Box::new(FileLendingSource::new(path)),
        None => Box::new(NoLendingPositions),
    }
}

/// Auto mode needs a wallet and paper balances; otherwise fall back to alerts.
fn auto_trading(config: &AgentConfig) -> Option<AutoTrading> {
    if config.mode != AgentMode::Auto {
        return None;
    }
    let Some(wallet) = &config.wallet_address else {
        warn!("AGENT_MODE=auto requires WALLET_ADDRESS, falling back to alert mode");
        return None;
    };
    let Some(paper) = &config.paper_wallet else {
        warn!("Auto mode has no balance source configured (PAPER_* settings), falling back to alert mode");
        return None;
    };

    info!(
        wallet = %wallet,
        native = paper.native_balance,
        stable = paper.stable_balance,
        price = paper.native_price,
        "Auto mode enabled with paper balances"
    );
    let balances = Balances {
        native: paper.native_balance,
        stable: paper.stable_balance,
        native_price: paper.native_price,
    };
    Some(AutoTrading::new(
        Box::new(StaticBalanceSource::new(balances)),
        TradeSizer::new(TradeSizerConfig::from(config)),
        SwapExecutor::new(PaperVenue::new(paper.native_price), ExecutorConfig::default()),
    ))
}

fn emit(outcome: &CycleOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", report::render_report(outcome));
    }
    Ok(())
}

async fn watch(runner: &CycleRunner, config: &AgentConfig, json: bool) -> Result<()> {
    let period = Duration::from_secs(config.loop_interval_minutes * 60);
    let mut ticker = tokio::time::interval(period);
    info!(interval_minutes = config.loop_interval_minutes, "Watch mode started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match runner.run_once(Utc::now()).await {
                    Ok(outcome) => {
                        emit(&outcome, json)?;
                        touch_health_file(&config.health_file);
                    }
                    Err(e) => error!("Cycle failed: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AgentConfig::from_env()?;
    cli.apply(&mut config);
    let analysis = config.analysis_config()?;

    info!(
        mode = %config.mode,
        indicators = %config.indicators_path.display(),
        "Starting Cycle Monitor"
    );

    let mut runner = CycleRunner::new(&analysis, indicator_source(&config), lending_source(&config));
    if let Some(trading) = auto_trading(&config) {
        runner = runner.with_trading(trading);
    }

    if cli.watch {
        touch_health_file(&config.health_file);
        watch(&runner, &config, cli.json).await
    } else {
        let outcome = runner.run_once(Utc::now()).await?;
        emit(&outcome, cli.json)
    }
}
