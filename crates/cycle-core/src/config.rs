//! Configuration management for the cycle advisor.
//!
//! Two layers: [`AgentConfig`] comes from the environment (and `.env`), while
//! [`AnalysisConfig`] holds the threshold and exposure tables, which default to
//! the historical calibration and can be overridden from a TOML/JSON file.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::types::Indicator;
use crate::{Error, Result};

/// Watch / strong / extreme breakpoints for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTriple {
    pub watch: f64,
    pub strong: f64,
    pub extreme: f64,
}

impl ThresholdTriple {
    pub const fn new(watch: f64, strong: f64, extreme: f64) -> Self {
        Self {
            watch,
            strong,
            extreme,
        }
    }

    fn is_finite(&self) -> bool {
        self.watch.is_finite() && self.strong.is_finite() && self.extreme.is_finite()
    }
}

/// Bottom thresholds: lower values are more severe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottomThresholds {
    pub mvrv: ThresholdTriple,
    pub sth_mvrv: ThresholdTriple,
    pub mayer_multiple: ThresholdTriple,
    pub realized_price_ratio: ThresholdTriple,
    pub lth_sopr: ThresholdTriple,
    pub aviv_ratio: ThresholdTriple,
    pub cvdd_ratio: ThresholdTriple,
    pub terminal_price_ratio: ThresholdTriple,
    /// Reserved: accepted but classification stays lower-is-stronger.
    pub inverted: bool,
}

impl Default for BottomThresholds {
    fn default() -> Self {
        Self {
            mvrv: ThresholdTriple::new(1.0, 0.8, 0.6),
            sth_mvrv: ThresholdTriple::new(0.9, 0.8, 0.6),
            mayer_multiple: ThresholdTriple::new(0.8, 0.7, 0.5),
            realized_price_ratio: ThresholdTriple::new(1.1, 1.05, 1.0),
            lth_sopr: ThresholdTriple::new(0.95, 0.85, 0.75),
            aviv_ratio: ThresholdTriple::new(0.9, 0.8, 0.6),
            cvdd_ratio: ThresholdTriple::new(1.5, 1.2, 1.0),
            terminal_price_ratio: ThresholdTriple::new(0.3, 0.2, 0.15),
            inverted: false,
        }
    }
}

impl BottomThresholds {
    /// Indicators in classification order with their thresholds.
    pub fn entries(&self) -> [(Indicator, ThresholdTriple); 8] {
        [
            (Indicator::Mvrv, self.mvrv),
            (Indicator::SthMvrv, self.sth_mvrv),
            (Indicator::MayerMultiple, self.mayer_multiple),
            (Indicator::RealizedPriceRatio, self.realized_price_ratio),
            (Indicator::LthSopr, self.lth_sopr),
            (Indicator::AvivRatio, self.aviv_ratio),
            (Indicator::CvddRatio, self.cvdd_ratio),
            (Indicator::TerminalPriceRatio, self.terminal_price_ratio),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (indicator, t) in self.entries() {
            if !t.is_finite() {
                return Err(Error::config(format!(
                    "bottom threshold for {} is not finite",
                    indicator
                )));
            }
            if !(t.watch >= t.strong && t.strong >= t.extreme) {
                return Err(Error::config(format!(
                    "bottom threshold for {} must satisfy watch >= strong >= extreme",
                    indicator
                )));
            }
        }
        Ok(())
    }
}

/// Top thresholds: higher values are more severe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopThresholds {
    pub mvrv: ThresholdTriple,
    pub sth_mvrv: ThresholdTriple,
    pub mayer_multiple: ThresholdTriple,
    pub lth_mvrv: ThresholdTriple,
    pub aviv_ratio: ThresholdTriple,
    pub terminal_price_ratio: ThresholdTriple,
}

impl Default for TopThresholds {
    fn default() -> Self {
        Self {
            mvrv: ThresholdTriple::new(2.5, 3.0, 3.5),
            sth_mvrv: ThresholdTriple::new(1.3, 1.5, 1.8),
            mayer_multiple: ThresholdTriple::new(1.5, 2.0, 2.4),
            lth_mvrv: ThresholdTriple::new(3.0, 3.5, 4.0),
            aviv_ratio: ThresholdTriple::new(1.5, 2.0, 2.5),
            terminal_price_ratio: ThresholdTriple::new(0.7, 0.8, 0.9),
        }
    }
}

impl TopThresholds {
    pub fn entries(&self) -> [(Indicator, ThresholdTriple); 6] {
        [
            (Indicator::Mvrv, self.mvrv),
            (Indicator::SthMvrv, self.sth_mvrv),
            (Indicator::MayerMultiple, self.mayer_multiple),
            (Indicator::LthMvrv, self.lth_mvrv),
            (Indicator::AvivRatio, self.aviv_ratio),
            (Indicator::TerminalPriceRatio, self.terminal_price_ratio),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (indicator, t) in self.entries() {
            if !t.is_finite() {
                return Err(Error::config(format!(
                    "top threshold for {} is not finite",
                    indicator
                )));
            }
            if !(t.watch <= t.strong && t.strong <= t.extreme) {
                return Err(Error::config(format!(
                    "top threshold for {} must satisfy watch <= strong <= extreme",
                    indicator
                )));
            }
        }
        Ok(())
    }
}

fn validate_table(name: &str, table: &[u8]) -> Result<()> {
    if table.iter().any(|&v| v > 100) {
        return Err(Error::config(format!("{} entries must be within 0..=100", name)));
    }
    if table.windows(2).any(|w| w[1] < w[0]) {
        return Err(Error::config(format!(
            "{} must be monotonically non-decreasing",
            name
        )));
    }
    Ok(())
}

/// Target exposure percent indexed by bottom score (0..=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BottomExposureMap(pub [u8; 9]);

impl Default for BottomExposureMap {
    fn default() -> Self {
        Self([0, 15, 25, 40, 50, 65, 75, 90, 100])
    }
}

impl BottomExposureMap {
    /// Exposure for a score; scores above the table use the last entry.
    pub fn lookup(&self, score: u8) -> u8 {
        self.0[usize::from(score).min(self.0.len() - 1)]
    }

    pub fn validate(&self) -> Result<()> {
        validate_table("bottom exposure map", &self.0)
    }
}

/// Percent of the risk asset to sell, indexed by top score (0..=6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopSellMap(pub [u8; 7]);

impl Default for TopSellMap {
    fn default() -> Self {
        Self([0, 15, 30, 50, 70, 85, 100])
    }
}

impl TopSellMap {
    pub fn lookup(&self, score: u8) -> u8 {
        self.0[usize::from(score).min(self.0.len() - 1)]
    }

    pub fn validate(&self) -> Result<()> {
        validate_table("top sell map", &self.0)
    }
}

/// LTV breakpoints for lending position warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanAdvisorConfig {
    /// LTV percent above which a position is dangerous.
    pub danger_ltv: f64,
    /// LTV percent above which a position needs attention.
    pub warning_ltv: f64,
    /// LTV percent above which top signals escalate a position.
    pub combined_ltv: f64,
    /// Top score at which the combined rule applies.
    pub combined_top_score: u8,
}

impl Default for LoanAdvisorConfig {
    fn default() -> Self {
        Self {
            danger_ltv: 80.0,
            warning_ltv: 65.0,
            combined_ltv: 50.0,
            combined_top_score: 2,
        }
    }
}

impl LoanAdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        let bands = [self.danger_ltv, self.warning_ltv, self.combined_ltv];
        if bands.iter().any(|v| !v.is_finite()) {
            return Err(Error::config("loan advisor LTV bands must be finite"));
        }
        if !(self.danger_ltv > self.warning_ltv && self.warning_ltv > 0.0) {
            return Err(Error::config(
                "loan advisor LTV bands must satisfy danger_ltv > warning_ltv > 0",
            ));
        }
        if self.combined_ltv < 0.0 {
            return Err(Error::config("loan advisor combined_ltv must not be negative"));
        }
        if self.combined_top_score == 0 || self.combined_top_score > 6 {
            return Err(Error::config(
                "loan advisor combined_top_score must be within 1..=6",
            ));
        }
        Ok(())
    }
}

/// Threshold and exposure tables used by the analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub bottom_thresholds: BottomThresholds,
    pub top_thresholds: TopThresholds,
    pub bottom_exposure: BottomExposureMap,
    pub top_sell: TopSellMap,
    pub loan_advisor: LoanAdvisorConfig,
}

impl AnalysisConfig {
    /// Load overrides from a TOML/JSON/YAML file; missing keys keep defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let parsed: AnalysisConfig = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        self.bottom_thresholds.validate()?;
        self.top_thresholds.validate()?;
        self.bottom_exposure.validate()?;
        self.top_sell.validate()?;
        self.loan_advisor.validate()?;
        if self.bottom_thresholds.inverted {
            warn!("bottom_thresholds.inverted is set but has no effect; using lower-is-stronger classification");
        }
        Ok(())
    }
}

/// Operating mode of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Analyze and report only.
    Alert,
    /// Analyze, report and size trades.
    Auto,
}

impl FromStr for AgentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alert" => Ok(AgentMode::Alert),
            "auto" => Ok(AgentMode::Auto),
            other => Err(Error::config(format!("unknown agent mode: {}", other))),
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentMode::Alert => f.write_str("alert"),
            AgentMode::Auto => f.write_str("auto"),
        }
    }
}

/// Fixed balances used in place of a live wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperWalletConfig {
    /// Risk asset balance in smallest units.
    pub native_balance: u64,
    /// Stable asset balance in smallest units.
    pub stable_balance: u64,
    /// Risk asset price in stable terms.
    pub native_price: f64,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub mode: AgentMode,
    pub indicators_path: PathBuf,
    /// Cached snapshot used when `indicators_path` is unavailable.
    pub indicators_fallback_path: Option<PathBuf>,
    pub positions_path: Option<PathBuf>,
    pub analysis_config_path: Option<PathBuf>,
    pub wallet_address: Option<String>,
    pub paper_wallet: Option<PaperWalletConfig>,
    /// Clamped to 1..=500.
    pub max_slippage_bps: u16,
    /// Clamped to 1..=100.
    pub max_trade_percent: u8,
    /// At least 1.
    pub loop_interval_minutes: u64,
    pub health_file: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::Alert,
            indicators_path: PathBuf::from("data/indicators.json"),
            indicators_fallback_path: None,
            positions_path: None,
            analysis_config_path: None,
            wallet_address: None,
            paper_wallet: None,
            max_slippage_bps: 100,
            max_trade_percent: 100,
            loop_interval_minutes: 30,
            health_file: PathBuf::from("/tmp/healthy"),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to defaults; out-of-range values are clamped.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| -> Option<i64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %raw, "Ignoring unparseable numeric setting");
                    None
                }
            }
        };

        let mode = match lookup("AGENT_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Unknown AGENT_MODE, defaulting to alert");
                AgentMode::Alert
            }),
            None => defaults.mode,
        };

        let paper_wallet = match (
            lookup("PAPER_NATIVE_BALANCE").and_then(|v| v.trim().parse::<u64>().ok()),
            lookup("PAPER_STABLE_BALANCE").and_then(|v| v.trim().parse::<u64>().ok()),
            lookup("PAPER_NATIVE_PRICE").and_then(|v| v.trim().parse::<f64>().ok()),
        ) {
            (Some(native_balance), Some(stable_balance), Some(native_price)) => {
                if !native_price.is_finite() || native_price <= 0.0 {
                    return Err(Error::config("PAPER_NATIVE_PRICE must be a positive number"));
                }
                Some(PaperWalletConfig {
                    native_balance,
                    stable_balance,
                    native_price,
                })
            }
            _ => None,
        };

        Ok(Self {
            mode,
            indicators_path: lookup("INDICATORS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.indicators_path),
            indicators_fallback_path: lookup("INDICATORS_FALLBACK_PATH").map(PathBuf::from),
            positions_path: lookup("POSITIONS_PATH").map(PathBuf::from),
            analysis_config_path: lookup("ANALYSIS_CONFIG").map(PathBuf::from),
            wallet_address: lookup("WALLET_ADDRESS").filter(|s| !s.trim().is_empty()),
            paper_wallet,
            max_slippage_bps: parse("MAX_SLIPPAGE_BPS")
                .map(|v| v.clamp(1, 500) as u16)
                .unwrap_or(defaults.max_slippage_bps),
            max_trade_percent: parse("MAX_TRADE_PERCENT")
                .map(|v| v.clamp(1, 100) as u8)
                .unwrap_or(defaults.max_trade_percent),
            loop_interval_minutes: parse("LOOP_INTERVAL_MINUTES")
                .map(|v| v.max(1) as u64)
                .unwrap_or(defaults.loop_interval_minutes),
            health_file: lookup("HEALTH_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.health_file),
        })
    }

    /// Load the analysis tables from the configured file, or use defaults.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        match &self.analysis_config_path {
            Some(path) => AnalysisConfig::from_file(path),
            None => Ok(AnalysisConfig::default()),
        }
    }
}
