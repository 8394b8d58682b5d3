//! On-chain indicator snapshot types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::{Error, Result};

/// Snapshots older than this are flagged as stale (warning only).
pub const STALE_AFTER_HOURS: f64 = 48.0;

/// Ratio metrics scored by the bottom and top classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Mvrv,
    SthMvrv,
    LthMvrv,
    MayerMultiple,
    RealizedPriceRatio,
    LthSopr,
    AvivRatio,
    CvddRatio,
    TerminalPriceRatio,
}

impl Indicator {
    /// Display name used in signals, convergences and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Mvrv => "MVRV",
            Indicator::SthMvrv => "STH MVRV",
            Indicator::LthMvrv => "LTH MVRV",
            Indicator::MayerMultiple => "Mayer Multiple",
            Indicator::RealizedPriceRatio => "Realized Price Ratio",
            Indicator::LthSopr => "LTH SOPR",
            Indicator::AvivRatio => "AVIV Ratio",
            Indicator::CvddRatio => "CVDD Ratio",
            Indicator::TerminalPriceRatio => "Terminal Price Ratio",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated set of on-chain metrics at a point in time.
///
/// Loaders build this through [`RawIndicatorSnapshot::validate`]; every
/// metric is finite and `price` is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    /// Spot price of BTC in USD.
    pub price: f64,
    pub realized_price: f64,
    /// Short-term holder cost basis.
    pub sth_cost_basis: f64,
    /// 200-day simple moving average.
    pub sma_200: f64,
    pub true_market_mean: f64,
    pub cvdd_floor: f64,
    pub terminal_price: f64,
    pub mvrv: f64,
    pub sth_mvrv: f64,
    pub lth_mvrv: f64,
    pub mayer_multiple: f64,
    pub realized_price_ratio: f64,
    pub lth_sopr: f64,
    pub aviv_ratio: f64,
    pub cvdd_ratio: f64,
    pub terminal_price_ratio: f64,
}

impl IndicatorSnapshot {
    /// Raw value of a scored ratio metric.
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Mvrv => self.mvrv,
            Indicator::SthMvrv => self.sth_mvrv,
            Indicator::LthMvrv => self.lth_mvrv,
            Indicator::MayerMultiple => self.mayer_multiple,
            Indicator::RealizedPriceRatio => self.realized_price_ratio,
            Indicator::LthSopr => self.lth_sopr,
            Indicator::AvivRatio => self.aviv_ratio,
            Indicator::CvddRatio => self.cvdd_ratio,
            Indicator::TerminalPriceRatio => self.terminal_price_ratio,
        }
    }

    fn metrics(&self) -> [(&'static str, f64); 16] {
        [
            ("btcPrice", self.price),
            ("realizedPrice", self.realized_price),
            ("sthCostBasis", self.sth_cost_basis),
            ("sma200", self.sma_200),
            ("trueMarketMean", self.true_market_mean),
            ("cvddFloor", self.cvdd_floor),
            ("terminalPrice", self.terminal_price),
            ("mvrv", self.mvrv),
            ("sthMvrv", self.sth_mvrv),
            ("lthMvrv", self.lth_mvrv),
            ("mayerMultiple", self.mayer_multiple),
            ("realizedPriceRatio", self.realized_price_ratio),
            ("lthSopr", self.lth_sopr),
            ("avivRatio", self.aviv_ratio),
            ("cvddRatio", self.cvdd_ratio),
            ("terminalPriceRatio", self.terminal_price_ratio),
        ]
    }

    /// Re-check the snapshot invariants (finite metrics, positive price).
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.metrics() {
            if !value.is_finite() {
                return Err(Error::InvalidIndicator {
                    field,
                    reason: format!("expected a finite number but got {}", value),
                });
            }
        }
        if self.price <= 0.0 {
            return Err(Error::NonPositivePrice(self.price));
        }
        Ok(())
    }

    /// Classify the snapshot age relative to `now`.
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        match self.timestamp {
            Some(ts) => {
                let age_hours = (now - ts).num_seconds() as f64 / 3600.0;
                if age_hours > STALE_AFTER_HOURS {
                    Freshness::Stale { age_hours }
                } else {
                    Freshness::Fresh { age_hours }
                }
            }
            None => Freshness::Unknown,
        }
    }
}

/// Age classification of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    Fresh { age_hours: f64 },
    Stale { age_hours: f64 },
    /// No timestamp, or one that could not be parsed.
    Unknown,
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale { .. })
    }
}

/// Snapshot as it arrives from a provider or cache file, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndicatorSnapshot {
    pub timestamp: Option<String>,
    #[serde(alias = "price")]
    pub btc_price: Option<Value>,
    pub realized_price: Option<Value>,
    pub sth_cost_basis: Option<Value>,
    pub sma_200: Option<Value>,
    pub true_market_mean: Option<Value>,
    pub cvdd_floor: Option<Value>,
    pub terminal_price: Option<Value>,
    pub mvrv: Option<Value>,
    pub sth_mvrv: Option<Value>,
    pub lth_mvrv: Option<Value>,
    pub mayer_multiple: Option<Value>,
    pub realized_price_ratio: Option<Value>,
    pub lth_sopr: Option<Value>,
    pub aviv_ratio: Option<Value>,
    pub cvdd_ratio: Option<Value>,
    pub terminal_price_ratio: Option<Value>,
}

fn required(field: &'static str, value: Option<Value>) -> Result<f64> {
    let value = value.ok_or(Error::MissingIndicator { field })?;
    match value.as_f64() {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(Error::InvalidIndicator {
            field,
            reason: format!("expected a finite number but got {}", value),
        }),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl RawIndicatorSnapshot {
    /// Validate every required field and build an [`IndicatorSnapshot`].
    ///
    /// Fails on the first missing, non-numeric or non-finite field, and on a
    /// non-positive price. An unparseable timestamp is logged and dropped.
    pub fn validate(self) -> Result<IndicatorSnapshot> {
        let timestamp = match self.timestamp.as_deref() {
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    warn!(timestamp = %raw, "Invalid timestamp format in indicator data");
                }
                parsed
            }
            None => None,
        };

        let snapshot = IndicatorSnapshot {
            timestamp,
            price: required("btcPrice", self.btc_price)?,
            mvrv: required("mvrv", self.mvrv)?,
            sth_mvrv: required("sthMvrv", self.sth_mvrv)?,
            lth_mvrv: required("lthMvrv", self.lth_mvrv)?,
            mayer_multiple: required("mayerMultiple", self.mayer_multiple)?,
            realized_price_ratio: required("realizedPriceRatio", self.realized_price_ratio)?,
            lth_sopr: required("lthSopr", self.lth_sopr)?,
            aviv_ratio: required("avivRatio", self.aviv_ratio)?,
            cvdd_ratio: required("cvddRatio", self.cvdd_ratio)?,
            terminal_price_ratio: required("terminalPriceRatio", self.terminal_price_ratio)?,
            realized_price: required("realizedPrice", self.realized_price)?,
            sth_cost_basis: required("sthCostBasis", self.sth_cost_basis)?,
            sma_200: required("sma200", self.sma_200)?,
            true_market_mean: required("trueMarketMean", self.true_market_mean)?,
            cvdd_floor: required("cvddFloor", self.cvdd_floor)?,
            terminal_price: required("terminalPrice", self.terminal_price)?,
        };

        if snapshot.price <= 0.0 {
            return Err(Error::NonPositivePrice(snapshot.price));
        }

        Ok(snapshot)
    }
}
