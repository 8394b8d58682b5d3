//! Data collaborators: indicator snapshots, lending positions and balances.
//!
//! Network providers live outside this crate; everything here is either
//! file-backed or static so a cycle can run from cached data.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{IndicatorSnapshot, LendingPosition, RawIndicatorSnapshot, DEFAULT_MAX_LTV};
use crate::{Error, Result};

/// Provider of validated indicator snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch and validate the latest snapshot.
    async fn fetch(&self) -> Result<IndicatorSnapshot>;
}

/// Provider of open lending positions.
#[async_trait::async_trait]
pub trait LendingSource: Send + Sync {
    async fn positions(&self) -> Result<Vec<LendingPosition>>;
}

/// Wallet balances in smallest units, with the risk asset price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balances {
    pub native: u64,
    pub stable: u64,
    pub native_price: f64,
}

/// Provider of wallet balances.
#[async_trait::async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balances(&self) -> Result<Balances>;
}

async fn read_file(source_name: &str, path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::unavailable(
            source_name,
            format!("{} not found", path.display()),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Reads a snapshot from a JSON cache file.
pub struct FileIndicatorSource {
    path: PathBuf,
}

impl FileIndicatorSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl IndicatorSource for FileIndicatorSource {
    fn name(&self) -> &'static str {
        "indicator-file"
    }

    async fn fetch(&self) -> Result<IndicatorSnapshot> {
        let content = read_file(self.name(), &self.path).await?;
        let raw: RawIndicatorSnapshot = serde_json::from_str(&content)?;
        let snapshot = raw.validate()?;
        debug!(path = %self.path.display(), price = snapshot.price, "Loaded indicator snapshot");
        Ok(snapshot)
    }
}

/// Tries a primary source and falls back to a secondary one when the
/// primary is unavailable. Validation failures are returned as-is.
pub struct FallbackIndicatorSource<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackIndicatorSource<P, S>
where
    P: IndicatorSource,
    S: IndicatorSource,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait::async_trait]
impl<P, S> IndicatorSource for FallbackIndicatorSource<P, S>
where
    P: IndicatorSource,
    S: IndicatorSource,
{
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn fetch(&self) -> Result<IndicatorSnapshot> {
        match self.primary.fetch().await {
            Ok(snapshot) => Ok(snapshot),
            Err(Error::Unavailable { message, .. }) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.secondary.name(),
                    error = %message,
                    "Primary indicator source unavailable, using fallback"
                );
                self.secondary.fetch().await
            }
            Err(e) => Err(e),
        }
    }
}

/// Reads lending positions from a JSON array file. A missing file means no positions.
///
/// Positions without a usable liquidation price get one estimated from their
/// collateral and debt at [`DEFAULT_MAX_LTV`].
pub struct FileLendingSource {
    path: PathBuf,
}

impl FileLendingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl LendingSource for FileLendingSource {
    async fn positions(&self) -> Result<Vec<LendingPosition>> {
        let content = match read_file("positions-file", &self.path).await {
            Ok(content) => content,
            Err(Error::Unavailable { .. }) => {
                info!(path = %self.path.display(), "No positions file, assuming no open loans");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let mut positions: Vec<LendingPosition> = serde_json::from_str(&content)?;
        for position in positions.iter_mut().filter(|p| !(p.liquidation_price > 0.0)) {
            position.liquidation_price = position.estimated_liquidation_price(DEFAULT_MAX_LTV);
            debug!(
                protocol = %position.protocol,
                liquidation_price = position.liquidation_price,
                "Estimated missing liquidation price"
            );
        }
        debug!(count = positions.len(), "Loaded lending positions");
        Ok(positions)
    }
}

/// Lending source for setups without any loans.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLendingPositions;

#[async_trait::async_trait]
impl LendingSource for NoLendingPositions {
    async fn positions(&self) -> Result<Vec<LendingPosition>> {
        Ok(Vec::new())
    }
}

/// Fixed balances, used for paper runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticBalanceSource {
    balances: Balances,
}

impl StaticBalanceSource {
    pub fn new(balances: Balances) -> Self {
        Self { balances }
    }
}

#[async_trait::async_trait]
impl BalanceSource for StaticBalanceSource {
    async fn balances(&self) -> Result<Balances> {
        Ok(self.balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cycle-core-{}-{}", std::process::id(), name))
    }

    fn snapshot_json() -> serde_json::Value {
        json!({
            "timestamp": "2026-02-12",
            "btcPrice": 68040,
            "realizedPrice": 55548,
            "sthCostBasis": 92000,
            "sma200": 101702,
            "trueMarketMean": 79124,
            "cvddFloor": 46133,
            "terminalPrice": 290819,
            "mvrv": 1.22,
            "sthMvrv": 0.74,
            "lthMvrv": 2.1,
            "mayerMultiple": 0.67,
            "realizedPriceRatio": 1.22,
            "lthSopr": 0.82,
            "avivRatio": 0.95,
            "cvddRatio": 1.47,
            "terminalPriceRatio": 0.23
        })
    }

    fn sample_snapshot() -> IndicatorSnapshot {
        serde_json::from_value::<RawIndicatorSnapshot>(snapshot_json())
            .unwrap()
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn test_file_source_reads_snapshot() {
        let path = temp_path("indicators.json");
        std::fs::write(&path, snapshot_json().to_string()).unwrap();

        let snapshot = FileIndicatorSource::new(&path).fetch().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(snapshot.price, 68040.0);
        assert!(snapshot.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_file_source_missing_file_is_unavailable() {
        let err = FileIndicatorSource::new(temp_path("does-not-exist.json"))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_file_source_rejects_invalid_snapshot() {
        let path = temp_path("invalid.json");
        let mut value = snapshot_json();
        value["btcPrice"] = json!(-5);
        std::fs::write(&path, value.to_string()).unwrap();

        let err = FileIndicatorSource::new(&path).fetch().await.unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, Error::NonPositivePrice(_)));
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_unavailable() {
        let mut primary = MockIndicatorSource::new();
        primary.expect_name().return_const("primary");
        primary
            .expect_fetch()
            .times(1)
            .returning(|| Err(Error::unavailable("primary", "HTTP 503")));

        let mut secondary = MockIndicatorSource::new();
        secondary.expect_name().return_const("cache");
        secondary
            .expect_fetch()
            .times(1)
            .returning(|| Ok(sample_snapshot()));

        let source = FallbackIndicatorSource::new(primary, secondary);
        let snapshot = source.fetch().await.unwrap();
        assert_eq!(snapshot.mvrv, 1.22);
    }

    #[tokio::test]
    async fn test_fallback_does_not_mask_validation_errors() {
        let mut primary = MockIndicatorSource::new();
        primary.expect_name().return_const("primary");
        primary
            .expect_fetch()
            .times(1)
            .returning(|| Err(Error::MissingIndicator { field: "mvrv" }));

        let mut secondary = MockIndicatorSource::new();
        secondary.expect_name().return_const("cache");
        secondary.expect_fetch().never();

        let source = FallbackIndicatorSource::new(primary, secondary);
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::MissingIndicator { field: "mvrv" }));
    }

    #[tokio::test]
    async fn test_lending_file_missing_means_no_positions() {
        let source = FileLendingSource::new(temp_path("no-positions.json"));
        assert!(source.positions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lending_file_parses_positions() {
        let path = temp_path("positions.json");
        std::fs::write(
            &path,
            json!([{
                "protocol": "Kamino",
                "collateralMint": "So11111111111111111111111111111111111111112",
                "collateralAmount": 50,
                "debtMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "debtAmount": 3500,
                "ltv": 45.5,
                "liquidationPrice": 82.35,
                "currentPrice": 153.5
            }])
            .to_string(),
        )
        .unwrap();

        let positions = FileLendingSource::new(&path).positions().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].protocol, "Kamino");
        assert_eq!(positions[0].liquidation_price, 82.35);
    }

    #[tokio::test]
    async fn test_lending_file_estimates_missing_liquidation_price() {
        let path = temp_path("positions-no-liq.json");
        std::fs::write(
            &path,
            json!([
                {
                    "protocol": "Kamino",
                    "collateralMint": "native",
                    "collateralAmount": 50,
                    "debtMint": "stable",
                    "debtAmount": 3400,
                    "ltv": 45.5,
                    "currentPrice": 153.5
                },
                {
                    "protocol": "Marginfi",
                    "collateralMint": "native",
                    "collateralAmount": 10,
                    "debtMint": "stable",
                    "debtAmount": 850,
                    "ltv": 55.4,
                    "liquidationPrice": 0,
                    "currentPrice": 153.5
                }
            ])
            .to_string(),
        )
        .unwrap();

        let positions = FileLendingSource::new(&path).positions().await.unwrap();
        std::fs::remove_file(&path).ok();

        // debt / (collateral * 0.85)
        assert!((positions[0].liquidation_price - 80.0).abs() < 1e-9);
        assert!((positions[1].liquidation_price - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_static_balances() {
        let balances = Balances {
            native: 2_000_000_000,
            stable: 100_000_000,
            native_price: 150.0,
        };
        let source = StaticBalanceSource::new(balances);
        let fetched = tokio_test::block_on(source.balances()).unwrap();
        assert_eq!(fetched, balances);
    }
}
