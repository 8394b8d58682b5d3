//! Collateralized lending positions held on external protocols.

use serde::{Deserialize, Serialize};

/// Liquidation LTV assumed when a protocol does not report one.
pub const DEFAULT_MAX_LTV: f64 = 0.85;

/// A lending position as reported by a protocol collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingPosition {
    pub protocol: String,
    pub collateral_mint: String,
    pub collateral_amount: f64,
    pub debt_mint: String,
    pub debt_amount: f64,
    /// Loan-to-value in percent (e.g. 45.5).
    pub ltv: f64,
    /// Price of the collateral at which the position is liquidated.
    /// Zero when the protocol did not report one.
    #[serde(default)]
    pub liquidation_price: f64,
    /// Current price of the collateral.
    pub current_price: f64,
}

impl LendingPosition {
    /// Percentage the collateral price can fall before liquidation.
    ///
    /// Returns 100 when no liquidation price is set and 0 when the current
    /// price is unusable.
    pub fn liquidation_distance_pct(&self) -> f64 {
        if !(self.liquidation_price > 0.0) {
            return 100.0;
        }
        if !(self.current_price > 0.0) {
            return 0.0;
        }
        (self.current_price - self.liquidation_price) / self.current_price * 100.0
    }

    /// Estimate the liquidation price from collateral and debt amounts.
    pub fn estimated_liquidation_price(&self, max_ltv: f64) -> f64 {
        if self.collateral_amount <= 0.0 || max_ltv <= 0.0 {
            return 0.0;
        }
        self.debt_amount / (self.collateral_amount * max_ltv)
    }
}
