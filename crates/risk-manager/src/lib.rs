//! Risk Manager
//!
//! Cycle risk assessment, exposure targets, price triggers and leverage warnings.

pub mod loan_advisor;
pub mod risk_engine;
pub mod triggers;

pub use loan_advisor::{LoanAdvisor, LoanAdvisorConfig, LoanSeverity, LoanWarning};
pub use risk_engine::{RiskAssessment, RiskEngine, RiskLevel, Urgency};
pub use triggers::{price_triggers, PriceTrigger, TriggerDirection};
