//! MetaGuard Library
//!
//! Pre-signature transaction security analyzer. Collects contract
//! verification, phishing reputation and model scoring evidence for a
//! pending transaction and folds it into one deterministic, explainable
//! `SecurityReport`:
//! - rule checks for contract creation, high value and high gas fees
//! - independently-failing external lookups with safe-default degradation
//! - fail-closed verdicts: a failed analysis reads as high risk

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::analyzer::{GuardAnalyzer, SecurityAnalyzer};
pub use crate::core::evidence::{ContractInfoSource, PhishingSource, RiskModel};
pub use crate::core::model::{ModelWeights, TransactionFeatures, TransactionModel};
pub use crate::models::config::GuardConfig;
pub use crate::models::errors::{AppError, AppResult, ErrorCode};
pub use crate::models::types::{
    ContractInfo, PhishingResult, RiskAssessment, RiskLevel, SecurityCheck, SecurityReport,
    Severity, Transaction, TransactionKind,
};
pub use crate::providers::etherscan::{EtherscanClient, ExplorerApi, HttpExplorerApi};
pub use crate::providers::phishing::{PhishingDetector, PhishingFeed};
pub use crate::utils::cache::{CacheStats, ReputationCache};
