//! Evidence-source boundaries consumed by the risk aggregator
//!
//! Each trait wraps one independently-failing external read. Production
//! implementations live in `providers/` and `core/model.rs`; tests inject
//! their own. Implementations resolve their failures internally and hand
//! back degraded evidence values instead of errors.

use async_trait::async_trait;

use crate::core::model::TransactionFeatures;
use crate::models::types::{ContractInfo, PhishingResult};

/// Source of contract verification evidence for a destination address
#[async_trait]
pub trait ContractInfoSource: Send + Sync {
    /// Lookup failures surface as `ContractInfo` with `error` set
    async fn contract_info(&self, address: &str) -> ContractInfo;
}

/// Source of phishing reputation evidence for a destination address
#[async_trait]
pub trait PhishingSource: Send + Sync {
    /// Source outages surface as a low-confidence "not phishing" result
    async fn check_address(&self, address: &str) -> PhishingResult;
}

/// Scoring model mapping transaction features to a risk score in [0, 1]
#[async_trait]
pub trait RiskModel: Send + Sync {
    async fn predict(&self, features: &TransactionFeatures) -> f64;
}
