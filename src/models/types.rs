//! Type definitions for MetaGuard
//! All core data structures for transaction security analysis

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, AppResult};

/// Reason string carried by evidence values when their source could not be
/// reached. Also the marker the aggregator uses to recognize degraded
/// phishing evidence.
pub const SOURCE_UNAVAILABLE: &str = "source unavailable";

/// Risk classification for an analyzed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No significant concerns
    Low,
    /// Proceed with caution
    Medium,
    /// Likely to lose funds
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Severity attached to an individual security check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Fee scheme of a pending transaction, derived from which fee fields are
/// present. Determines which field the gas-fee rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// `gasPrice`-based transaction
    Legacy,
    /// `maxFeePerGas`/`maxPriorityFeePerGas`-based transaction
    Eip1559,
}

/// A pending transaction as handed over by the confirmation flow.
///
/// All numeric fields are unsigned 256-bit integers encoded as decimal
/// (or `0x`-prefixed hex) strings and are parsed with arbitrary-precision
/// arithmetic, never through native floats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Destination address; `None` signals contract creation
    #[serde(default)]
    pub to: Option<String>,
    pub from: String,
    /// Value in wei
    #[serde(default = "default_value")]
    pub value: String,
    /// Calldata, `0x`-prefixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
}

fn default_value() -> String {
    "0".to_string()
}

impl Transaction {
    /// Presence of `maxFeePerGas` decides the kind
    pub fn kind(&self) -> TransactionKind {
        if self.max_fee_per_gas.is_some() {
            TransactionKind::Eip1559
        } else {
            TransactionKind::Legacy
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// True when the transaction carries non-empty calldata
    pub fn has_calldata(&self) -> bool {
        matches!(&self.data, Some(d) if !d.is_empty() && d != "0x")
    }

    /// Transaction value as a 256-bit integer
    pub fn value_wei(&self) -> AppResult<U256> {
        parse_wei(&self.value)
    }
}

/// Parse a decimal (or `0x`-prefixed hex) unsigned 256-bit integer string.
pub fn parse_wei(s: &str) -> AppResult<U256> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AppError::invalid_transaction("empty integer field"));
    }
    let parsed = match s.strip_prefix("0x") {
        Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|e| AppError::invalid_transaction(format!("bad integer '{}': {}", s, e)))
}

/// One rule or evidence check evaluated during an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityCheck {
    pub name: String,
    pub passed: bool,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Contract verification evidence.
///
/// A populated `error` means the evidence was unavailable; that is a
/// degraded-but-safe state and is never treated as verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfo {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContractInfo {
    pub fn verified(name: Option<String>) -> Self {
        Self {
            verified: true,
            name,
            error: None,
        }
    }

    pub fn unverified(name: Option<String>) -> Self {
        Self {
            verified: false,
            name,
            error: None,
        }
    }

    /// Evidence-unavailable result
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            name: None,
            error: Some(error.into()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.error.is_some()
    }
}

/// Phishing reputation evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhishingResult {
    pub is_phishing: bool,
    /// Certainty of the verdict, in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PhishingResult {
    pub fn clean(confidence: f64) -> Self {
        Self {
            is_phishing: false,
            confidence,
            reason: None,
        }
    }

    pub fn flagged(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            is_phishing: true,
            confidence,
            reason: Some(reason.into()),
        }
    }

    /// Failure-safe default when a reputation source cannot be reached.
    /// Low confidence, never a full-confidence "safe".
    pub fn source_unavailable() -> Self {
        Self {
            is_phishing: false,
            confidence: 0.5,
            reason: Some(SOURCE_UNAVAILABLE.to_string()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        !self.is_phishing && self.reason.as_deref() == Some(SOURCE_UNAVAILABLE)
    }
}

/// Derived risk verdict; lives only inside the report that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Model score in [0, 1]
    pub risk_score: f64,
    pub details: Vec<String>,
}

/// The structured verdict for one analyzed transaction.
/// Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub risk: RiskLevel,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub security_checks: Vec<SecurityCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_info: Option<ContractInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phishing_results: Option<PhishingResult>,
    pub risk_assessment: RiskAssessment,
    /// Unix millis at which the report was finalized; non-decreasing
    /// across calls within a process
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wei_decimal() {
        assert_eq!(
            parse_wei("2000000000000000000").unwrap(),
            U256::from(2_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_wei_hex() {
        assert_eq!(parse_wei("0x4a817c800").unwrap(), U256::from(20_000_000_000u64));
    }

    #[test]
    fn test_parse_wei_rejects_garbage() {
        assert!(parse_wei("").is_err());
        assert!(parse_wei("not-a-number").is_err());
        assert!(parse_wei("-5").is_err());
    }

    #[test]
    fn test_parse_wei_huge_value() {
        // 2^255, far beyond u128
        let huge = "57896044618658097711785492504343953926634992332820282019728792003956564819968";
        assert!(parse_wei(huge).is_ok());
    }

    #[test]
    fn test_kind_from_fee_fields() {
        let legacy = Transaction {
            to: Some("0x456".into()),
            from: "0x123".into(),
            value: "0".into(),
            data: None,
            gas_price: Some("200000000000".into()),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };
        assert_eq!(legacy.kind(), TransactionKind::Legacy);

        let eip1559 = Transaction {
            max_fee_per_gas: Some("200000000000".into()),
            ..legacy
        };
        assert_eq!(eip1559.kind(), TransactionKind::Eip1559);
    }

    #[test]
    fn test_has_calldata() {
        let mut tx = Transaction {
            to: None,
            from: "0x123".into(),
            value: "0".into(),
            data: None,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };
        assert!(!tx.has_calldata());
        tx.data = Some("0x".into());
        assert!(!tx.has_calldata());
        tx.data = Some("0xa9059cbb".into());
        assert!(tx.has_calldata());
    }

    #[test]
    fn test_risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
    }

    #[test]
    fn test_source_unavailable_marker() {
        assert!(PhishingResult::source_unavailable().is_unavailable());
        assert!(!PhishingResult::clean(1.0).is_unavailable());
        assert!(!PhishingResult::flagged(0.9, SOURCE_UNAVAILABLE).is_unavailable());
    }

    #[test]
    fn test_transaction_deserializes_null_to() {
        let tx: Transaction =
            serde_json::from_str(r#"{"from":"0x123","to":null,"value":"0"}"#).unwrap();
        assert!(tx.is_contract_creation());

        let tx: Transaction = serde_json::from_str(r#"{"from":"0x123"}"#).unwrap();
        assert!(tx.is_contract_creation());
        assert_eq!(tx.value, "0");
    }
}
