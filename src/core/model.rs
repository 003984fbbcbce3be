//! Transaction Scoring Model
//!
//! Maps numeric transaction features to a continuous risk score in [0, 1]
//! with a fixed-weight logistic layer. Scoring is an enhancement signal:
//! an uninitialized model contributes the lowest-risk score instead of
//! failing the analysis.

use alloy_primitives::U256;
use async_trait::async_trait;
use tracing::warn;

use crate::core::evidence::RiskModel;
use crate::models::errors::AppResult;
use crate::models::types::{parse_wei, Transaction};
use crate::utils::constants::{WEI_PER_ETH, WEI_PER_GWEI};

/// Scalar features extracted from a transaction.
///
/// Field order is fixed and must match the scorer's weight layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransactionFeatures {
    /// Value in ETH
    pub value_eth: f64,
    /// Max fee per gas in Gwei (0 for legacy transactions)
    pub max_fee_gwei: f64,
    /// Max priority fee per gas in Gwei
    pub max_priority_fee_gwei: f64,
    /// 1.0 when the transaction creates a contract
    pub contract_creation: f64,
    /// 1.0 when calldata is present
    pub has_data: f64,
}

impl TransactionFeatures {
    /// Extract features from a transaction. Pure; malformed optional fee
    /// fields degrade to zero, the value must parse.
    pub fn extract(tx: &Transaction) -> AppResult<Self> {
        Ok(Self {
            value_eth: scale_to_f64(tx.value_wei()?, WEI_PER_ETH),
            max_fee_gwei: optional_scaled(tx.max_fee_per_gas.as_deref(), WEI_PER_GWEI),
            max_priority_fee_gwei: optional_scaled(
                tx.max_priority_fee_per_gas.as_deref(),
                WEI_PER_GWEI,
            ),
            contract_creation: if tx.is_contract_creation() { 1.0 } else { 0.0 },
            has_data: if tx.has_calldata() { 1.0 } else { 0.0 },
        })
    }

    /// The feature vector in its fixed order
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.value_eth,
            self.max_fee_gwei,
            self.max_priority_fee_gwei,
            self.contract_creation,
            self.has_data,
        ]
    }
}

fn optional_scaled(field: Option<&str>, unit: U256) -> f64 {
    field
        .and_then(|s| parse_wei(s).ok())
        .map(|v| scale_to_f64(v, unit))
        .unwrap_or(0.0)
}

/// Scale a wei amount down by `unit`, dividing as integers before any
/// float conversion so very large on-chain values keep their high digits.
fn scale_to_f64(amount: U256, unit: U256) -> f64 {
    let whole = amount / unit;
    let frac = amount % unit;

    let whole_f = match u128::try_from(whole) {
        Ok(w) => w as f64,
        // Beyond u128 the fractional part is noise anyway
        Err(_) => return f64::MAX,
    };
    let unit_f = u128::try_from(unit).map(|u| u as f64).unwrap_or(f64::MAX);
    let frac_f = u128::try_from(frac).map(|f| f as f64).unwrap_or(0.0);

    whole_f + frac_f / unit_f
}

/// Fixed logistic weights, ordered as
/// [value_eth, max_fee_gwei, max_priority_fee_gwei, contract_creation, has_data]
#[derive(Debug, Clone)]
pub struct ModelWeights {
    pub weights: [f64; 5],
    pub bias: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            weights: [0.035, 0.004, 0.002, 1.6, 0.45],
            bias: -2.2,
        }
    }
}

/// Logistic scorer over the five transaction features
pub struct TransactionModel {
    weights: Option<ModelWeights>,
}

impl TransactionModel {
    /// Scorer with the built-in weights
    pub fn new() -> Self {
        Self {
            weights: Some(ModelWeights::default()),
        }
    }

    /// A model with no loaded weights; predicts 0
    pub fn uninitialized() -> Self {
        Self { weights: None }
    }

    pub fn with_weights(weights: ModelWeights) -> Self {
        Self {
            weights: Some(weights),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.weights.is_some()
    }

    /// Score a feature vector; always in [0, 1]
    pub fn score(&self, features: &TransactionFeatures) -> f64 {
        let Some(w) = &self.weights else {
            warn!("scoring model not initialized, returning default prediction");
            return 0.0;
        };

        let x = features.as_array();
        let z = w.bias
            + x.iter()
                .zip(w.weights.iter())
                .map(|(xi, wi)| xi * wi)
                .sum::<f64>();

        sigmoid(z).clamp(0.0, 1.0)
    }
}

impl Default for TransactionModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskModel for TransactionModel {
    async fn predict(&self, features: &TransactionFeatures) -> f64 {
        self.score(features)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(value: &str) -> Transaction {
        Transaction {
            to: Some("0x456".into()),
            from: "0x123".into(),
            value: value.into(),
            data: None,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    #[test]
    fn test_feature_extraction_value() {
        let features = TransactionFeatures::extract(&transfer("2000000000000000000")).unwrap();
        assert!((features.value_eth - 2.0).abs() < 1e-12);
        assert_eq!(features.contract_creation, 0.0);
        assert_eq!(features.has_data, 0.0);
    }

    #[test]
    fn test_feature_extraction_fractional_value() {
        let features = TransactionFeatures::extract(&transfer("1500000000000000000")).unwrap();
        assert!((features.value_eth - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_extraction_fees_and_flags() {
        let tx = Transaction {
            to: None,
            from: "0x123".into(),
            value: "0".into(),
            data: Some("0x60806040".into()),
            gas_price: None,
            max_fee_per_gas: Some("200000000000".into()),
            max_priority_fee_per_gas: Some("2000000000".into()),
        };
        let features = TransactionFeatures::extract(&tx).unwrap();
        assert!((features.max_fee_gwei - 200.0).abs() < 1e-9);
        assert!((features.max_priority_fee_gwei - 2.0).abs() < 1e-9);
        assert_eq!(features.contract_creation, 1.0);
        assert_eq!(features.has_data, 1.0);
    }

    #[test]
    fn test_feature_extraction_malformed_fee_degrades_to_zero() {
        let tx = Transaction {
            max_fee_per_gas: Some("garbage".into()),
            ..transfer("0")
        };
        let features = TransactionFeatures::extract(&tx).unwrap();
        assert_eq!(features.max_fee_gwei, 0.0);
    }

    #[test]
    fn test_feature_extraction_bad_value_is_error() {
        assert!(TransactionFeatures::extract(&transfer("not-a-number")).is_err());
    }

    #[test]
    fn test_huge_value_does_not_panic() {
        let huge = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let features = TransactionFeatures::extract(&transfer(huge)).unwrap();
        assert!(features.value_eth > 1e30);
    }

    #[test]
    fn test_uninitialized_model_predicts_zero() {
        let model = TransactionModel::uninitialized();
        let features = TransactionFeatures {
            value_eth: 1000.0,
            contract_creation: 1.0,
            has_data: 1.0,
            ..Default::default()
        };
        assert_eq!(model.score(&features), 0.0);
    }

    #[test]
    fn test_score_bounded() {
        let model = TransactionModel::new();
        let extreme = TransactionFeatures {
            value_eth: f64::MAX,
            max_fee_gwei: 1e6,
            max_priority_fee_gwei: 1e6,
            contract_creation: 1.0,
            has_data: 1.0,
        };
        let score = model.score(&extreme);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_riskier_features_score_higher() {
        let model = TransactionModel::new();
        let plain = TransactionFeatures::default();
        let risky = TransactionFeatures {
            value_eth: 50.0,
            contract_creation: 1.0,
            has_data: 1.0,
            ..Default::default()
        };
        assert!(model.score(&risky) > model.score(&plain));
    }
}
