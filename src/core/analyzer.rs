//! Risk Aggregation Engine
//!
//! Collects contract verification, phishing reputation and model scoring
//! evidence for a pending transaction and folds it into one deterministic
//! `SecurityReport`. The three evidence reads are independent and run
//! concurrently; the aggregator waits for all of them to settle before
//! deciding. Every failure path resolves into a valid report — the caller
//! never sees an error, and a failed analysis reads as high risk.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::evidence::{ContractInfoSource, PhishingSource, RiskModel};
use crate::core::model::{TransactionFeatures, TransactionModel};
use crate::models::config::GuardConfig;
use crate::models::errors::AppResult;
use crate::models::types::{
    ContractInfo, PhishingResult, RiskAssessment, RiskLevel, SecurityCheck, SecurityReport,
    Severity, Transaction, TransactionKind,
};
use crate::providers::etherscan::{EtherscanClient, HttpExplorerApi};
use crate::providers::phishing::PhishingDetector;
use crate::utils::constants::{HIGH_GAS_FEE_THRESHOLD_WEI, HIGH_VALUE_THRESHOLD_WEI};
use crate::utils::time::monotonic_millis;

/// The production analyzer wired to the real lookup components
pub type GuardAnalyzer =
    SecurityAnalyzer<EtherscanClient<HttpExplorerApi>, PhishingDetector, TransactionModel>;

/// Stateless orchestrator over the evidence gathered per call. The only
/// shared, persistent state lives inside the lookup components' caches.
pub struct SecurityAnalyzer<C, P, M> {
    contracts: C,
    phishing: P,
    model: M,
    lookup_timeout: Duration,
}

impl GuardAnalyzer {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            contracts: EtherscanClient::from_config(config),
            phishing: PhishingDetector::from_config(config),
            model: TransactionModel::new(),
            lookup_timeout: config.lookup_timeout,
        }
    }

    pub fn contract_cache_stats(&self) -> crate::utils::cache::CacheStats {
        self.contracts.cache_stats()
    }

    pub fn phishing_cache_stats(&self) -> crate::utils::cache::CacheStats {
        self.phishing.cache_stats()
    }
}

impl<C, P, M> SecurityAnalyzer<C, P, M>
where
    C: ContractInfoSource,
    P: PhishingSource,
    M: RiskModel,
{
    /// Build an analyzer over explicit evidence sources
    pub fn with_sources(contracts: C, phishing: P, model: M, lookup_timeout: Duration) -> Self {
        Self {
            contracts,
            phishing,
            model,
            lookup_timeout,
        }
    }

    /// Analyze a pending transaction. Never fails: any internal error
    /// collapses into the fail-closed fallback report.
    pub async fn analyze_transaction(&self, tx: &Transaction) -> SecurityReport {
        match self.analyze_inner(tx).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "analysis failed, returning fail-closed report");
                Self::fallback_report()
            }
        }
    }

    async fn analyze_inner(&self, tx: &Transaction) -> AppResult<SecurityReport> {
        let mut warnings: Vec<String> = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        let mut security_checks: Vec<SecurityCheck> = Vec::new();

        // ============================================
        // Rule-based checks
        // ============================================

        if tx.is_contract_creation() {
            warnings.push("This transaction creates a new contract".to_string());
            recommendations.push("Review the contract code carefully before deployment".to_string());
            security_checks.push(SecurityCheck {
                name: "Contract Creation".to_string(),
                passed: false,
                severity: Severity::High,
                details: Some("Transaction creates a new contract".to_string()),
            });
        }

        let value = tx.value_wei()?;
        if value > HIGH_VALUE_THRESHOLD_WEI {
            warnings.push("High value transaction".to_string());
            recommendations.push("Double check the recipient address".to_string());
            security_checks.push(SecurityCheck {
                name: "Value Check".to_string(),
                passed: false,
                severity: Severity::High,
                details: Some("Transaction value exceeds 1 ETH".to_string()),
            });
        }

        // The fee rule checks only the field matching the transaction kind
        match tx.kind() {
            TransactionKind::Eip1559 => {
                if optional_wei(tx.max_fee_per_gas.as_deref()) > HIGH_GAS_FEE_THRESHOLD_WEI {
                    warnings.push("High gas fee".to_string());
                    recommendations.push("Consider waiting for lower gas prices".to_string());
                    security_checks.push(SecurityCheck {
                        name: "Gas Price Check".to_string(),
                        passed: false,
                        severity: Severity::Medium,
                        details: Some("Max fee per gas exceeds 100 Gwei".to_string()),
                    });
                }
            }
            TransactionKind::Legacy => {
                if optional_wei(tx.gas_price.as_deref()) > HIGH_GAS_FEE_THRESHOLD_WEI {
                    warnings.push("High gas fee".to_string());
                    recommendations.push("Consider waiting for lower gas prices".to_string());
                    security_checks.push(SecurityCheck {
                        name: "Gas Price Check".to_string(),
                        passed: false,
                        severity: Severity::Medium,
                        details: Some("Gas price exceeds 100 Gwei".to_string()),
                    });
                }
            }
        }

        // ============================================
        // Evidence gathering (concurrent, bounded)
        // ============================================

        let mut contract_info: Option<ContractInfo> = None;
        let mut phishing_results: Option<PhishingResult> = None;
        let mut ml_score: f64 = 0.0;

        if let Some(to) = tx.to.as_deref() {
            let features = TransactionFeatures::extract(tx)?;

            // Independent reads; all must settle before the verdict
            let (info_outcome, phishing_outcome, score_outcome) = tokio::join!(
                timeout(self.lookup_timeout, self.contracts.contract_info(to)),
                timeout(self.lookup_timeout, self.phishing.check_address(to)),
                timeout(self.lookup_timeout, self.model.predict(&features)),
            );

            let info = info_outcome.unwrap_or_else(|_| {
                warn!(address = to, "contract lookup timed out");
                ContractInfo::unavailable("lookup timed out")
            });
            let phishing = phishing_outcome.unwrap_or_else(|_| {
                warn!(address = to, "phishing lookup timed out");
                PhishingResult::source_unavailable()
            });
            let model_timed_out = score_outcome.is_err();
            let score = score_outcome.unwrap_or_else(|_| {
                warn!("model scoring timed out");
                0.0
            });

            // No usable evidence at all: fail closed rather than emit a
            // verdict backed by nothing
            if info.is_unavailable() && phishing.is_unavailable() && model_timed_out {
                warn!(address = to, "every evidence source unavailable, failing closed");
                return Ok(Self::fallback_report());
            }

            if !info.verified {
                warnings.push("Unverified contract".to_string());
                recommendations
                    .push("Exercise caution when interacting with unverified contracts".to_string());
                security_checks.push(SecurityCheck {
                    name: "Contract Verification".to_string(),
                    passed: false,
                    severity: Severity::High,
                    details: Some("Contract is not verified on Etherscan".to_string()),
                });
            }

            if phishing.is_phishing {
                let reason = phishing
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Address identified as potential phishing risk".to_string());
                warnings.push(format!("Potential phishing risk: {}", reason));
                recommendations.push("Avoid interacting with this address".to_string());
                security_checks.push(SecurityCheck {
                    name: "Phishing Detection".to_string(),
                    passed: false,
                    severity: Severity::High,
                    details: Some(reason),
                });
            }

            ml_score = score.clamp(0.0, 1.0);
            contract_info = Some(info);
            phishing_results = Some(phishing);
        }

        // ============================================
        // Verdict
        // ============================================

        let is_phishing = phishing_results
            .as_ref()
            .map(|p| p.is_phishing)
            .unwrap_or(false);

        let risk = Self::risk_level(warnings.len(), is_phishing, ml_score);
        let risk_assessment = RiskAssessment {
            risk_level: risk,
            risk_score: ml_score,
            details: warnings.clone(),
        };

        recommendations.extend(Self::assessment_recommendations(&risk_assessment));

        debug!(
            risk = risk.as_str(),
            warning_count = warnings.len(),
            ml_score,
            "analysis complete"
        );

        Ok(SecurityReport {
            risk,
            warnings,
            recommendations,
            security_checks,
            contract_info,
            phishing_results,
            risk_assessment,
            timestamp: monotonic_millis(),
        })
    }

    /// Canonical decision rule, evaluated with short-circuit OR semantics
    /// in this exact order; the first satisfied branch wins.
    fn risk_level(warning_count: usize, is_phishing: bool, ml_score: f64) -> RiskLevel {
        if is_phishing || ml_score > 0.8 || warning_count >= 3 {
            RiskLevel::High
        } else if ml_score > 0.5 || warning_count >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Assessment-driven recommendations. Additive: duplicate entries
    /// across triggers are kept, not deduplicated.
    fn assessment_recommendations(assessment: &RiskAssessment) -> Vec<String> {
        let mut recommendations = Vec::new();

        if assessment.risk_level == RiskLevel::High {
            recommendations.push("Review transaction carefully before proceeding".to_string());
            recommendations
                .push("Consider using a hardware wallet for added security".to_string());
        }

        if assessment.risk_score > 0.5 {
            recommendations.push("Verify contract source code on Etherscan".to_string());
            recommendations.push("Check contract audit reports if available".to_string());
        }

        if assessment
            .details
            .iter()
            .any(|detail| detail.contains("Potential phishing"))
        {
            recommendations.push("Do not proceed with the transaction".to_string());
            recommendations.push("Report the address to the community".to_string());
        }

        recommendations
    }

    /// Fail-closed report for a pipeline that could not analyze at all
    fn fallback_report() -> SecurityReport {
        SecurityReport {
            risk: RiskLevel::High,
            warnings: vec!["Error analyzing transaction".to_string()],
            recommendations: vec![
                "Please try again or contact support if the issue persists".to_string()
            ],
            security_checks: Vec::new(),
            contract_info: None,
            phishing_results: None,
            risk_assessment: RiskAssessment {
                risk_level: RiskLevel::High,
                risk_score: 1.0,
                details: vec!["Error analyzing transaction".to_string()],
            },
            timestamp: monotonic_millis(),
        }
    }

    /// Standalone check list including *passed* entries, for callers that
    /// want the full checklist rather than a verdict.
    pub async fn perform_security_checks(&self, tx: &Transaction) -> AppResult<Vec<SecurityCheck>> {
        let mut checks = Vec::new();

        if tx.is_contract_creation() {
            checks.push(SecurityCheck {
                name: "Contract Creation".to_string(),
                passed: false,
                severity: Severity::High,
                details: Some("Transaction creates a new contract".to_string()),
            });
        }

        if tx.value_wei()? > HIGH_VALUE_THRESHOLD_WEI {
            checks.push(SecurityCheck {
                name: "Value Check".to_string(),
                passed: false,
                severity: Severity::High,
                details: Some("Transaction value exceeds 1 ETH".to_string()),
            });
        }

        if let Some(to) = tx.to.as_deref() {
            let info = match timeout(self.lookup_timeout, self.contracts.contract_info(to)).await {
                Ok(info) => info,
                Err(_) => ContractInfo::unavailable("lookup timed out"),
            };
            checks.push(SecurityCheck {
                name: "Contract Verification".to_string(),
                passed: info.verified,
                severity: if info.verified {
                    Severity::Low
                } else {
                    Severity::High
                },
                details: Some(if info.verified {
                    "Contract is verified".to_string()
                } else {
                    "Contract is not verified".to_string()
                }),
            });

            let phishing = match timeout(self.lookup_timeout, self.phishing.check_address(to)).await
            {
                Ok(result) => result,
                Err(_) => PhishingResult::source_unavailable(),
            };
            checks.push(SecurityCheck {
                name: "Phishing Detection".to_string(),
                passed: !phishing.is_phishing,
                severity: if phishing.is_phishing {
                    Severity::High
                } else {
                    Severity::Low
                },
                details: Some(
                    phishing
                        .reason
                        .unwrap_or_else(|| "No phishing indicators detected".to_string()),
                ),
            });
        }

        Ok(checks)
    }
}

fn optional_wei(field: Option<&str>) -> alloy_primitives::U256 {
    field
        .and_then(|s| crate::models::types::parse_wei(s).ok())
        .unwrap_or(alloy_primitives::U256::ZERO)
}
