//! Contract Verification Lookup
//!
//! Asks an Etherscan-compatible block explorer whether a destination
//! address is a verified, published contract. Published source alone is
//! spoofable, so an address with zero prior transactions is downgraded to
//! unverified even when the explorer reports source code.
//!
//! Lookup failure is evidence, not an error: every failure path resolves
//! to `ContractInfo { verified: false, error: Some(..) }`. Failures are
//! cached with a short TTL so a broken explorer is not hammered but
//! transient outages self-heal.
//!
//! API: https://api.etherscan.io/api?module=contract&action=getsourcecode

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::evidence::ContractInfoSource;
use crate::models::config::GuardConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::ContractInfo;
use crate::utils::cache::ReputationCache;
use crate::utils::constants::USER_AGENT;

/// Sentinel the explorer returns in the ABI field for unpublished source
const UNVERIFIED_ABI: &str = "Contract source code not verified";

/// What the explorer knows about an address's published source
#[derive(Debug, Clone, Default)]
pub struct SourceRecord {
    pub verified: bool,
    pub contract_name: Option<String>,
}

/// Raw explorer transport. The production implementation talks HTTP;
/// tests substitute a counting mock.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Published-source record for an address
    async fn source_code(&self, address: &str) -> AppResult<SourceRecord>;
    /// Whether the address has at least one recorded transaction
    async fn has_transaction_history(&self, address: &str) -> AppResult<bool>;
}

/// Etherscan REST transport
pub struct HttpExplorerApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpExplorerApi {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.etherscan_api_url.clone(),
            api_key: config.etherscan_api_key.clone(),
            timeout: config.lookup_timeout,
        }
    }

    async fn get_json(&self, query: &str) -> AppResult<ExplorerEnvelope> {
        let url = format!("{}?{}&apikey={}", self.base_url, query, self.api_key);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::lookup_failed(format!(
                "explorer returned HTTP {}",
                response.status()
            )));
        }

        let envelope: ExplorerEnvelope = response.json().await?;
        Ok(envelope)
    }
}

/// Etherscan response envelope; `result` varies per action, so it is
/// validated field-by-field at this boundary and never leaks upward.
#[derive(Debug, Deserialize)]
struct ExplorerEnvelope {
    status: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[async_trait]
impl ExplorerApi for HttpExplorerApi {
    async fn source_code(&self, address: &str) -> AppResult<SourceRecord> {
        let envelope = self
            .get_json(&format!(
                "module=contract&action=getsourcecode&address={}",
                address
            ))
            .await?;

        if envelope.status != "1" {
            return Err(AppError::lookup_failed(format!(
                "explorer status {} for getsourcecode",
                envelope.status
            )));
        }

        let record = envelope
            .result
            .as_array()
            .and_then(|rows| rows.first())
            .ok_or_else(|| {
                AppError::lookup_invalid_response("getsourcecode result is not a non-empty array")
            })?;

        let abi = record.get("ABI").and_then(|v| v.as_str()).unwrap_or("");
        let name = record
            .get("ContractName")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        Ok(SourceRecord {
            verified: !abi.is_empty() && abi != UNVERIFIED_ABI,
            contract_name: name,
        })
    }

    async fn has_transaction_history(&self, address: &str) -> AppResult<bool> {
        // One row is enough to prove history
        let envelope = self
            .get_json(&format!(
                "module=account&action=txlist&address={}&page=1&offset=1&sort=desc",
                address
            ))
            .await?;

        // Etherscan answers status "0" with an empty result for fresh
        // addresses; that is a valid "no history", not a failure
        let rows = envelope.result.as_array().map(|a| a.len()).unwrap_or(0);
        Ok(rows > 0)
    }
}

/// Contract verification lookup with a process-wide reputation cache
pub struct EtherscanClient<E = HttpExplorerApi> {
    api: E,
    cache: ReputationCache<ContractInfo>,
    error_ttl_secs: u64,
}

impl EtherscanClient<HttpExplorerApi> {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::with_api(HttpExplorerApi::new(config), config)
    }
}

impl<E: ExplorerApi> EtherscanClient<E> {
    pub fn with_api(api: E, config: &GuardConfig) -> Self {
        Self {
            api,
            cache: ReputationCache::new(config.cache_capacity, config.contract_cache_ttl_secs),
            error_ttl_secs: config.contract_error_ttl_secs,
        }
    }

    pub fn cache_stats(&self) -> crate::utils::cache::CacheStats {
        self.cache.stats()
    }

    /// Verification evidence for an address. Never fails; malformed input
    /// and lookup trouble both come back as unverified evidence.
    pub async fn get_contract_info(&self, address: &str) -> ContractInfo {
        if address.parse::<Address>().is_err() {
            return ContractInfo::unavailable("invalid address");
        }

        if let Some(cached) = self.cache.get(address) {
            return cached;
        }

        match self.fetch(address).await {
            Ok(info) => {
                debug!(address, verified = info.verified, "contract lookup complete");
                self.cache.set(address, info.clone());
                info
            }
            Err(e) => {
                warn!(address, error = %e, "contract lookup failed");
                let info = ContractInfo::unavailable(e.to_string());
                self.cache
                    .set_with_ttl(address, info.clone(), self.error_ttl_secs);
                info
            }
        }
    }

    async fn fetch(&self, address: &str) -> AppResult<ContractInfo> {
        let record = self.api.source_code(address).await?;

        if !record.verified {
            return Ok(ContractInfo::unverified(record.contract_name));
        }

        // Anti-spoofing: published source with no on-chain history does
        // not count as verified
        if !self.api.has_transaction_history(address).await? {
            debug!(address, "published source but no transaction history");
            return Ok(ContractInfo::unverified(record.contract_name));
        }

        Ok(ContractInfo::verified(record.contract_name))
    }
}

#[async_trait]
impl<E: ExplorerApi> ContractInfoSource for EtherscanClient<E> {
    async fn contract_info(&self, address: &str) -> ContractInfo {
        self.get_contract_info(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TETHER: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    #[derive(Clone)]
    struct MockExplorer {
        verified: bool,
        has_history: bool,
        fail: bool,
        source_calls: Arc<AtomicUsize>,
        history_calls: Arc<AtomicUsize>,
    }

    impl MockExplorer {
        fn new(verified: bool, has_history: bool) -> Self {
            Self {
                verified,
                has_history,
                fail: false,
                source_calls: Arc::new(AtomicUsize::new(0)),
                history_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(false, false)
            }
        }
    }

    #[async_trait]
    impl ExplorerApi for MockExplorer {
        async fn source_code(&self, _address: &str) -> AppResult<SourceRecord> {
            self.source_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::lookup_failed("explorer down"));
            }
            Ok(SourceRecord {
                verified: self.verified,
                contract_name: Some("TetherToken".to_string()),
            })
        }

        async fn has_transaction_history(&self, _address: &str) -> AppResult<bool> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::lookup_failed("explorer down"));
            }
            Ok(self.has_history)
        }
    }

    fn client(api: MockExplorer) -> EtherscanClient<MockExplorer> {
        EtherscanClient::with_api(api, &GuardConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_address_short_circuits() {
        let api = MockExplorer::new(true, true);
        let client = client(api.clone());

        let info = client.get_contract_info("0xabc").await;
        assert!(!info.verified);
        assert_eq!(info.error.as_deref(), Some("invalid address"));
        assert_eq!(api.source_calls.load(Ordering::SeqCst), 0);

        let info = client.get_contract_info("").await;
        assert_eq!(info.error.as_deref(), Some("invalid address"));
    }

    #[tokio::test]
    async fn test_verified_contract_with_history() {
        let client = client(MockExplorer::new(true, true));
        let info = client.get_contract_info(TETHER).await;
        assert!(info.verified);
        assert_eq!(info.name.as_deref(), Some("TetherToken"));
        assert!(info.error.is_none());
    }

    #[tokio::test]
    async fn test_published_source_without_history_is_unverified() {
        let client = client(MockExplorer::new(true, false));
        let info = client.get_contract_info(TETHER).await;
        assert!(!info.verified);
        assert!(info.error.is_none());
    }

    #[tokio::test]
    async fn test_unpublished_source_skips_history_call() {
        let api = MockExplorer::new(false, true);
        let client = client(api.clone());
        let info = client.get_contract_info(TETHER).await;
        assert!(!info.verified);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explorer_failure_is_evidence_not_error() {
        let client = client(MockExplorer::failing());
        let info = client.get_contract_info(TETHER).await;
        assert!(!info.verified);
        assert!(info.error.is_some());
    }

    #[tokio::test]
    async fn test_cache_idempotence() {
        let api = MockExplorer::new(true, true);
        let client = client(api.clone());

        let first = client.get_contract_info(TETHER).await;
        let second = client.get_contract_info(TETHER).await;
        assert_eq!(first.verified, second.verified);
        assert_eq!(api.source_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_is_case_insensitive() {
        let api = MockExplorer::new(true, true);
        let client = client(api.clone());

        client.get_contract_info(TETHER).await;
        client.get_contract_info(&TETHER.to_lowercase()).await;
        assert_eq!(api.source_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let api = MockExplorer::failing();
        let client = client(api.clone());

        client.get_contract_info(TETHER).await;
        client.get_contract_info(TETHER).await;
        // Error TTL keeps the second call off the wire
        assert_eq!(api.source_calls.load(Ordering::SeqCst), 1);
    }
}
