//! Configuration module for MetaGuard
//!
//! All values come from environment variables with defaults from
//! utils/constants.rs. No hardcoded endpoints or thresholds here.

use std::time::Duration;

use crate::utils::constants::{
    CHAIN_ID_ETHEREUM, DEFAULT_CACHE_CAPACITY, DEFAULT_CONTRACT_CACHE_TTL_SECS,
    DEFAULT_CONTRACT_ERROR_TTL_SECS, DEFAULT_ETHERSCAN_API_URL, DEFAULT_GOPLUS_API_URL,
    DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_METAMASK_BLACKLIST_URL,
    DEFAULT_PHISHING_CACHE_TTL_SECS,
};

/// Configuration for the analysis engine and its lookup components
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Etherscan-compatible explorer API endpoint
    pub etherscan_api_url: String,
    /// Explorer API key; empty works for low-volume use
    pub etherscan_api_key: String,
    /// MetaMask eth-phishing-detect feed URL
    pub metamask_blacklist_url: String,
    /// GoPlus token security API base URL
    pub goplus_api_url: String,
    /// Chain the GoPlus lookups are scoped to
    pub chain_id: u64,
    /// Upper bound for each external evidence call; a timed-out lookup
    /// degrades to safe-default evidence
    pub lookup_timeout: Duration,
    pub contract_cache_ttl_secs: u64,
    /// Short TTL for cached lookup failures so outages self-heal
    pub contract_error_ttl_secs: u64,
    pub phishing_cache_ttl_secs: u64,
    /// Maximum entries per reputation cache
    pub cache_capacity: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            etherscan_api_url: env_or("ETHERSCAN_API_URL", DEFAULT_ETHERSCAN_API_URL),
            etherscan_api_key: std::env::var("ETHERSCAN_API_KEY").unwrap_or_default(),
            metamask_blacklist_url: env_or(
                "METAMASK_BLACKLIST_URL",
                DEFAULT_METAMASK_BLACKLIST_URL,
            ),
            goplus_api_url: env_or("GOPLUS_API_URL", DEFAULT_GOPLUS_API_URL),
            chain_id: env_u64("GUARD_CHAIN_ID", CHAIN_ID_ETHEREUM),
            lookup_timeout: Duration::from_secs(env_u64(
                "GUARD_LOOKUP_TIMEOUT_SECS",
                DEFAULT_LOOKUP_TIMEOUT_SECS,
            )),
            contract_cache_ttl_secs: env_u64(
                "GUARD_CONTRACT_CACHE_TTL_SECS",
                DEFAULT_CONTRACT_CACHE_TTL_SECS,
            ),
            contract_error_ttl_secs: env_u64(
                "GUARD_CONTRACT_ERROR_TTL_SECS",
                DEFAULT_CONTRACT_ERROR_TTL_SECS,
            ),
            phishing_cache_ttl_secs: env_u64(
                "GUARD_PHISHING_CACHE_TTL_SECS",
                DEFAULT_PHISHING_CACHE_TTL_SECS,
            ),
            cache_capacity: env_u64("GUARD_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY as u64)
                as usize,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert!(!config.etherscan_api_url.is_empty());
        assert!(!config.metamask_blacklist_url.is_empty());
        assert!(config.lookup_timeout >= Duration::from_secs(1));
        assert!(config.cache_capacity > 0);
    }
}
