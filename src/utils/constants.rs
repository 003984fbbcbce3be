//! Constants Module - Single Source of Truth
//!
//! Every threshold, scaling divisor, and default endpoint used across the
//! engine is defined here. No hardcoded values in other modules.

use alloy_primitives::U256;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "MetaGuard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "MetaGuard/0.1.0";

// ============================================
// RISK THRESHOLDS
// ============================================

/// 1 ETH in wei. Transfers above this trigger the high-value warning.
pub const HIGH_VALUE_THRESHOLD_WEI: U256 =
    U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// 100 Gwei in wei. Fees above this trigger the high-gas-fee warning.
/// Applied to `maxFeePerGas` for EIP-1559 transactions and `gasPrice`
/// for legacy transactions, never both.
pub const HIGH_GAS_FEE_THRESHOLD_WEI: U256 = U256::from_limbs([100_000_000_000, 0, 0, 0]);

// ============================================
// FEATURE SCALING
// ============================================

/// Wei per ETH, used when scaling transaction values into model features.
pub const WEI_PER_ETH: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Wei per Gwei, used when scaling fee fields into model features.
pub const WEI_PER_GWEI: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

// ============================================
// LOOKUP & CACHE DEFAULTS
// ============================================

/// Default timeout for each external evidence lookup (seconds)
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Default TTL for cached contract verification results (seconds)
pub const DEFAULT_CONTRACT_CACHE_TTL_SECS: u64 = 3600;

/// Short TTL for cached lookup *failures*, so transient outages self-heal
pub const DEFAULT_CONTRACT_ERROR_TTL_SECS: u64 = 60;

/// Default TTL for cached phishing reputation results (seconds).
/// Reputation lists change over time; never cache these indefinitely.
pub const DEFAULT_PHISHING_CACHE_TTL_SECS: u64 = 300;

/// Maximum entries per reputation cache before FIFO eviction kicks in
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

// ============================================
// EXTERNAL SERVICE ENDPOINTS
// ============================================

/// Etherscan-compatible block explorer API
pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";

/// MetaMask eth-phishing-detect list (blacklist/whitelist feed)
pub const DEFAULT_METAMASK_BLACKLIST_URL: &str =
    "https://raw.githubusercontent.com/MetaMask/eth-phishing-detect/master/src/config.json";

/// GoPlus Labs token security API
pub const DEFAULT_GOPLUS_API_URL: &str = "https://api.gopluslabs.io/api/v1";

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_values() {
        assert_eq!(
            HIGH_VALUE_THRESHOLD_WEI,
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(HIGH_GAS_FEE_THRESHOLD_WEI, U256::from(100_000_000_000u64));
    }

    #[test]
    fn test_gwei_divides_eth() {
        assert_eq!(WEI_PER_ETH % WEI_PER_GWEI, U256::ZERO);
    }
}
