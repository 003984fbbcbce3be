//! Phishing Reputation Lookup
//!
//! Merges multiple independent reputation sources into one
//! `PhishingResult` under a single fixed policy:
//! - any positive flag wins (logical OR),
//! - the most certain source sets the confidence, flagged or not,
//! - the first flagged source in feed order supplies the reason.
//!
//! Feed order is fixed (local blocklist, MetaMask list, GoPlus scan) so
//! the merged reason is deterministic. A feed that cannot be reached
//! yields a low-confidence "not phishing" default; one source's outage
//! never becomes a full-confidence "safe".

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::evidence::PhishingSource;
use crate::models::config::GuardConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::PhishingResult;
use crate::utils::cache::ReputationCache;
use crate::utils::constants::USER_AGENT;

/// One independent reputation source
#[async_trait]
pub trait PhishingFeed: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self, address: &str) -> AppResult<PhishingResult>;
}

// ============================================
// MetaMask eth-phishing-detect feed
// ============================================

/// Blacklist/whitelist membership in the MetaMask phishing config
pub struct MetaMaskBlacklistFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

/// The parts of eth-phishing-detect's config.json this feed consumes
#[derive(Debug, Deserialize)]
struct PhishingConfigList {
    #[serde(default)]
    blacklist: Vec<String>,
    #[serde(default)]
    whitelist: Vec<String>,
}

impl MetaMaskBlacklistFeed {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.metamask_blacklist_url.clone(),
            timeout: config.lookup_timeout,
        }
    }
}

#[async_trait]
impl PhishingFeed for MetaMaskBlacklistFeed {
    fn name(&self) -> &'static str {
        "metamask-blacklist"
    }

    async fn check(&self, address: &str) -> AppResult<PhishingResult> {
        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::lookup_failed(format!(
                "blacklist feed returned HTTP {}",
                response.status()
            )));
        }

        let list: PhishingConfigList = response.json().await?;
        let address = address.to_lowercase();

        if list.whitelist.iter().any(|a| a.to_lowercase() == address) {
            return Ok(PhishingResult::clean(1.0));
        }
        if list.blacklist.iter().any(|a| a.to_lowercase() == address) {
            return Ok(PhishingResult::flagged(
                0.9,
                "Address is blacklisted by MetaMask",
            ));
        }
        Ok(PhishingResult::clean(1.0))
    }
}

// ============================================
// GoPlus token security feed
// ============================================

/// Heuristic security-scan flags from the GoPlus token security API
pub struct GoPlusSecurityFeed {
    client: reqwest::Client,
    base_url: String,
    chain_id: u64,
    timeout: Duration,
}

/// GoPlus envelope: `result` is keyed by lowercase contract address
#[derive(Debug, Deserialize)]
struct GoPlusEnvelope {
    #[serde(default)]
    result: Option<HashMap<String, GoPlusRecord>>,
}

/// GoPlus encodes booleans as "0"/"1" strings
#[derive(Debug, Default, Deserialize)]
struct GoPlusRecord {
    #[serde(default)]
    is_honeypot: Option<String>,
    #[serde(default)]
    is_blacklisted: Option<String>,
    #[serde(default)]
    is_proxy: Option<String>,
    #[serde(default)]
    honeypot_related_address: Vec<String>,
}

fn flag(field: &Option<String>) -> bool {
    field.as_deref() == Some("1")
}

impl GoPlusSecurityFeed {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.goplus_api_url.clone(),
            chain_id: config.chain_id,
            timeout: config.lookup_timeout,
        }
    }
}

#[async_trait]
impl PhishingFeed for GoPlusSecurityFeed {
    fn name(&self) -> &'static str {
        "goplus-security"
    }

    async fn check(&self, address: &str) -> AppResult<PhishingResult> {
        let address = address.to_lowercase();
        let url = format!(
            "{}/token_security/{}?contract_addresses={}",
            self.base_url, self.chain_id, address
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::lookup_failed(format!(
                "security scan returned HTTP {}",
                response.status()
            )));
        }

        let envelope: GoPlusEnvelope = response.json().await?;
        let record = match envelope.result.as_ref().and_then(|r| r.get(&address)) {
            Some(record) => record,
            // No record means the scanner has nothing on this address
            None => return Ok(PhishingResult::clean(1.0)),
        };

        let is_honeypot = flag(&record.is_honeypot);
        let is_blacklisted = flag(&record.is_blacklisted);
        let is_proxy = flag(&record.is_proxy);
        let is_honeypot_related = record
            .honeypot_related_address
            .iter()
            .any(|a| a.to_lowercase() == address);

        let is_phishing = is_honeypot || is_blacklisted || is_honeypot_related;

        let mut confidence: f64 = 0.5;
        if is_honeypot {
            confidence += 0.3;
        }
        if is_blacklisted {
            confidence += 0.3;
        }
        if is_proxy {
            confidence += 0.1;
        }
        if is_honeypot_related {
            confidence += 0.2;
        }
        let confidence = confidence.min(1.0);

        if is_phishing {
            Ok(PhishingResult::flagged(
                confidence,
                "Security issues detected by GoPlus",
            ))
        } else {
            Ok(PhishingResult::clean(confidence))
        }
    }
}

// ============================================
// Detector
// ============================================

/// Multi-source phishing detector with a process-wide reputation cache
pub struct PhishingDetector {
    /// Queried concurrently, merged in this order
    feeds: Vec<Box<dyn PhishingFeed>>,
    /// Addresses flagged locally; checked before any network call
    known_phishing: HashSet<String>,
    cache: ReputationCache<PhishingResult>,
}

impl PhishingDetector {
    pub fn from_config(config: &GuardConfig) -> Self {
        let feeds: Vec<Box<dyn PhishingFeed>> = vec![
            Box::new(MetaMaskBlacklistFeed::new(config)),
            Box::new(GoPlusSecurityFeed::new(config)),
        ];
        Self::with_feeds(feeds, config)
    }

    pub fn with_feeds(feeds: Vec<Box<dyn PhishingFeed>>, config: &GuardConfig) -> Self {
        Self {
            feeds,
            known_phishing: HashSet::new(),
            cache: ReputationCache::new(config.cache_capacity, config.phishing_cache_ttl_secs),
        }
    }

    /// Seed the local blocklist
    pub fn with_known_addresses(mut self, addresses: impl IntoIterator<Item = String>) -> Self {
        self.known_phishing
            .extend(addresses.into_iter().map(|a| a.to_lowercase()));
        self
    }

    pub fn cache_stats(&self) -> crate::utils::cache::CacheStats {
        self.cache.stats()
    }

    /// Reputation verdict for an address. Never fails; outages degrade to
    /// a low-confidence clean result.
    pub async fn check(&self, address: &str) -> PhishingResult {
        if address.parse::<Address>().is_err() {
            return PhishingResult::clean(1.0);
        }

        let key = address.to_lowercase();

        if self.known_phishing.contains(&key) {
            return PhishingResult::flagged(1.0, "Known phishing address");
        }

        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let lookups = self.feeds.iter().map(|feed| {
            let key = key.clone();
            async move {
                match feed.check(&key).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(feed = feed.name(), error = %e, "reputation feed unavailable");
                        PhishingResult::source_unavailable()
                    }
                }
            }
        });

        let results = join_all(lookups).await;
        let merged = merge_results(&results);
        debug!(
            address = %key,
            is_phishing = merged.is_phishing,
            confidence = merged.confidence,
            "phishing lookup complete"
        );

        self.cache.set(&key, merged.clone());
        merged
    }
}

#[async_trait]
impl PhishingSource for PhishingDetector {
    async fn check_address(&self, address: &str) -> PhishingResult {
        self.check(address).await
    }
}

/// Merge rule: OR on flags, max confidence across sources on both
/// branches, first flagged reason wins.
fn merge_results(results: &[PhishingResult]) -> PhishingResult {
    if results.is_empty() {
        return PhishingResult::source_unavailable();
    }

    let is_phishing = results.iter().any(|r| r.is_phishing);
    let confidence = results
        .iter()
        .map(|r| r.confidence)
        .fold(0.0_f64, f64::max);
    let reason = if is_phishing {
        results
            .iter()
            .find(|r| r.is_phishing)
            .and_then(|r| r.reason.clone())
    } else {
        None
    };

    PhishingResult {
        is_phishing,
        confidence,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SCAM: &str = "0x5e4e65926ba27467555eb562121fac00d24e9dd2";

    struct StaticFeed {
        name: &'static str,
        result: Option<PhishingResult>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticFeed {
        fn clean(confidence: f64) -> Self {
            Self {
                name: "static-clean",
                result: Some(PhishingResult::clean(confidence)),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn flagged(name: &'static str, confidence: f64, reason: &str) -> Self {
            Self {
                name,
                result: Some(PhishingResult::flagged(confidence, reason)),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                name: "static-failing",
                result: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PhishingFeed for StaticFeed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn check(&self, _address: &str) -> AppResult<PhishingResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| AppError::lookup_failed("feed down"))
        }
    }

    fn detector(feeds: Vec<Box<dyn PhishingFeed>>) -> PhishingDetector {
        PhishingDetector::with_feeds(feeds, &GuardConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_address_short_circuits() {
        let feed = StaticFeed::flagged("f", 0.9, "bad");
        let calls = feed.calls.clone();
        let detector = detector(vec![Box::new(feed)]);

        let result = detector.check("not-an-address").await;
        assert!(!result.is_phishing);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_any_flag_wins_and_confidence_is_max() {
        let detector = detector(vec![
            Box::new(StaticFeed::clean(0.7)),
            Box::new(StaticFeed::flagged("scan", 0.6, "Known scam contract")),
        ]);

        let result = detector.check(SCAM).await;
        assert!(result.is_phishing);
        // Most-certain source dominates even when it was not the flagger
        assert!((result.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(result.reason.as_deref(), Some("Known scam contract"));
    }

    #[tokio::test]
    async fn test_first_flagged_reason_wins() {
        let detector = detector(vec![
            Box::new(StaticFeed::flagged("first", 0.9, "reason A")),
            Box::new(StaticFeed::flagged("second", 0.95, "reason B")),
        ]);

        let result = detector.check(SCAM).await;
        assert_eq!(result.reason.as_deref(), Some("reason A"));
        assert!((result.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_feed_failure_uses_safe_default() {
        let detector = detector(vec![
            Box::new(StaticFeed::failing()),
            Box::new(StaticFeed::clean(0.9)),
        ]);

        let result = detector.check(SCAM).await;
        assert!(!result.is_phishing);
        assert!((result.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_all_feeds_down_is_low_confidence_clean() {
        let detector = detector(vec![
            Box::new(StaticFeed::failing()),
            Box::new(StaticFeed::failing()),
        ]);

        let result = detector.check(SCAM).await;
        assert!(!result.is_phishing);
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
        assert!(result.is_unavailable());
    }

    #[tokio::test]
    async fn test_cache_idempotence() {
        let feed = StaticFeed::clean(1.0);
        let calls = feed.calls.clone();
        let detector = detector(vec![Box::new(feed)]);

        let first = detector.check(SCAM).await;
        let second = detector.check(SCAM).await;
        assert_eq!(first.is_phishing, second.is_phishing);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_key_is_case_insensitive() {
        let feed = StaticFeed::clean(1.0);
        let calls = feed.calls.clone();
        let detector = detector(vec![Box::new(feed)]);

        detector.check(&SCAM.to_uppercase().replace("0X", "0x")).await;
        detector.check(SCAM).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_known_address_skips_feeds() {
        let feed = StaticFeed::clean(1.0);
        let calls = feed.calls.clone();
        let detector =
            detector(vec![Box::new(feed)]).with_known_addresses([SCAM.to_uppercase()]);

        let result = detector.check(SCAM).await;
        assert!(result.is_phishing);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.reason.as_deref(), Some("Known phishing address"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_goplus_flag_parsing() {
        assert!(flag(&Some("1".to_string())));
        assert!(!flag(&Some("0".to_string())));
        assert!(!flag(&None));
    }
}
