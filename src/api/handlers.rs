//! API Request Handlers

use axum::extract::{Json, State};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::types::*;
use crate::core::analyzer::GuardAnalyzer;
use crate::models::config::GuardConfig;
use crate::models::types::RiskLevel;

/// Shared application state
pub struct AppState {
    pub analyzer: GuardAnalyzer,
    pub start_time: Instant,
    stats: GuardStats,
}

/// Thread-safe request statistics
#[derive(Default)]
struct GuardStats {
    total_analyzed: AtomicU64,
    high_risk_reports: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl AppState {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            analyzer: GuardAnalyzer::from_config(config),
            start_time: Instant::now(),
            stats: GuardStats::default(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn total_analyzed(&self) -> u64 {
        self.stats.total_analyzed.load(Ordering::Relaxed)
    }

    pub fn high_risk_reports(&self) -> u64 {
        self.stats.high_risk_reports.load(Ordering::Relaxed)
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Transaction Analysis
// ============================================

/// Analyze a pending transaction and return its security report.
///
/// The analyzer itself never fails; a degraded analysis comes back as a
/// high-risk report, so this handler has no error branch of its own.
pub async fn analyze_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Json<ApiResponse<crate::models::types::SecurityReport>> {
    let start = Instant::now();

    let report = state.analyzer.analyze_transaction(&req.transaction).await;

    let latency = start.elapsed().as_millis() as u64;
    state.stats.total_analyzed.fetch_add(1, Ordering::Relaxed);
    state
        .stats
        .total_latency_ms
        .fetch_add(latency, Ordering::Relaxed);
    if report.risk == RiskLevel::High {
        state.stats.high_risk_reports.fetch_add(1, Ordering::Relaxed);
    }

    info!(
        risk = report.risk.as_str(),
        warnings = report.warnings.len(),
        latency_ms = latency,
        "transaction analyzed"
    );

    Json(ApiResponse::success(
        report,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let analyzed = state.stats.total_analyzed.load(Ordering::Relaxed);
    let total_latency = state.stats.total_latency_ms.load(Ordering::Relaxed);

    let data = StatsData {
        total_analyzed: analyzed,
        high_risk_reports: state.stats.high_risk_reports.load(Ordering::Relaxed),
        avg_latency_ms: if analyzed > 0 {
            total_latency as f64 / analyzed as f64
        } else {
            0.0
        },
        uptime_seconds: state.uptime_seconds(),
        contract_cache: state.analyzer.contract_cache_stats(),
        phishing_cache: state.analyzer.phishing_cache_stats(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
