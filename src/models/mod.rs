//! Data models and configuration

pub mod config;
pub mod errors;
pub mod types;

pub use config::GuardConfig;
pub use errors::{AppError, AppResult, ErrorCode};
pub use types::{
    ContractInfo, PhishingResult, RiskAssessment, RiskLevel, SecurityCheck, SecurityReport,
    Severity, Transaction, TransactionKind,
};
