//! External evidence lookup components

pub mod etherscan;
pub mod phishing;

pub use etherscan::{EtherscanClient, ExplorerApi, HttpExplorerApi};
pub use phishing::{GoPlusSecurityFeed, MetaMaskBlacklistFeed, PhishingDetector, PhishingFeed};
