//! Ledger endpoint and client-side policy.

use crate::error::ConfigError;
use leptos::logging::log;
use serde::Deserialize;
use std::env;

/// 0.001 ETH, the fee the directory contract charges per submitted listing.
pub const DEFAULT_SUBMISSION_FEE_WEI: u128 = 1_000_000_000_000_000;

/// Bounded re-read after a settled write, to ride out the read surface's
/// propagation delay.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RecheckPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RecheckPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2000,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC gateway of the ledger node
    pub endpoint: String,
    pub contract_address: String,
    pub chain_id: Option<u64>,
    pub submission_fee_wei: u128,
    pub min_comment_len: usize,
    pub max_comment_len: usize,
    pub request_timeout_secs: u64,
    pub recheck: RecheckPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://sepolia.base.org".to_string(),
            contract_address: String::new(),
            chain_id: None,
            submission_fee_wei: DEFAULT_SUBMISSION_FEE_WEI,
            min_comment_len: 10,
            max_comment_len: 200,
            request_timeout_secs: 30,
            recheck: RecheckPolicy::default(),
        }
    }
}

/// Deployment output (`contract-info.json`); only the address is consumed.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ContractInfo {
    contract_address: String,
    #[serde(default)]
    chain_id: Option<u64>,
}

impl LedgerConfig {
    pub fn new(endpoint: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            contract_address: contract_address.into(),
            ..Default::default()
        }
    }

    /// Defaults plus the address (and chain, if present) from `contract-info.json` content.
    pub fn from_contract_info(json: &str) -> Result<Self, ConfigError> {
        let info: ContractInfo = serde_json::from_str(json)?;
        let mut config = Self {
            contract_address: info.contract_address,
            chain_id: info.chain_id,
            ..Default::default()
        };
        config.validate()?;
        config.normalize_endpoint();
        Ok(config)
    }

    /// Reads `SHOWCASE_RPC_URL`, `SHOWCASE_CONTRACT_ADDRESS`,
    /// `SHOWCASE_CONTRACT_INFO` (path to `contract-info.json`) and
    /// `SHOWCASE_CHAIN_ID`. An explicit address wins over the info file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("SHOWCASE_CONTRACT_INFO") {
            Ok(path) => {
                let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                log!("[CONFIG] Loaded contract info from {}", path);
                Self::from_contract_info(&json)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(endpoint) = env::var("SHOWCASE_RPC_URL") {
            config.endpoint = endpoint;
        }
        if let Ok(address) = env::var("SHOWCASE_CONTRACT_ADDRESS") {
            config.contract_address = address;
        }
        if let Ok(chain) = env::var("SHOWCASE_CHAIN_ID") {
            let id = chain.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "SHOWCASE_CHAIN_ID",
                value: chain.clone(),
            })?;
            config.chain_id = Some(id);
        }

        config.normalize_endpoint();
        config.validate()?;
        log!(
            "[CONFIG] Ledger endpoint {} contract {}",
            config.endpoint,
            config.contract_address
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("endpoint"));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                value: self.endpoint.clone(),
            });
        }
        if self.contract_address.trim().is_empty() {
            return Err(ConfigError::Missing("contract_address"));
        }
        if self.min_comment_len > self.max_comment_len {
            return Err(ConfigError::Invalid {
                key: "min_comment_len",
                value: self.min_comment_len.to_string(),
            });
        }
        Ok(())
    }

    fn normalize_endpoint(&mut self) {
        let trimmed = self.endpoint.trim().trim_end_matches('/').to_string();
        self.endpoint = trimmed;
    }
}
