//! Environment-based Configuration
//!
//! # Environment Variables
//!
//! - `FLYOVER_NETWORK` - "mainnet", "testnet" or "regtest" (default: "testnet")
//! - `FLYOVER_ESPLORA_URL` - Esplora API endpoint (default depends on network)
//! - `FLYOVER_LBC_ADDRESS` - Liquidity bridge contract address (required
//!   outside regtest)
//! - `FLYOVER_CAPTCHA_TOKEN` - Captcha token sent when accepting quotes
//! - `FLYOVER_STATUS_RETRY_ATTEMPTS` - Status fetch attempts (default: 3)
//! - `FLYOVER_STATUS_RETRY_DELAY_MS` - Delay between attempts (default: 3000)
//! - `FLYOVER_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;

use crate::address::validate_rsk_address;
use crate::retry::RetryPolicy;

/// Regtest bridge contract as deployed by the local dev environment
const REGTEST_LBC_ADDRESS: &str = "0x8901a2bbf639bfd21a97004ba4d7ae2bd00b8da8";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" | "local" => Ok(Network::Regtest),
            _ => Err(ConfigError::InvalidValue(
                "FLYOVER_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        write!(f, "{}", s)
    }
}

impl Network {
    /// Get bitcoin network enum
    pub fn bitcoin_network(&self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Contract-chain id, also used for EIP-1191 address checksums
    pub fn rsk_chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 30,
            Network::Testnet => 31,
            Network::Regtest => 33,
        }
    }

    /// Get default Esplora API for this network
    pub fn default_esplora_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://blockstream.info/api",
            Network::Testnet => "https://blockstream.info/testnet/api",
            Network::Regtest => "http://127.0.0.1:3002",
        }
    }
}

/// Settings every verification component needs
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    pub network: Network,
    /// Address of the liquidity bridge contract quotes must point to
    pub lbc_address: Address,
    /// Retry policy for status endpoints
    pub status_retry: RetryPolicy,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct FlyoverConfig {
    pub network: Network,
    pub esplora_url: String,
    pub lbc_address: Address,
    pub captcha_token: Option<String>,
    pub status_retry: RetryPolicy,
    pub log_level: String,
}

impl FlyoverConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("FLYOVER_NETWORK")
            .unwrap_or_else(|_| "testnet".to_string())
            .parse()?;

        let esplora_url = env::var("FLYOVER_ESPLORA_URL")
            .unwrap_or_else(|_| network.default_esplora_url().to_string());

        let lbc_raw = match env::var("FLYOVER_LBC_ADDRESS") {
            Ok(value) => value,
            Err(_) if network == Network::Regtest => REGTEST_LBC_ADDRESS.to_string(),
            Err(_) => return Err(ConfigError::MissingEnvVar("FLYOVER_LBC_ADDRESS".to_string())),
        };
        let lbc_address = validate_rsk_address(&lbc_raw, network.rsk_chain_id())
            .map_err(|e| ConfigError::InvalidValue("FLYOVER_LBC_ADDRESS".to_string(), e.to_string()))?;

        let captcha_token = env::var("FLYOVER_CAPTCHA_TOKEN").ok().filter(|t| !t.is_empty());

        let defaults = RetryPolicy::default();
        let max_attempts = parse_optional("FLYOVER_STATUS_RETRY_ATTEMPTS")?
            .unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "FLYOVER_STATUS_RETRY_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let delay = parse_optional("FLYOVER_STATUS_RETRY_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay);

        let log_level = env::var("FLYOVER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            network,
            esplora_url,
            lbc_address,
            captcha_token,
            status_retry: RetryPolicy::new(max_attempts, delay),
            log_level,
        })
    }

    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            network: self.network,
            lbc_address: self.lbc_address,
            status_retry: self.status_retry,
        }
    }

    /// Print configuration summary (hiding the captcha token)
    pub fn print_summary(&self) {
        println!("=== Flyover Verifier Configuration ===");
        println!("Network: {}", self.network);
        println!("Esplora API: {}", self.esplora_url);
        println!("Bridge contract: {}", self.lbc_address);
        println!(
            "Captcha token: {}",
            if self.captcha_token.is_some() { "set" } else { "unset" }
        );
        println!(
            "Status retry: {} attempts, {} ms apart",
            self.status_retry.max_attempts,
            self.status_retry.delay.as_millis()
        );
        println!("Log Level: {}", self.log_level);
        println!("======================================");
    }
}

fn parse_optional<T: FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(var_name.to_string(), "must be a number".to_string())),
        Err(_) => Ok(None),
    }
}
