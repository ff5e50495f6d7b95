//! Bitcoin Data Source
//!
//! [`BitcoinDataSource`] is the read-only view of Bitcoin the checks rely
//! on. [`EsploraClient`] implements it over the Esplora REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::common::error::FlyoverError;

/// Esplora API endpoints
pub const MAINNET_URL: &str = "https://blockstream.info/api";
pub const TESTNET_URL: &str = "https://blockstream.info/testnet/api";

/// Bitcoin data source errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitcoinDataError {
    #[error("Transaction not found: {0}")]
    TxNotFound(String),

    #[error("Transaction not confirmed: {0}")]
    NotConfirmed(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BitcoinDataError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<BitcoinDataError> for FlyoverError {
    fn from(e: BitcoinDataError) -> Self {
        match e {
            BitcoinDataError::TxNotFound(tx_hash) => FlyoverError::TransactionNotFound { tx_hash },
            other => FlyoverError::bitcoin(other.to_string()),
        }
    }
}

/// Transaction output as seen by the data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinOutput {
    pub value_sats: u64,
    /// scriptPubKey, hex
    pub script_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinTransactionInfo {
    pub txid: String,
    pub is_confirmed: bool,
    pub vout: Vec<BitcoinOutput>,
    pub block_hash: Option<String>,
    pub block_height: Option<u64>,
}

/// Block that contains a given transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinBlock {
    pub hash: String,
    pub height: u64,
    /// All txids of the block in block order, display hex
    pub transaction_hashes: Vec<String>,
}

/// Read access to Bitcoin
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BitcoinDataSource: Send + Sync {
    async fn transaction(&self, txid: &str) -> Result<BitcoinTransactionInfo, BitcoinDataError>;

    /// Raw serialized transaction, hex
    async fn transaction_hex(&self, txid: &str) -> Result<String, BitcoinDataError>;

    async fn block_from_transaction(&self, txid: &str) -> Result<BitcoinBlock, BitcoinDataError>;
}

/// Esplora HTTP client
#[derive(Debug, Clone)]
pub struct EsploraClient {
    client: Client,
    base_url: String,
}

impl EsploraClient {
    /// Create a new client with custom URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn new_mainnet() -> Self {
        Self::new(MAINNET_URL)
    }

    pub fn new_testnet() -> Self {
        Self::new(TESTNET_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, path: &str, txid: &str) -> Result<String, BitcoinDataError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body, txid));
        }

        Ok(body.trim().to_string())
    }

    async fn get_tx(&self, txid: &str) -> Result<EsploraTx, BitcoinDataError> {
        let body = self.get_text(&format!("/tx/{}", txid), txid).await?;
        serde_json::from_str(&body).map_err(|e| BitcoinDataError::Parse(format!("tx {}: {}", txid, e)))
    }
}

/// Only a 404 says anything about the transaction; other statuses are outages
fn status_error(status: StatusCode, body: &str, txid: &str) -> BitcoinDataError {
    if status == StatusCode::NOT_FOUND {
        BitcoinDataError::TxNotFound(txid.to_string())
    } else {
        BitcoinDataError::Http(format!("{}: {}", status, body.trim()))
    }
}

#[async_trait]
impl BitcoinDataSource for EsploraClient {
    async fn transaction(&self, txid: &str) -> Result<BitcoinTransactionInfo, BitcoinDataError> {
        Ok(self.get_tx(txid).await?.into())
    }

    async fn transaction_hex(&self, txid: &str) -> Result<String, BitcoinDataError> {
        self.get_text(&format!("/tx/{}/hex", txid), txid).await
    }

    async fn block_from_transaction(&self, txid: &str) -> Result<BitcoinBlock, BitcoinDataError> {
        let tx = self.get_tx(txid).await?;
        let (Some(hash), Some(height)) = (tx.status.block_hash, tx.status.block_height) else {
            return Err(BitcoinDataError::NotConfirmed(txid.to_string()));
        };

        let body = self.get_text(&format!("/block/{}/txids", hash), txid).await?;
        let transaction_hashes: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| BitcoinDataError::Parse(format!("block {} txids: {}", hash, e)))?;

        Ok(BitcoinBlock {
            hash,
            height,
            transaction_hashes,
        })
    }
}

/// Esplora API response types
#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    vout: Vec<EsploraTxOutput>,
    status: EsploraTxStatus,
}

#[derive(Debug, Deserialize)]
struct EsploraTxOutput {
    value: u64,
    scriptpubkey: String,
}

#[derive(Debug, Deserialize)]
struct EsploraTxStatus {
    confirmed: bool,
    block_height: Option<u64>,
    block_hash: Option<String>,
}

impl From<EsploraTx> for BitcoinTransactionInfo {
    fn from(tx: EsploraTx) -> Self {
        Self {
            txid: tx.txid,
            is_confirmed: tx.status.confirmed,
            vout: tx
                .vout
                .into_iter()
                .map(|o| BitcoinOutput {
                    value_sats: o.value,
                    script_hex: o.scriptpubkey,
                })
                .collect(),
            block_hash: tx.status.block_hash,
            block_height: tx.status.block_height,
        }
    }
}
