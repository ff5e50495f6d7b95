//! Bitcoin SPV Proof Preparation
//!
//! The bridge verifies pegin deposits from a witness-stripped transaction
//! and a partial merkle tree proving its inclusion in a block. Both are pure
//! transforms over data fetched from a [`BitcoinDataSource`].

use std::str::FromStr;

use bitcoin::consensus;
use bitcoin::merkle_tree::PartialMerkleTree;
use bitcoin::{Transaction, Txid, Witness};
use thiserror::Error;
use tracing::debug;

use crate::address::strip_hex_prefix;
use crate::common::error::FlyoverError;
use crate::esplora::BitcoinDataSource;

/// SPV-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpvError {
    #[error("invalid transaction hex: {0}")]
    InvalidHex(String),

    #[error("transaction does not parse: {0}")]
    Decode(String),

    #[error("invalid txid {0}")]
    InvalidTxid(String),

    #[error("transaction {0} is not in the block")]
    TxNotInBlock(String),

    #[error("block has no transactions")]
    EmptyBlock,

    #[error("data source returned transaction {returned} for {requested}")]
    TxidMismatch { requested: String, returned: String },
}

impl From<SpvError> for FlyoverError {
    fn from(e: SpvError) -> Self {
        FlyoverError::InvalidTransaction { detail: e.to_string() }
    }
}

/// Everything `registerPegin` needs besides the quote and signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundProof {
    /// Legacy serialization, witness cleared on every input
    pub tx_without_witness: Vec<u8>,
    /// Consensus-serialized partial merkle tree
    pub partial_merkle_tree: Vec<u8>,
    pub block_height: u64,
    pub block_hash: String,
}

/// Decode a raw transaction from hex, `0x` optional
pub fn decode_transaction(raw_hex: &str) -> Result<Transaction, SpvError> {
    let bytes = hex::decode(strip_hex_prefix(raw_hex.trim())).map_err(|e| SpvError::InvalidHex(e.to_string()))?;
    consensus::deserialize(&bytes).map_err(|e| SpvError::Decode(e.to_string()))
}

/// Clear every input witness and re-serialize.
///
/// With no witness left the encoder falls back to the pre-segwit format,
/// which is what the bridge hashes.
pub fn strip_witness(raw_hex: &str) -> Result<Vec<u8>, SpvError> {
    let mut tx = decode_transaction(raw_hex)?;
    for input in tx.input.iter_mut() {
        input.witness = Witness::new();
    }
    Ok(consensus::serialize(&tx))
}

/// Build a partial merkle tree matching only `target`.
///
/// `block_txids` must be the block's complete txid list in block order,
/// display hex as returned by block explorers.
pub fn build_partial_merkle_tree(block_txids: &[String], target: &str) -> Result<Vec<u8>, SpvError> {
    if block_txids.is_empty() {
        return Err(SpvError::EmptyBlock);
    }

    let txids = block_txids
        .iter()
        .map(|id| Txid::from_str(id.trim()).map_err(|_| SpvError::InvalidTxid(id.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    let target_id = Txid::from_str(target.trim()).map_err(|_| SpvError::InvalidTxid(target.to_string()))?;

    let matches: Vec<bool> = txids.iter().map(|id| *id == target_id).collect();
    if !matches.contains(&true) {
        return Err(SpvError::TxNotInBlock(target.to_string()));
    }

    let tree = PartialMerkleTree::from_txids(&txids, &matches);
    Ok(consensus::serialize(&tree))
}

/// Fetch and assemble the inclusion proof for `txid`
pub async fn prepare_refund_proof(bitcoin: &dyn BitcoinDataSource, txid: &str) -> Result<RefundProof, FlyoverError> {
    let raw_hex = bitcoin.transaction_hex(txid).await?;

    let returned = decode_transaction(&raw_hex)?.compute_txid().to_string();
    if !returned.eq_ignore_ascii_case(txid.trim()) {
        return Err(SpvError::TxidMismatch {
            requested: txid.to_string(),
            returned,
        }
        .into());
    }
    let tx_without_witness = strip_witness(&raw_hex)?;

    let block = bitcoin.block_from_transaction(txid).await?;
    let partial_merkle_tree = build_partial_merkle_tree(&block.transaction_hashes, txid)?;

    debug!(
        target: "flyover::refund",
        txid,
        block = %block.hash,
        height = block.height,
        block_txs = block.transaction_hashes.len(),
        "refund proof prepared"
    );

    Ok(RefundProof {
        tx_without_witness,
        partial_merkle_tree,
        block_height: block.height,
        block_hash: block.hash,
    })
}
