//! Contract-Chain Collaborator
//!
//! Read-only access to the chain and the liquidity bridge contract. The
//! ABI plumbing lives behind [`ChainClient`]; this crate only ever asks for
//! view calls and `Static` (dry-run) executions.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolEvent};
use async_trait::async_trait;
use thiserror::Error;

use crate::address::hex_eq;
use crate::types::{PeginQuote, PegoutQuote};

sol! {
    /// Emitted by the bridge when the provider executes the user's call
    #[derive(Debug, PartialEq, Eq)]
    event CallForUser(
        address indexed from,
        address indexed dest,
        bytes32 indexed quoteHash,
        uint256 gasLimit,
        uint256 value,
        bytes data,
        bool success
    );
}

/// Chain client errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The contract rejected the call; `reason` is whatever the node returned
    #[error("execution reverted: {reason}")]
    Reverted { reason: String },

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// How a state-changing contract function is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Broadcast a transaction
    Execute,
    /// Simulate against current state without committing
    Static,
}

/// Raw event log as returned in a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// false when the transaction reverted
    pub status: bool,
    pub logs: Vec<RawLog>,
}

/// Arguments of the bridge's `registerPegIn`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPeginParams {
    pub quote: PeginQuote,
    /// Provider signature over the quote hash
    pub signature: Bytes,
    /// Witness-stripped raw Bitcoin transaction
    pub btc_raw_transaction: Bytes,
    /// Serialized partial merkle tree
    pub partial_merkle_tree: Bytes,
    pub height: u64,
}

/// Read access to the contract chain and the bridge contract
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_height(&self) -> Result<u64, ChainError>;

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>, ChainError>;

    /// Contract-side hash of a pegin quote
    async fn hash_pegin_quote(&self, quote: &PeginQuote) -> Result<B256, ChainError>;

    /// Contract-side hash of a pegout quote
    async fn hash_pegout_quote(&self, quote: &PegoutQuote) -> Result<B256, ChainError>;

    async fn is_pegout_quote_completed(&self, quote_hash: B256) -> Result<bool, ChainError>;

    /// Whether `address` is the deposit address the bridge derives for `quote`
    async fn validate_pegin_deposit_address(
        &self,
        quote: &PeginQuote,
        address: &str,
    ) -> Result<bool, ChainError>;

    /// Minimum value, in satoshis, the bridge accepts for a lock output
    async fn minimum_lock_tx_value(&self) -> Result<u64, ChainError>;

    async fn register_pegin(&self, params: &RegisterPeginParams, mode: CallMode) -> Result<(), ChainError>;

    async fn refund_user_pegout(&self, quote_hash: B256, mode: CallMode) -> Result<(), ChainError>;
}

/// Find a `CallForUser` event for `quote_hash` emitted by `bridge`.
///
/// Logs from any other emitter are ignored even if they decode, so a
/// look-alike contract cannot fake the payout.
pub fn find_call_for_user(logs: &[RawLog], bridge: Address, quote_hash: &str) -> Option<CallForUser> {
    logs.iter()
        .filter(|log| log.address == bridge)
        .filter(|log| log.topics.first() == Some(&CallForUser::SIGNATURE_HASH))
        .filter_map(|log| CallForUser::decode_raw_log(log.topics.iter().copied(), &log.data).ok())
        .find(|event| hex_eq(&event.quoteHash.to_string(), quote_hash))
}
