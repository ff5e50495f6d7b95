//! Domain Error Taxonomy
//!
//! Closed set of failures a verification call can produce. Security
//! variants always carry the offending server URL or address and must never
//! be retried; liveness variants are safe to retry later.

use thiserror::Error;

/// Root error type for the verification core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlyoverError {
    // --- security: the counterparty is untrusted from here on ---
    /// Accepted-quote signature does not recover to the provider address
    #[error("invalid signature from {server_url}")]
    InvalidSignature { server_url: String },

    /// A user-controlled field came back different from the request
    #[error("quote response from {server_url} altered field `{field}`")]
    ManipulatedQuoteResponse { server_url: String, field: String },

    /// Server-supplied quote hash differs from the on-chain recomputation
    #[error("quote hash mismatch from {server_url}: server sent {provided}, contract computed {computed}")]
    QuoteHashMismatch {
        server_url: String,
        provided: String,
        computed: String,
    },

    /// Deposit address is not the one the contract derives for the quote
    #[error("untrusted btc deposit address {address} from {server_url}")]
    UntrustedBtcAddress { server_url: String, address: String },

    #[error("invalid rsk address: {address}")]
    InvalidRskAddress { address: String },

    #[error("checksum mismatch for address {address}")]
    ChecksumError { address: String },

    // --- liveness: caller may retry later ---
    #[error("liquidity provider {server_url} did not return a status: {detail}")]
    LpsDidNotReturnStatus { server_url: String, detail: String },

    #[error("transaction not found: {tx_hash}")]
    TransactionNotFound { tx_hash: String },

    #[error("bitcoin data source error: {0}")]
    BitcoinSource(String),

    #[error("chain read failed: {0}")]
    ChainRead(String),

    // --- payment proof ---
    #[error("quote status for {quote_hash} has no {field} yet")]
    QuoteStatusMissingTxHash { quote_hash: String, field: String },

    #[error("transaction {tx_hash} has no CallForUser event for quote {quote_hash}")]
    TransactionMissingExpectedEvent { tx_hash: String, quote_hash: String },

    #[error("btc transaction {tx_hash} does not commit to quote {quote_hash}")]
    InvalidBtcTransaction { tx_hash: String, quote_hash: String },

    // --- refund eligibility ---
    #[error("quote already paid")]
    AlreadyPaid,

    #[error("pegout quote already completed on-chain")]
    AlreadyCompleted,

    #[error("quote not expired yet: expires at unix time {expire_date}")]
    NotExpiredByDate { expire_date: u64 },

    #[error("quote not expired yet: expires after block {expire_blocks}, chain height is {chain_height}")]
    NotExpiredByBlocks { expire_blocks: u64, chain_height: u64 },

    #[error("not enough confirmations: {detail}")]
    NotEnoughConfirmations { detail: String },

    #[error("registerPegin simulation failed: {detail}")]
    RefundCallFailed { detail: String },

    #[error("refundUserPegOut simulation failed: {detail}")]
    SimulatedRefundFailed { detail: String },

    // --- pegin transaction validation ---
    #[error("quote expired at {expired_at}")]
    QuoteExpired { expired_at: String },

    #[error("invalid transaction: {detail}")]
    InvalidTransaction { detail: String },

    #[error("insufficient payment: paid {paid_wei} wei, expected {expected_wei} wei")]
    InsufficientPayment { paid_wei: u128, expected_wei: u128 },

    #[error("{count} output(s) below the minimum lock value of {minimum_sats} sats")]
    SubMinimumUtxos { count: usize, minimum_sats: u64 },

    // --- local input validation ---
    #[error("invalid btc address {address} for {network}")]
    InvalidBtcAddress { address: String, network: String },

    #[error("missing required fields: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("amount cannot be negative: {0}")]
    NegativeAmount(i64),

    #[error("invalid quote hash: {0}")]
    InvalidQuoteHash(String),

    #[error("invalid response from {server_url}: {detail}")]
    InvalidLpsResponse { server_url: String, detail: String },
}

impl FlyoverError {
    /// Create a Bitcoin data source error
    pub fn bitcoin(msg: impl Into<String>) -> Self {
        Self::BitcoinSource(msg.into())
    }

    /// Create a chain read error
    pub fn chain(msg: impl Into<String>) -> Self {
        Self::ChainRead(msg.into())
    }

    /// Errors after which the counterparty must be treated as malicious
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self,
            FlyoverError::InvalidSignature { .. }
                | FlyoverError::ManipulatedQuoteResponse { .. }
                | FlyoverError::QuoteHashMismatch { .. }
                | FlyoverError::UntrustedBtcAddress { .. }
                | FlyoverError::InvalidRskAddress { .. }
                | FlyoverError::ChecksumError { .. }
        )
    }

    /// Check if the same call may succeed when repeated later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FlyoverError::LpsDidNotReturnStatus { .. }
                | FlyoverError::TransactionNotFound { .. }
                | FlyoverError::BitcoinSource(_)
                | FlyoverError::ChainRead(_)
                | FlyoverError::QuoteStatusMissingTxHash { .. }
                | FlyoverError::NotEnoughConfirmations { .. }
                | FlyoverError::NotExpiredByDate { .. }
                | FlyoverError::NotExpiredByBlocks { .. }
        )
    }

    /// Stable code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            FlyoverError::InvalidSignature { .. } => "INVALID_SIGNATURE",
            FlyoverError::ManipulatedQuoteResponse { .. } => "MANIPULATED_QUOTE_RESPONSE",
            FlyoverError::QuoteHashMismatch { .. } => "QUOTE_HASH_MISMATCH",
            FlyoverError::UntrustedBtcAddress { .. } => "UNTRUSTED_BTC_ADDRESS",
            FlyoverError::InvalidRskAddress { .. } => "INVALID_RSK_ADDRESS",
            FlyoverError::ChecksumError { .. } => "CHECKSUM_ERROR",
            FlyoverError::LpsDidNotReturnStatus { .. } => "LPS_DID_NOT_RETURN_STATUS",
            FlyoverError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            FlyoverError::BitcoinSource(_) => "BITCOIN_SOURCE_ERROR",
            FlyoverError::ChainRead(_) => "CHAIN_READ_ERROR",
            FlyoverError::QuoteStatusMissingTxHash { .. } => "QUOTE_STATUS_MISSING_TX_HASH",
            FlyoverError::TransactionMissingExpectedEvent { .. } => {
                "TRANSACTION_MISSING_EXPECTED_EVENT"
            }
            FlyoverError::InvalidBtcTransaction { .. } => "INVALID_BTC_TRANSACTION",
            FlyoverError::AlreadyPaid => "ALREADY_PAID",
            FlyoverError::AlreadyCompleted => "ALREADY_COMPLETED",
            FlyoverError::NotExpiredByDate { .. } => "NOT_EXPIRED_BY_DATE",
            FlyoverError::NotExpiredByBlocks { .. } => "NOT_EXPIRED_BY_BLOCKS",
            FlyoverError::NotEnoughConfirmations { .. } => "NOT_ENOUGH_CONFIRMATIONS",
            FlyoverError::RefundCallFailed { .. } => "REFUND_CALL_FAILED",
            FlyoverError::SimulatedRefundFailed { .. } => "SIMULATED_REFUND_FAILED",
            FlyoverError::QuoteExpired { .. } => "QUOTE_EXPIRED",
            FlyoverError::InvalidTransaction { .. } => "INVALID_TRANSACTION",
            FlyoverError::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            FlyoverError::SubMinimumUtxos { .. } => "SUB_MINIMUM_UTXOS",
            FlyoverError::InvalidBtcAddress { .. } => "INVALID_BTC_ADDRESS",
            FlyoverError::MissingRequiredFields { .. } => "MISSING_REQUIRED_FIELDS",
            FlyoverError::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            FlyoverError::InvalidQuoteHash(_) => "INVALID_QUOTE_HASH",
            FlyoverError::InvalidLpsResponse { .. } => "INVALID_LPS_RESPONSE",
        }
    }
}

/// Result type alias using FlyoverError
pub type Result<T> = std::result::Result<T, FlyoverError>;
