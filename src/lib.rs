//! Flyover Verifier - trust checks for a Bitcoin bridge client
//!
//! A liquidity provider (LP) quotes the terms for moving value between
//! Bitcoin and the contract chain. Nothing it says is taken at face value:
//!
//! - quotes are compared with the request and re-hashed by the bridge
//!   contract ([`quote_validator`])
//! - acceptances must be signed by the provider's key ([`signature`])
//! - payment is proven from chain data, not from the LP's status
//!   ([`payment_proof`])
//! - refunds are decided by local checks and a dry-run of the refund call
//!   ([`refund`], [`btc_spv`])
//! - a user's pegin transaction is checked before broadcast ([`pegin_tx`])
//!
//! Collaborators (HTTP, contract chain, Bitcoin data) are injected as trait
//! objects; [`service::FlyoverVerifier`] bundles them.

pub mod address;
pub mod btc_spv;
pub mod chain;
pub mod clock;
pub mod common;
pub mod esplora;
pub mod lps;
pub mod payment_proof;
pub mod pegin_tx;
pub mod quote_validator;
pub mod refund;
pub mod retry;
pub mod service;
pub mod signature;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports: errors and configuration
pub use common::{ConfigError, FlyoverConfig, FlyoverError, Network, Result, VerifierSettings};

// Re-exports: collaborator boundaries
pub use chain::{CallMode, ChainClient, ChainError};
pub use esplora::{BitcoinDataSource, EsploraClient};
pub use lps::{HttpClient, LpsClient, ReqwestHttpClient};

// Re-exports: checks
pub use btc_spv::{build_partial_merkle_tree, prepare_refund_proof, strip_witness, RefundProof};
pub use payment_proof::{is_pegin_quote_paid, is_pegout_quote_paid, PaymentProofResult};
pub use pegin_tx::{check_pegin_transaction, validate_pegin_transaction, ResponseMode};
pub use quote_validator::{validate_pegin_quote, validate_pegout_quote};
pub use refund::{is_pegin_refundable, is_pegout_refundable, RefundDecision};
pub use service::FlyoverVerifier;
pub use signature::{verify_pegin_deposit_address, verify_signature};
