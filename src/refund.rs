//! Refund Eligibility Engine
//!
//! Cheap local checks run first and short-circuit; the dry-run of the
//! actual refund call is always the last step. Every failure, including
//! chain and data source errors, ends up classified in the returned
//! [`RefundDecision`].

use alloy_primitives::{Address, Bytes};
use tracing::{info, warn};

use crate::address::{parse_quote_hash, strip_hex_prefix};
use crate::btc_spv::prepare_refund_proof;
use crate::chain::{CallMode, ChainClient, RegisterPeginParams};
use crate::clock::Clock;
use crate::common::error::FlyoverError;
use crate::common::logging::{log_decision_event, EventCategory};
use crate::common::revert::{explain_revert, extract_revert_code, NOT_ENOUGH_CONFIRMATIONS_CODE};
use crate::esplora::BitcoinDataSource;
use crate::lps::LpsClient;
use crate::payment_proof::{is_pegin_quote_paid, is_pegout_quote_paid};
use crate::types::units::{is_pegout_expired_by_blocks, is_pegout_expired_by_date};
use crate::types::{PeginQuote, PegoutQuote};

/// Outcome of a refund eligibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundDecision {
    pub is_refundable: bool,
    /// Why the refund is not available
    pub error: Option<FlyoverError>,
}

impl RefundDecision {
    pub fn refundable() -> Self {
        Self {
            is_refundable: true,
            error: None,
        }
    }

    pub fn denied(error: FlyoverError) -> Self {
        Self {
            is_refundable: false,
            error: Some(error),
        }
    }
}

/// Collaborators a refund check reads from
#[derive(Clone, Copy)]
pub struct RefundContext<'a> {
    pub lps: &'a LpsClient,
    pub chain: &'a dyn ChainClient,
    pub bitcoin: &'a dyn BitcoinDataSource,
    pub clock: &'a dyn Clock,
    /// Bridge contract whose events count as payment
    pub bridge: Address,
}

/// Map a failed `registerPegin` dry-run
pub fn classify_register_pegin_failure(message: &str) -> FlyoverError {
    let detail = explain_revert(message);
    if extract_revert_code(message) == Some(NOT_ENOUGH_CONFIRMATIONS_CODE) {
        FlyoverError::NotEnoughConfirmations { detail }
    } else {
        FlyoverError::RefundCallFailed { detail }
    }
}

fn finish(quote_hash: &str, decision: RefundDecision) -> RefundDecision {
    log_decision_event(
        EventCategory::Refund,
        quote_hash,
        decision.is_refundable,
        decision.error.as_ref(),
    );
    decision
}

/// Can the user reclaim a pegin deposit through `registerPegin`?
///
/// Expiry is left to the contract: the dry-run reverts while the deposit
/// is still within the provider's window.
pub async fn is_pegin_refundable(
    ctx: RefundContext<'_>,
    server_url: &str,
    quote: &PeginQuote,
    quote_hash: &str,
    provider_signature: &str,
    btc_tx_hash: &str,
) -> RefundDecision {
    let decision = match evaluate_pegin(ctx, server_url, quote, quote_hash, provider_signature, btc_tx_hash).await {
        Ok(()) => RefundDecision::refundable(),
        Err(e) => RefundDecision::denied(e),
    };
    finish(quote_hash, decision)
}

async fn evaluate_pegin(
    ctx: RefundContext<'_>,
    server_url: &str,
    quote: &PeginQuote,
    quote_hash: &str,
    provider_signature: &str,
    btc_tx_hash: &str,
) -> Result<(), FlyoverError> {
    if is_pegin_quote_paid(ctx.lps, ctx.chain, ctx.bridge, server_url, quote_hash)
        .await
        .is_paid
    {
        return Err(FlyoverError::AlreadyPaid);
    }

    let signature = hex::decode(strip_hex_prefix(provider_signature.trim())).map_err(|e| {
        FlyoverError::RefundCallFailed {
            detail: format!("provider signature is not hex: {}", e),
        }
    })?;
    let proof = prepare_refund_proof(ctx.bitcoin, btc_tx_hash).await?;

    let params = RegisterPeginParams {
        quote: quote.clone(),
        signature: Bytes::from(signature),
        btc_raw_transaction: Bytes::from(proof.tx_without_witness),
        partial_merkle_tree: Bytes::from(proof.partial_merkle_tree),
        height: proof.block_height,
    };

    match ctx.chain.register_pegin(&params, CallMode::Static).await {
        Ok(()) => {
            info!(target: "flyover::refund", quote_hash, height = params.height, "registerPegin dry-run succeeded");
            Ok(())
        }
        Err(e) => {
            warn!(target: "flyover::refund", quote_hash, error = %e, "registerPegin dry-run reverted");
            Err(classify_register_pegin_failure(&e.to_string()))
        }
    }
}

/// Can the user reclaim a pegout deposit through `refundUserPegOut`?
pub async fn is_pegout_refundable(
    ctx: RefundContext<'_>,
    server_url: &str,
    quote: &PegoutQuote,
    quote_hash: &str,
) -> RefundDecision {
    let decision = match evaluate_pegout(ctx, server_url, quote, quote_hash).await {
        Ok(()) => RefundDecision::refundable(),
        Err(e) => RefundDecision::denied(e),
    };
    finish(quote_hash, decision)
}

async fn evaluate_pegout(
    ctx: RefundContext<'_>,
    server_url: &str,
    quote: &PegoutQuote,
    quote_hash: &str,
) -> Result<(), FlyoverError> {
    let hash = parse_quote_hash(quote_hash)?;

    if is_pegout_quote_paid(ctx.lps, ctx.bitcoin, server_url, quote_hash)
        .await
        .is_paid
    {
        return Err(FlyoverError::AlreadyPaid);
    }

    let completed = ctx
        .chain
        .is_pegout_quote_completed(hash)
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;
    if completed {
        return Err(FlyoverError::AlreadyCompleted);
    }

    if !is_pegout_expired_by_date(quote, ctx.clock.now_unix()) {
        return Err(FlyoverError::NotExpiredByDate {
            expire_date: quote.expire_date,
        });
    }

    let chain_height = ctx
        .chain
        .chain_height()
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;
    if !is_pegout_expired_by_blocks(quote, chain_height) {
        return Err(FlyoverError::NotExpiredByBlocks {
            expire_blocks: quote.expire_blocks,
            chain_height,
        });
    }

    ctx.chain
        .refund_user_pegout(hash, CallMode::Static)
        .await
        .map_err(|e| {
            warn!(target: "flyover::refund", quote_hash, error = %e, "refundUserPegOut dry-run reverted");
            FlyoverError::SimulatedRefundFailed {
                detail: explain_revert(&e.to_string()),
            }
        })
}
