//! Payment Proof Checker
//!
//! Decides whether a provider already paid a quote. The provider's status
//! endpoint only says where to look; the proof itself always comes from a
//! source the provider does not control:
//!
//! - pegin: the `CallForUser` event in the payout receipt on the contract
//!   chain, emitted by the configured bridge
//! - pegout: an OP_RETURN output committing to the quote hash in the
//!   Bitcoin payout transaction

use alloy_primitives::Address;
use tracing::{debug, info};

use crate::address::{normalize_hex, parse_quote_hash};
use crate::chain::{find_call_for_user, ChainClient};
use crate::common::error::FlyoverError;
use crate::common::logging::{log_decision_event, EventCategory};
use crate::esplora::{BitcoinDataSource, BitcoinOutput};
use crate::lps::LpsClient;

/// OP_RETURN opcode, hex
const OP_RETURN_HEX: &str = "6a";

/// Outcome of a payment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProofResult {
    pub is_paid: bool,
    /// Why the quote could not be shown paid
    pub error: Option<FlyoverError>,
}

impl PaymentProofResult {
    pub fn paid() -> Self {
        Self {
            is_paid: true,
            error: None,
        }
    }

    pub fn unpaid(error: FlyoverError) -> Self {
        Self {
            is_paid: false,
            error: Some(error),
        }
    }
}

impl From<Result<(), FlyoverError>> for PaymentProofResult {
    fn from(result: Result<(), FlyoverError>) -> Self {
        match result {
            Ok(()) => Self::paid(),
            Err(e) => Self::unpaid(e),
        }
    }
}

/// Check whether a pegin quote was paid out on the contract chain
pub async fn is_pegin_quote_paid(
    lps: &LpsClient,
    chain: &dyn ChainClient,
    bridge: Address,
    server_url: &str,
    quote_hash: &str,
) -> PaymentProofResult {
    let result: PaymentProofResult = prove_pegin_payment(lps, chain, bridge, server_url, quote_hash)
        .await
        .into();
    log_decision_event(EventCategory::Payment, quote_hash, result.is_paid, result.error.as_ref());
    result
}

async fn prove_pegin_payment(
    lps: &LpsClient,
    chain: &dyn ChainClient,
    bridge: Address,
    server_url: &str,
    quote_hash: &str,
) -> Result<(), FlyoverError> {
    let status = lps.pegin_status(server_url, quote_hash).await?;

    let Some(tx_hash) = status.status.call_for_user_tx() else {
        return Err(FlyoverError::QuoteStatusMissingTxHash {
            quote_hash: quote_hash.to_string(),
            field: "callForUserTxHash".to_string(),
        });
    };
    let tx = parse_quote_hash(tx_hash).map_err(|e| FlyoverError::InvalidLpsResponse {
        server_url: server_url.to_string(),
        detail: e.to_string(),
    })?;

    let receipt = chain
        .transaction_receipt(tx)
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?
        .ok_or_else(|| FlyoverError::TransactionNotFound {
            tx_hash: tx_hash.to_string(),
        })?;

    match find_call_for_user(&receipt.logs, bridge, quote_hash) {
        Some(event) => {
            info!(
                target: "flyover::payment",
                quote_hash,
                tx_hash,
                call_success = event.success,
                "pegin payout found"
            );
            Ok(())
        }
        None => Err(FlyoverError::TransactionMissingExpectedEvent {
            tx_hash: tx_hash.to_string(),
            quote_hash: quote_hash.to_string(),
        }),
    }
}

/// Check whether a pegout quote was paid out on Bitcoin
pub async fn is_pegout_quote_paid(
    lps: &LpsClient,
    bitcoin: &dyn BitcoinDataSource,
    server_url: &str,
    quote_hash: &str,
) -> PaymentProofResult {
    let result: PaymentProofResult = prove_pegout_payment(lps, bitcoin, server_url, quote_hash)
        .await
        .into();
    log_decision_event(EventCategory::Payment, quote_hash, result.is_paid, result.error.as_ref());
    result
}

async fn prove_pegout_payment(
    lps: &LpsClient,
    bitcoin: &dyn BitcoinDataSource,
    server_url: &str,
    quote_hash: &str,
) -> Result<(), FlyoverError> {
    let status = lps.pegout_status(server_url, quote_hash).await?;

    let Some(txid) = status.status.lp_btc_tx() else {
        return Err(FlyoverError::QuoteStatusMissingTxHash {
            quote_hash: quote_hash.to_string(),
            field: "lpBtcTxHash".to_string(),
        });
    };

    let tx = bitcoin.transaction(txid).await?;
    debug!(target: "flyover::payment", txid, outputs = tx.vout.len(), "inspecting pegout payout");

    if tx.vout.iter().any(|output| commits_to_quote(output, quote_hash)) {
        info!(target: "flyover::payment", quote_hash, txid, "pegout payout found");
        Ok(())
    } else {
        Err(FlyoverError::InvalidBtcTransaction {
            tx_hash: txid.to_string(),
            quote_hash: quote_hash.to_string(),
        })
    }
}

/// An unspendable OP_RETURN output whose payload ends with the quote hash
pub fn commits_to_quote(output: &BitcoinOutput, quote_hash: &str) -> bool {
    let hash = normalize_hex(quote_hash);
    let script = normalize_hex(&output.script_hex);

    output.value_sats == 0
        && !hash.is_empty()
        && script.starts_with(OP_RETURN_HEX)
        && script.len() > OP_RETURN_HEX.len()
        && script.ends_with(&hash)
}
