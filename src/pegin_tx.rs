//! Pegin Transaction Validator
//!
//! Checks, before broadcast, that a user's raw Bitcoin transaction really
//! pays a pegin quote. Steps run in a fixed order and stop at the first
//! violation:
//!
//! 1. the quote has not expired
//! 2. the deposit address is the one the bridge derives for the quote
//! 3. the transaction parses
//! 4. outputs to the deposit address cover the quote total
//! 5. no output to the deposit address is below the bridge's minimum

use bitcoin::Amount;
use tracing::{debug, warn};

use crate::address::parse_btc_address;
use crate::btc_spv::decode_transaction;
use crate::chain::ChainClient;
use crate::clock::{format_unix, Clock};
use crate::common::error::{FlyoverError, Result};
use crate::signature::verify_pegin_deposit_address;
use crate::types::units::{amount_to_wei, is_pegin_expired, pegin_expiration};
use crate::types::{AcceptedQuote, PeginQuote, QuoteTotal};

/// Collaborators the validator reads from
#[derive(Clone, Copy)]
pub struct PeginTxContext<'a> {
    pub chain: &'a dyn ChainClient,
    pub clock: &'a dyn Clock,
    pub network: bitcoin::Network,
    /// Provider that handed out the deposit address
    pub server_url: &'a str,
}

/// How violations are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Return the first violation's message
    Soft,
    /// Return the first violation as an error
    #[default]
    Hard,
}

/// Validate `raw_tx_hex` against `quote`, failing with a typed error.
///
/// A deposit output exactly at the bridge minimum passes; only outputs
/// strictly below it count as sub-minimum, matching the bridge's own `>=`.
pub async fn validate_pegin_transaction(
    ctx: PeginTxContext<'_>,
    quote: &PeginQuote,
    accepted: &AcceptedQuote,
    raw_tx_hex: &str,
) -> Result<()> {
    let now = ctx.clock.now_unix();
    if is_pegin_expired(quote, now) {
        return Err(FlyoverError::QuoteExpired {
            expired_at: format_unix(pegin_expiration(quote)),
        });
    }

    verify_pegin_deposit_address(ctx.chain, quote, &accepted.deposit_address, ctx.server_url).await?;

    let tx = decode_transaction(raw_tx_hex).map_err(|e| FlyoverError::InvalidTransaction { detail: e.to_string() })?;

    let deposit_script = parse_btc_address(&accepted.deposit_address, ctx.network)?.script_pubkey();
    let deposits: Vec<Amount> = tx
        .output
        .iter()
        .filter(|output| output.script_pubkey == deposit_script)
        .map(|output| output.value)
        .collect();

    let paid_wei: u128 = deposits.iter().copied().map(amount_to_wei).sum();
    let expected_wei = quote.quote_total();
    if paid_wei < expected_wei {
        warn!(target: "flyover::pegin_tx", paid_wei, expected_wei, "deposit does not cover quote");
        return Err(FlyoverError::InsufficientPayment { paid_wei, expected_wei });
    }

    let minimum_sats = ctx
        .chain
        .minimum_lock_tx_value()
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;
    let count = deposits.iter().filter(|amount| amount.to_sat() < minimum_sats).count();
    if count > 0 {
        return Err(FlyoverError::SubMinimumUtxos { count, minimum_sats });
    }

    debug!(
        target: "flyover::pegin_tx",
        txid = %tx.compute_txid(),
        outputs = deposits.len(),
        paid_wei,
        "pegin transaction pays the quote"
    );
    Ok(())
}

/// Validate in the requested mode.
///
/// `Soft` never fails: it yields `Some(message)` for the first violation.
/// `Hard` yields the violation as `Err`.
pub async fn check_pegin_transaction(
    ctx: PeginTxContext<'_>,
    quote: &PeginQuote,
    accepted: &AcceptedQuote,
    raw_tx_hex: &str,
    mode: ResponseMode,
) -> Result<Option<String>> {
    match (validate_pegin_transaction(ctx, quote, accepted, raw_tx_hex).await, mode) {
        (Ok(()), _) => Ok(None),
        (Err(e), ResponseMode::Soft) => Ok(Some(e.to_string())),
        (Err(e), ResponseMode::Hard) => Err(e),
    }
}
