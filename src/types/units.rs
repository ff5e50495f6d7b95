//! Quote Math
//!
//! Unit conversions between satoshis and the contract chain's native unit
//! (wei, 18 decimals), quote totals and expiration arithmetic.

use bitcoin::Amount;

use super::quote::{PeginQuote, PegoutQuote};
use crate::common::error::{FlyoverError, Result};

/// Satoshis per Bitcoin
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Wei per satoshi: 18 decimals on the contract chain, 8 on Bitcoin
pub const WEI_PER_SAT: u128 = 10_000_000_000;

/// Convert satoshis to wei; negative input is rejected
pub fn sats_to_wei(sats: i64) -> Result<u128> {
    let sats = u64::try_from(sats).map_err(|_| FlyoverError::NegativeAmount(sats))?;
    Ok(u128::from(sats) * WEI_PER_SAT)
}

/// Convert a Bitcoin output amount to wei
pub fn amount_to_wei(amount: Amount) -> u128 {
    u128::from(amount.to_sat()) * WEI_PER_SAT
}

/// Convert wei to satoshis, rounding up so the result always covers `wei`
pub fn wei_to_sats_ceil(wei: u128) -> u128 {
    wei.div_ceil(WEI_PER_SAT)
}

/// Convert satoshis to BTC string (e.g., "0.00100000")
pub fn sats_to_btc_string(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// Total price a user pays for a quote, in wei.
///
/// Value plus every fee the user is charged; the penalty fee is collateral
/// the provider forfeits and is never part of the price.
pub trait QuoteTotal {
    fn quote_total(&self) -> u128;
}

fn total(value: u128, call_fee: u128, gas_fee: u128, product_fee: u128) -> u128 {
    value
        .saturating_add(call_fee)
        .saturating_add(gas_fee)
        .saturating_add(product_fee)
}

impl QuoteTotal for PeginQuote {
    fn quote_total(&self) -> u128 {
        total(self.value, self.call_fee, self.gas_fee, self.product_fee_amount)
    }
}

impl QuoteTotal for PegoutQuote {
    fn quote_total(&self) -> u128 {
        total(self.value, self.call_fee, self.gas_fee, self.product_fee_amount)
    }
}

/// Unix second at which a pegin quote stops accepting deposits
pub fn pegin_expiration(quote: &PeginQuote) -> u64 {
    quote.agreement_timestamp.saturating_add(quote.time_for_deposit)
}

/// A pegin quote is expired once `now` reaches its deposit deadline
pub fn is_pegin_expired(quote: &PeginQuote, now: u64) -> bool {
    now >= pegin_expiration(quote)
}

/// The refund path opens strictly after the expire date
pub fn is_pegout_expired_by_date(quote: &PegoutQuote, now: u64) -> bool {
    now > quote.expire_date
}

/// The refund path opens strictly after the expire block
pub fn is_pegout_expired_by_blocks(quote: &PegoutQuote, chain_height: u64) -> bool {
    chain_height > quote.expire_blocks
}
