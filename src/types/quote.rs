//! Quote Types
//!
//! Wire shapes of liquidity provider quotes. Quotes are immutable once
//! received: every check works on a borrowed quote and produces new values
//! instead of normalising fields in place.

use serde::{Deserialize, Serialize};

/// Terms of a Bitcoin -> contract-chain transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeginQuote {
    /// Federation address the LP registers the deposit against
    #[serde(rename = "fedBTCAddr")]
    pub fed_btc_addr: String,
    /// Liquidity bridge contract the quote is bound to
    pub lbc_addr: String,
    #[serde(rename = "lpRSKAddr")]
    pub lp_rsk_addr: String,
    /// Must be the network's zero-hash sentinel
    pub btc_refund_addr: String,
    pub rsk_refund_addr: String,
    #[serde(rename = "lpBTCAddr")]
    pub lp_btc_addr: String,
    pub call_fee: u128,
    pub penalty_fee: u128,
    /// Destination EOA or contract of the call for user
    pub contract_addr: String,
    /// Call data, hex
    pub data: String,
    pub gas_limit: u32,
    pub nonce: i64,
    pub value: u128,
    pub agreement_timestamp: u64,
    pub time_for_deposit: u64,
    pub lp_call_time: u64,
    pub confirmations: u32,
    pub call_on_register: bool,
    pub gas_fee: u128,
    #[serde(default)]
    pub product_fee_amount: u128,
}

/// Terms of a contract-chain -> Bitcoin transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PegoutQuote {
    pub lbc_address: String,
    pub lp_rsk_addr: String,
    pub btc_refund_address: String,
    pub rsk_refund_address: String,
    pub lp_btc_addr: String,
    pub call_fee: u128,
    pub penalty_fee: u128,
    pub nonce: i64,
    /// Bitcoin destination of the payout
    pub deposit_addr: String,
    pub value: u128,
    pub agreement_timestamp: u64,
    pub deposit_date_limit: u64,
    pub deposit_confirmations: u32,
    pub transfer_confirmations: u32,
    pub transfer_time: u64,
    /// Unix seconds after which the user may claim a refund
    pub expire_date: u64,
    /// Block height after which the user may claim a refund
    pub expire_blocks: u64,
    pub gas_fee: u128,
    #[serde(default)]
    pub product_fee_amount: u128,
}

/// Either direction of a quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
    Pegin(PeginQuote),
    Pegout(PegoutQuote),
}

/// A quote together with the hash the provider claims for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeginQuoteResponse {
    pub quote: PeginQuote,
    pub quote_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PegoutQuoteResponse {
    pub quote: PegoutQuote,
    pub quote_hash: String,
}

/// User-controlled parameters of a pegin quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeginQuoteRequest {
    pub call_eoa_or_contract_address: String,
    /// Call data, hex
    pub call_contract_arguments: String,
    pub value_to_transfer: u128,
    pub rsk_refund_address: String,
}

/// User-controlled parameters of a pegout quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PegoutQuoteRequest {
    /// Bitcoin destination
    pub to: String,
    pub value_to_transfer: u128,
    pub rsk_refund_address: String,
}

/// Provider's answer to accepting a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedQuote {
    /// 65-byte recoverable signature over the quote hash, hex
    pub signature: String,
    /// Pegin: Bitcoin deposit address. Pegout: contract to deposit into.
    #[serde(alias = "bitcoinDepositAddressHash", alias = "lbcAddress")]
    pub deposit_address: String,
}
