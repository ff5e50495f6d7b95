//! Shared value types: quotes, statuses, providers and quote math.

pub mod provider;
pub mod quote;
pub mod status;
pub mod units;

pub use provider::{require_fields, LiquidityProvider};
pub use quote::{
    AcceptedQuote, PeginQuote, PeginQuoteRequest, PeginQuoteResponse, PegoutQuote,
    PegoutQuoteRequest, PegoutQuoteResponse, Quote,
};
pub use status::{
    PeginQuoteStatus, PeginState, PeginStatusInfo, PegoutQuoteStatus, PegoutState,
    PegoutStatusInfo, SimpleStatus,
};
pub use units::{
    amount_to_wei, pegin_expiration, sats_to_btc_string, sats_to_wei, wei_to_sats_ceil,
    QuoteTotal, SATS_PER_BTC, WEI_PER_SAT,
};
