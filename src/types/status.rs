//! Quote Status Types
//!
//! Server-reported progress of a quote. This is untrusted data: a
//! populated transaction hash only says where to look, the payment proof
//! checks decide what it means.

use serde::{Deserialize, Serialize};

use super::quote::{PeginQuote, PegoutQuote};

/// Four-way status shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl std::fmt::Display for SimpleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

/// Pegin lifecycle as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeginState {
    WaitingForDeposit,
    WaitingForDepositConfirmations,
    TimeForDepositElapsed,
    CallForUserSucceeded,
    CallForUserFailed,
    RegisterPegInSucceeded,
    RegisterPegInFailed,
}

impl PeginState {
    pub fn simple_status(&self) -> SimpleStatus {
        match self {
            Self::WaitingForDeposit | Self::WaitingForDepositConfirmations => SimpleStatus::Pending,
            Self::TimeForDepositElapsed => SimpleStatus::Expired,
            Self::CallForUserSucceeded | Self::RegisterPegInSucceeded => SimpleStatus::Success,
            Self::CallForUserFailed | Self::RegisterPegInFailed => SimpleStatus::Failed,
        }
    }
}

/// Pegout lifecycle as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PegoutState {
    WaitingForDeposit,
    WaitingForDepositConfirmations,
    TimeForDepositElapsed,
    SendPegoutSucceeded,
    SendPegoutFailed,
    RefundPegOutSucceeded,
    RefundPegOutFailed,
    BridgeTxSucceeded,
    BridgeTxFailed,
}

impl PegoutState {
    pub fn simple_status(&self) -> SimpleStatus {
        match self {
            Self::WaitingForDeposit | Self::WaitingForDepositConfirmations => SimpleStatus::Pending,
            Self::TimeForDepositElapsed => SimpleStatus::Expired,
            // the user was paid before the LP reclaims or settles with the bridge
            Self::SendPegoutSucceeded
            | Self::RefundPegOutSucceeded
            | Self::RefundPegOutFailed
            | Self::BridgeTxSucceeded
            | Self::BridgeTxFailed => SimpleStatus::Success,
            Self::SendPegoutFailed => SimpleStatus::Failed,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeginStatusInfo {
    pub state: PeginState,
    #[serde(default)]
    pub quote_hash: String,
    #[serde(default)]
    pub deposit_address: String,
    #[serde(default)]
    pub user_btc_tx_hash: String,
    #[serde(default)]
    pub call_for_user_tx_hash: String,
    #[serde(default)]
    pub register_peg_in_tx_hash: String,
}

impl PeginStatusInfo {
    pub fn call_for_user_tx(&self) -> Option<&str> {
        non_empty(&self.call_for_user_tx_hash)
    }

    pub fn user_btc_tx(&self) -> Option<&str> {
        non_empty(&self.user_btc_tx_hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PegoutStatusInfo {
    pub state: PegoutState,
    #[serde(default)]
    pub quote_hash: String,
    #[serde(default)]
    pub deposit_address: String,
    #[serde(default)]
    pub user_rsk_tx_hash: String,
    #[serde(default)]
    pub lp_btc_tx_hash: String,
    #[serde(default)]
    pub refund_peg_out_tx_hash: String,
    #[serde(default)]
    pub bridge_refund_tx_hash: String,
}

impl PegoutStatusInfo {
    pub fn lp_btc_tx(&self) -> Option<&str> {
        non_empty(&self.lp_btc_tx_hash)
    }
}

/// Body of `GET /pegin/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeginQuoteStatus {
    pub detail: PeginQuote,
    pub status: PeginStatusInfo,
}

/// Body of `GET /pegout/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegoutQuoteStatus {
    pub detail: PegoutQuote,
    pub status: PegoutStatusInfo,
}
