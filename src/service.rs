//! Flyover Verifier Service
//!
//! Bundles the collaborators once so callers do not have to thread them
//! through every check. Holds no state besides the handles; every call is
//! independent and safe to run concurrently.

use std::sync::Arc;

use tracing::info;

use crate::address::{parse_btc_address, parse_quote_hash};
use crate::btc_spv::{prepare_refund_proof, RefundProof};
use crate::chain::ChainClient;
use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::common::config::VerifierSettings;
use crate::common::error::{FlyoverError, Result};
use crate::esplora::BitcoinDataSource;
use crate::lps::{HttpClient, LpsClient};
use crate::payment_proof::{is_pegin_quote_paid, is_pegout_quote_paid, PaymentProofResult};
use crate::pegin_tx::{check_pegin_transaction, PeginTxContext, ResponseMode};
use crate::quote_validator::{reject, validate_pegin_quote, validate_pegout_quote};
use crate::refund::{is_pegin_refundable, is_pegout_refundable, RefundContext, RefundDecision};
use crate::signature::{verify_pegin_deposit_address, verify_signature};
use crate::types::{
    AcceptedQuote, LiquidityProvider, PeginQuote, PeginQuoteRequest, PeginQuoteResponse,
    PeginQuoteStatus, PegoutQuote, PegoutQuoteRequest, PegoutQuoteResponse, PegoutQuoteStatus,
};

/// Verification facade over one set of collaborators
#[derive(Clone)]
pub struct FlyoverVerifier {
    settings: VerifierSettings,
    lps: LpsClient,
    chain: Arc<dyn ChainClient>,
    bitcoin: Arc<dyn BitcoinDataSource>,
    clock: Arc<dyn Clock>,
}

impl FlyoverVerifier {
    /// Create a verifier on the system clock and tokio timer
    pub fn new(
        settings: VerifierSettings,
        http: Arc<dyn HttpClient>,
        chain: Arc<dyn ChainClient>,
        bitcoin: Arc<dyn BitcoinDataSource>,
    ) -> Self {
        Self::with_time(settings, http, chain, bitcoin, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    pub fn with_time(
        settings: VerifierSettings,
        http: Arc<dyn HttpClient>,
        chain: Arc<dyn ChainClient>,
        bitcoin: Arc<dyn BitcoinDataSource>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let lps = LpsClient::new(http, sleeper, settings.status_retry);
        Self {
            settings,
            lps,
            chain,
            bitcoin,
            clock,
        }
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    fn refund_context(&self) -> RefundContext<'_> {
        RefundContext {
            lps: &self.lps,
            chain: self.chain.as_ref(),
            bitcoin: self.bitcoin.as_ref(),
            clock: self.clock.as_ref(),
            bridge: self.settings.lbc_address,
        }
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Fetch pegin quotes; any tampered quote fails the whole batch
    pub async fn pegin_quotes(
        &self,
        provider: &LiquidityProvider,
        request: &PeginQuoteRequest,
    ) -> Result<Vec<PeginQuoteResponse>> {
        provider.validate()?;
        let base = provider.base_url();

        let quotes = self.lps.pegin_quotes(base, request).await?;
        for quote in &quotes {
            validate_pegin_quote(self.chain.as_ref(), &self.settings, base, request, quote).await?;
        }

        info!(target: "flyover::quote", provider = %provider.name, count = quotes.len(), "pegin quotes validated");
        Ok(quotes)
    }

    /// Fetch pegout quotes; any tampered quote fails the whole batch
    pub async fn pegout_quotes(
        &self,
        provider: &LiquidityProvider,
        request: &PegoutQuoteRequest,
    ) -> Result<Vec<PegoutQuoteResponse>> {
        provider.validate()?;
        let base = provider.base_url();

        let quotes = self.lps.pegout_quotes(base, request).await?;
        for quote in &quotes {
            validate_pegout_quote(self.chain.as_ref(), &self.settings, base, request, quote).await?;
        }

        info!(target: "flyover::quote", provider = %provider.name, count = quotes.len(), "pegout quotes validated");
        Ok(quotes)
    }

    /// Accept a pegin quote and check both signature and deposit address
    pub async fn accept_pegin_quote(
        &self,
        provider: &LiquidityProvider,
        response: &PeginQuoteResponse,
    ) -> Result<AcceptedQuote> {
        provider.validate()?;
        let signer = provider.signer(self.settings.network.rsk_chain_id())?;
        let hash = parse_quote_hash(&response.quote_hash)?;
        let base = provider.base_url();

        let accepted = self.lps.accept_pegin_quote(base, &response.quote_hash).await?;
        verify_signature(signer, hash, &accepted.signature, base)?;

        parse_btc_address(&accepted.deposit_address, self.settings.network.bitcoin_network())?;
        verify_pegin_deposit_address(self.chain.as_ref(), &response.quote, &accepted.deposit_address, base).await?;

        Ok(accepted)
    }

    /// Accept a pegout quote; the deposit target must be the configured bridge
    pub async fn accept_pegout_quote(
        &self,
        provider: &LiquidityProvider,
        response: &PegoutQuoteResponse,
    ) -> Result<AcceptedQuote> {
        provider.validate()?;
        let signer = provider.signer(self.settings.network.rsk_chain_id())?;
        let hash = parse_quote_hash(&response.quote_hash)?;
        let base = provider.base_url();

        let accepted = self.lps.accept_pegout_quote(base, &response.quote_hash).await?;
        verify_signature(signer, hash, &accepted.signature, base)?;

        let bridge = self.settings.lbc_address.to_string();
        if !accepted.deposit_address.trim().eq_ignore_ascii_case(&bridge) {
            return Err(reject(FlyoverError::ManipulatedQuoteResponse {
                server_url: base.to_string(),
                field: "lbcAddress".to_string(),
            }));
        }

        Ok(accepted)
    }

    // =========================================================================
    // Status and payment
    // =========================================================================

    pub async fn pegin_status(&self, provider: &LiquidityProvider, quote_hash: &str) -> Result<PeginQuoteStatus> {
        provider.validate()?;
        self.lps.pegin_status(provider.base_url(), quote_hash).await
    }

    pub async fn pegout_status(&self, provider: &LiquidityProvider, quote_hash: &str) -> Result<PegoutQuoteStatus> {
        provider.validate()?;
        self.lps.pegout_status(provider.base_url(), quote_hash).await
    }

    pub async fn is_pegin_paid(&self, provider: &LiquidityProvider, quote_hash: &str) -> PaymentProofResult {
        if let Err(e) = provider.validate() {
            return PaymentProofResult::unpaid(e);
        }
        is_pegin_quote_paid(
            &self.lps,
            self.chain.as_ref(),
            self.settings.lbc_address,
            provider.base_url(),
            quote_hash,
        )
        .await
    }

    pub async fn is_pegout_paid(&self, provider: &LiquidityProvider, quote_hash: &str) -> PaymentProofResult {
        if let Err(e) = provider.validate() {
            return PaymentProofResult::unpaid(e);
        }
        is_pegout_quote_paid(&self.lps, self.bitcoin.as_ref(), provider.base_url(), quote_hash).await
    }

    // =========================================================================
    // Refunds
    // =========================================================================

    pub async fn is_pegin_refundable(
        &self,
        provider: &LiquidityProvider,
        quote: &PeginQuote,
        quote_hash: &str,
        provider_signature: &str,
        btc_tx_hash: &str,
    ) -> RefundDecision {
        if let Err(e) = provider.validate() {
            return RefundDecision::denied(e);
        }
        is_pegin_refundable(
            self.refund_context(),
            provider.base_url(),
            quote,
            quote_hash,
            provider_signature,
            btc_tx_hash,
        )
        .await
    }

    pub async fn is_pegout_refundable(
        &self,
        provider: &LiquidityProvider,
        quote: &PegoutQuote,
        quote_hash: &str,
    ) -> RefundDecision {
        if let Err(e) = provider.validate() {
            return RefundDecision::denied(e);
        }
        is_pegout_refundable(self.refund_context(), provider.base_url(), quote, quote_hash).await
    }

    pub async fn prepare_refund_proof(&self, btc_tx_hash: &str) -> Result<RefundProof> {
        prepare_refund_proof(self.bitcoin.as_ref(), btc_tx_hash).await
    }

    // =========================================================================
    // Deposits
    // =========================================================================

    pub async fn validate_pegin_transaction(
        &self,
        provider: &LiquidityProvider,
        quote: &PeginQuote,
        accepted: &AcceptedQuote,
        raw_tx_hex: &str,
        mode: ResponseMode,
    ) -> Result<Option<String>> {
        let ctx = PeginTxContext {
            chain: self.chain.as_ref(),
            clock: self.clock.as_ref(),
            network: self.settings.network.bitcoin_network(),
            server_url: provider.base_url(),
        };
        check_pegin_transaction(ctx, quote, accepted, raw_tx_hex, mode).await
    }
}
