//! Quote Validator
//!
//! A quote is accepted only if every field the user controls came back
//! unchanged and the provider's quote hash equals the bridge contract's own
//! hash of the same struct.

use std::str::FromStr;

use alloy_primitives::B256;
use tracing::debug;

use crate::address::{hex_eq, parse_quote_hash, pegin_refund_sentinel};
use crate::chain::ChainClient;
use crate::common::config::VerifierSettings;
use crate::common::error::{FlyoverError, Result};
use crate::common::logging::{generate_correlation_id, log_security_event};
use crate::types::{PeginQuoteRequest, PeginQuoteResponse, PegoutQuoteRequest, PegoutQuoteResponse};

/// Log a security failure under a fresh correlation id and hand it back
pub(crate) fn reject(error: FlyoverError) -> FlyoverError {
    log_security_event(&error, &generate_correlation_id());
    error
}

fn manipulated(server_url: &str, field: &str) -> FlyoverError {
    reject(FlyoverError::ManipulatedQuoteResponse {
        server_url: server_url.to_string(),
        field: field.to_string(),
    })
}

fn same_account(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Bitcoin addresses compare by decoded payload when both parse, so bech32
/// case differences do not count as tampering.
fn same_btc_address(a: &str, b: &str) -> bool {
    use bitcoin::address::{Address, NetworkUnchecked};

    match (
        Address::<NetworkUnchecked>::from_str(a.trim()),
        Address::<NetworkUnchecked>::from_str(b.trim()),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

fn check_hash(server_url: &str, provided: &str, computed: B256) -> Result<()> {
    let matches = parse_quote_hash(provided).map(|p| p == computed).unwrap_or(false);
    if matches {
        return Ok(());
    }
    Err(reject(FlyoverError::QuoteHashMismatch {
        server_url: server_url.to_string(),
        provided: provided.to_string(),
        computed: computed.to_string(),
    }))
}

/// Validate a pegin quote against the request that produced it
pub async fn validate_pegin_quote(
    chain: &dyn ChainClient,
    settings: &VerifierSettings,
    server_url: &str,
    request: &PeginQuoteRequest,
    response: &PeginQuoteResponse,
) -> Result<()> {
    let quote = &response.quote;

    if !same_account(&quote.contract_addr, &request.call_eoa_or_contract_address) {
        return Err(manipulated(server_url, "contractAddr"));
    }
    if !hex_eq(&quote.data, &request.call_contract_arguments) {
        return Err(manipulated(server_url, "data"));
    }
    if quote.value != request.value_to_transfer {
        return Err(manipulated(server_url, "value"));
    }
    if !same_account(&quote.rsk_refund_addr, &request.rsk_refund_address) {
        return Err(manipulated(server_url, "rskRefundAddr"));
    }
    if !same_account(&quote.lbc_addr, &settings.lbc_address.to_string()) {
        return Err(manipulated(server_url, "lbcAddr"));
    }
    let sentinel = pegin_refund_sentinel(settings.network.bitcoin_network()).to_string();
    if quote.btc_refund_addr.trim() != sentinel {
        return Err(manipulated(server_url, "btcRefundAddr"));
    }

    let computed = chain
        .hash_pegin_quote(quote)
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;
    check_hash(server_url, &response.quote_hash, computed)?;

    debug!(target: "flyover::quote", quote_hash = %response.quote_hash, "pegin quote validated");
    Ok(())
}

/// Validate a pegout quote against the request that produced it
pub async fn validate_pegout_quote(
    chain: &dyn ChainClient,
    settings: &VerifierSettings,
    server_url: &str,
    request: &PegoutQuoteRequest,
    response: &PegoutQuoteResponse,
) -> Result<()> {
    let quote = &response.quote;

    if !same_btc_address(&quote.deposit_addr, &request.to) {
        return Err(manipulated(server_url, "depositAddr"));
    }
    if quote.value != request.value_to_transfer {
        return Err(manipulated(server_url, "value"));
    }
    if !same_account(&quote.rsk_refund_address, &request.rsk_refund_address) {
        return Err(manipulated(server_url, "rskRefundAddress"));
    }
    if !same_account(&quote.lbc_address, &settings.lbc_address.to_string()) {
        return Err(manipulated(server_url, "lbcAddress"));
    }

    let computed = chain
        .hash_pegout_quote(quote)
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;
    check_hash(server_url, &response.quote_hash, computed)?;

    debug!(target: "flyover::quote", quote_hash = %response.quote_hash, "pegout quote validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::test_utils::*;
    use crate::types::PegoutQuote;
    use bitcoin::hashes::Hash;

    const URL: &str = "https://lps.example";

    fn pegin_request(response: &PeginQuoteResponse) -> PeginQuoteRequest {
        PeginQuoteRequest {
            call_eoa_or_contract_address: response.quote.contract_addr.clone(),
            call_contract_arguments: response.quote.data.clone(),
            value_to_transfer: response.quote.value,
            rsk_refund_address: response.quote.rsk_refund_addr.clone(),
        }
    }

    fn pegout_request(response: &PegoutQuoteResponse) -> PegoutQuoteRequest {
        PegoutQuoteRequest {
            to: response.quote.deposit_addr.clone(),
            value_to_transfer: response.quote.value,
            rsk_refund_address: response.quote.rsk_refund_address.clone(),
        }
    }

    fn chain_hashing_to(hash: B256) -> MockChainClient {
        let mut chain = MockChainClient::new();
        chain.expect_hash_pegin_quote().returning(move |_| Ok(hash));
        chain.expect_hash_pegout_quote().returning(move |_| Ok(hash));
        chain
    }

    #[tokio::test]
    async fn test_valid_pegin_quote_passes() {
        let response = sample_pegin_response();
        let chain = chain_hashing_to(sample_quote_hash());
        let request = pegin_request(&response);

        validate_pegin_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_hex_payload_compared_prefix_insensitively() {
        let mut response = sample_pegin_response();
        response.quote.data = "0xABCDEF".to_string();
        let mut request = pegin_request(&response);
        request.call_contract_arguments = "abcdef".to_string();
        let chain = chain_hashing_to(sample_quote_hash());

        validate_pegin_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_altered_user_fields_are_manipulation() {
        let response = sample_pegin_response();
        let chain = MockChainClient::new();

        let mut request = pegin_request(&response);
        request.value_to_transfer += 1;
        let err = validate_pegin_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FlyoverError::ManipulatedQuoteResponse {
                server_url: URL.to_string(),
                field: "value".to_string()
            }
        );

        let mut request = pegin_request(&response);
        request.call_eoa_or_contract_address = "0x0000000000000000000000000000000000000009".to_string();
        let err = validate_pegin_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap_err();
        assert!(err.is_security_violation());
    }

    #[tokio::test]
    async fn test_pegin_refund_address_must_be_sentinel() {
        let mut response = sample_pegin_response();
        response.quote.btc_refund_addr = sample_btc_address();
        let request = pegin_request(&response);

        let err = validate_pegin_quote(&MockChainClient::new(), &test_settings(), URL, &request, &response)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlyoverError::ManipulatedQuoteResponse { ref field, .. } if field == "btcRefundAddr"
        ));
    }

    #[tokio::test]
    async fn test_hash_mismatch_rejected() {
        let response = sample_pegin_response();
        let chain = chain_hashing_to(B256::repeat_byte(0x01));
        let request = pegin_request(&response);

        let err = validate_pegin_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap_err();
        assert!(matches!(err, FlyoverError::QuoteHashMismatch { .. }));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_pegout_quote_checks() {
        let response = sample_pegout_response();
        let chain = chain_hashing_to(sample_quote_hash());
        let request = pegout_request(&response);
        validate_pegout_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap();

        let mut request = pegout_request(&response);
        request.to = pegin_refund_sentinel(bitcoin::Network::Testnet).to_string();
        let err = validate_pegout_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlyoverError::ManipulatedQuoteResponse { ref field, .. } if field == "depositAddr"
        ));

        let mut tampered = sample_pegout_response();
        tampered.quote.lbc_address = "0x0000000000000000000000000000000000000009".to_string();
        let request = pegout_request(&tampered);
        let err = validate_pegout_quote(&chain, &test_settings(), URL, &request, &tampered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlyoverError::ManipulatedQuoteResponse { ref field, .. } if field == "lbcAddress"
        ));
    }

    #[tokio::test]
    async fn test_mutating_any_hashed_field_breaks_hash() {
        // the contract hashes the whole struct; a mock contract that hashes
        // via serde JSON stands in for it
        let mut chain = MockChainClient::new();
        chain
            .expect_hash_pegout_quote()
            .returning(|quote| Ok(json_hash(quote)));

        let mut response = sample_pegout_response();
        response.quote_hash = json_hash(&response.quote).to_string();
        let request = pegout_request(&response);
        validate_pegout_quote(&chain, &test_settings(), URL, &request, &response)
            .await
            .unwrap();

        let other_btc = bitcoin::Address::p2pkh(
            bitcoin::PubkeyHash::from_byte_array([9; 20]),
            bitcoin::Network::Testnet,
        )
        .to_string();
        let mutations: Vec<(&str, Box<dyn Fn(&mut PegoutQuote)>)> = vec![
            ("callFee", Box::new(|q: &mut PegoutQuote| q.call_fee += 1)),
            ("penaltyFee", Box::new(|q: &mut PegoutQuote| q.penalty_fee += 1)),
            ("gasFee", Box::new(|q: &mut PegoutQuote| q.gas_fee += 1)),
            ("nonce", Box::new(|q: &mut PegoutQuote| q.nonce += 1)),
            ("value", Box::new(|q: &mut PegoutQuote| q.value += 1)),
            ("expireBlocks", Box::new(|q: &mut PegoutQuote| q.expire_blocks += 1)),
            ("expireDate", Box::new(|q: &mut PegoutQuote| q.expire_date += 1)),
            ("transferConfirmations", Box::new(|q: &mut PegoutQuote| q.transfer_confirmations += 1)),
            ("lpBtcAddr", Box::new(move |q: &mut PegoutQuote| q.lp_btc_addr = other_btc.clone())),
            ("depositAddr", Box::new(|q: &mut PegoutQuote| q.deposit_addr = sample_deposit_address())),
            (
                "rskRefundAddress",
                Box::new(|q: &mut PegoutQuote| q.rsk_refund_address = "0x4444444444444444444444444444444444444444".to_string()),
            ),
        ];

        for (field, mutate) in mutations {
            let mut mutated = response.clone();
            mutate(&mut mutated.quote);
            // user-controlled fields move with the request so only the hash can catch them
            let request = pegout_request(&mutated);
            let err = validate_pegout_quote(&chain, &test_settings(), URL, &request, &mutated)
                .await
                .unwrap_err();
            assert!(
                matches!(err, FlyoverError::QuoteHashMismatch { .. }),
                "{} change was not caught: {:?}",
                field,
                err
            );
        }
    }
}
