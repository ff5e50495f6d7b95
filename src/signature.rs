//! Signature Verifier
//!
//! Providers sign the 32-byte quote hash as an EIP-191 personal message.
//! The signature is 65 bytes `r || s || v` with `v` in {27, 28} (or the raw
//! recovery id {0, 1}).

use alloy_primitives::{eip191_hash_message, Address, B256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};
use tracing::debug;

use crate::address::strip_hex_prefix;
use crate::chain::ChainClient;
use crate::common::error::{FlyoverError, Result};
use crate::quote_validator::reject;
use crate::types::PeginQuote;

/// Length of a recoverable ECDSA signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Recover the address that produced `signature` over `quote_hash`.
///
/// Returns `None` for anything that is not a well-formed recoverable
/// signature.
pub fn recover_signer(quote_hash: B256, signature: &str) -> Option<Address> {
    let bytes = hex::decode(strip_hex_prefix(signature.trim())).ok()?;
    if bytes.len() != SIGNATURE_LENGTH {
        return None;
    }

    let v = i32::from(bytes[64]);
    let recovery = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_i32(recovery).ok()?;
    let sig = RecoverableSignature::from_compact(&bytes[..64], recovery_id).ok()?;

    let digest = eip191_hash_message(quote_hash.as_slice());
    let message = Message::from_digest(digest.0);
    let public_key = SECP256K1.recover_ecdsa(&message, &sig).ok()?;

    // uncompressed key minus the 0x04 tag
    Some(Address::from_raw_public_key(&public_key.serialize_uncompressed()[1..]))
}

/// Require `signature` to recover to `provider_address`
pub fn verify_signature(
    provider_address: Address,
    quote_hash: B256,
    signature: &str,
    server_url: &str,
) -> Result<()> {
    match recover_signer(quote_hash, signature) {
        Some(signer) if signer == provider_address => {
            debug!(target: "flyover::quote", %quote_hash, %signer, "signature verified");
            Ok(())
        }
        _ => Err(reject(FlyoverError::InvalidSignature {
            server_url: server_url.to_string(),
        })),
    }
}

/// Require the bridge to derive `deposit_address` for `quote`
pub async fn verify_pegin_deposit_address(
    chain: &dyn ChainClient,
    quote: &PeginQuote,
    deposit_address: &str,
    server_url: &str,
) -> Result<()> {
    let valid = chain
        .validate_pegin_deposit_address(quote, deposit_address)
        .await
        .map_err(|e| FlyoverError::chain(e.to_string()))?;

    if valid {
        Ok(())
    } else {
        Err(reject(FlyoverError::UntrustedBtcAddress {
            server_url: server_url.to_string(),
            address: deposit_address.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, MockChainClient};
    use crate::test_utils::*;

    #[test]
    fn test_sign_then_recover() {
        for seed in 1u8..=8 {
            let key = test_secret_key(seed);
            let hash = B256::repeat_byte(seed.wrapping_mul(31));
            let signature = sign_quote_hash(&key, hash);

            assert_eq!(recover_signer(hash, &signature), Some(address_of(&key)));
            verify_signature(address_of(&key), hash, &signature, "https://lps.example").unwrap();
        }
    }

    #[test]
    fn test_accepts_unprefixed_and_raw_recovery_id() {
        let key = test_secret_key(7);
        let hash = sample_quote_hash();
        let signature = sign_quote_hash(&key, hash);

        let mut bytes = hex::decode(strip_hex_prefix(&signature)).unwrap();
        bytes[64] -= 27;
        assert_eq!(recover_signer(hash, &hex::encode(bytes)), Some(address_of(&key)));
    }

    #[test]
    fn test_any_bit_flip_fails() {
        let key = test_secret_key(3);
        let hash = sample_quote_hash();
        let bytes = hex::decode(strip_hex_prefix(&sign_quote_hash(&key, hash))).unwrap();

        for bit in 0..bytes.len() * 8 {
            let mut flipped = bytes.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            let err = verify_signature(address_of(&key), hash, &hex::encode(&flipped), "https://lps.example");
            assert!(err.is_err(), "bit {} flip still verified", bit);
        }
    }

    #[test]
    fn test_wrong_signer_or_hash_rejected() {
        let key = test_secret_key(1);
        let other = test_secret_key(2);
        let hash = sample_quote_hash();
        let signature = sign_quote_hash(&key, hash);

        let err = verify_signature(address_of(&other), hash, &signature, "https://evil.example").unwrap_err();
        assert_eq!(
            err,
            FlyoverError::InvalidSignature {
                server_url: "https://evil.example".to_string()
            }
        );
        assert!(err.is_security_violation());

        assert!(verify_signature(address_of(&key), B256::ZERO, &signature, "x").is_err());
        assert!(verify_signature(address_of(&key), hash, "0xdead", "x").is_err());
        assert!(verify_signature(address_of(&key), hash, "not hex", "x").is_err());
    }

    #[tokio::test]
    async fn test_deposit_address_derivation_check() {
        let quote = sample_pegin_quote();
        let mut chain = MockChainClient::new();
        chain
            .expect_validate_pegin_deposit_address()
            .withf(|_, address| address == "2N_good")
            .returning(|_, _| Ok(true));
        chain
            .expect_validate_pegin_deposit_address()
            .returning(|_, _| Ok(false));

        verify_pegin_deposit_address(&chain, &quote, "2N_good", "https://lps.example")
            .await
            .unwrap();

        let err = verify_pegin_deposit_address(&chain, &quote, "2N_evil", "https://lps.example")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FlyoverError::UntrustedBtcAddress {
                server_url: "https://lps.example".to_string(),
                address: "2N_evil".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_deposit_check_rpc_failure_is_not_a_security_signal() {
        let mut chain = MockChainClient::new();
        chain
            .expect_validate_pegin_deposit_address()
            .returning(|_, _| Err(ChainError::Rpc("timeout".to_string())));

        let err = verify_pegin_deposit_address(&chain, &sample_pegin_quote(), "2N", "u")
            .await
            .unwrap_err();
        assert!(!err.is_security_violation());
        assert!(err.is_recoverable());
    }
}
