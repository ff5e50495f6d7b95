//! Address Codec
//!
//! Normalisation and validation for Bitcoin addresses and contract-chain
//! (RSK) account addresses. RSK checksums follow EIP-1191, which folds the
//! chain id into the hash.

use std::str::FromStr;

use alloy_primitives::{Address, B256};
use bitcoin::address::NetworkUnchecked;
use bitcoin::hashes::Hash;
use bitcoin::PubkeyHash;

use crate::common::error::{FlyoverError, Result};

/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Lowercase hex without prefix
pub fn normalize_hex(value: &str) -> String {
    strip_hex_prefix(value.trim()).to_ascii_lowercase()
}

/// Compare two hex strings ignoring case and `0x` prefix
pub fn hex_eq(a: &str, b: &str) -> bool {
    normalize_hex(a) == normalize_hex(b)
}

/// Parse a 32-byte quote hash, prefix optional
pub fn parse_quote_hash(value: &str) -> Result<B256> {
    let bytes = hex::decode(normalize_hex(value))
        .map_err(|e| FlyoverError::InvalidQuoteHash(format!("{}: {}", value, e)))?;
    if bytes.len() != 32 {
        return Err(FlyoverError::InvalidQuoteHash(format!(
            "{}: expected 32 bytes, got {}",
            value,
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

/// Check the shape of an RSK address: `0x` followed by 40 hex characters
pub fn is_rsk_address(value: &str) -> bool {
    let Some(body) = value.strip_prefix("0x") else {
        return false;
    };
    body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check that a mixed-case RSK address carries a valid EIP-1191 checksum
pub fn is_rsk_checksummed(value: &str, chain_id: u64) -> bool {
    match Address::from_str(value) {
        Ok(address) => address.to_checksum(Some(chain_id)) == value,
        Err(_) => false,
    }
}

/// Parse an RSK address.
///
/// All-lowercase and all-uppercase bodies are accepted as unchecksummed;
/// mixed case must match the EIP-1191 checksum for `chain_id`.
pub fn validate_rsk_address(value: &str, chain_id: u64) -> Result<Address> {
    if !is_rsk_address(value) {
        return Err(FlyoverError::InvalidRskAddress {
            address: value.to_string(),
        });
    }

    let body = &value[2..];
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && !is_rsk_checksummed(value, chain_id) {
        return Err(FlyoverError::ChecksumError {
            address: value.to_string(),
        });
    }

    Address::from_str(value).map_err(|_| FlyoverError::InvalidRskAddress {
        address: value.to_string(),
    })
}

/// Parse a Bitcoin address and require it to belong to `network`
pub fn parse_btc_address(value: &str, network: bitcoin::Network) -> Result<bitcoin::Address> {
    let invalid = || FlyoverError::InvalidBtcAddress {
        address: value.to_string(),
        network: network.to_string(),
    };

    bitcoin::Address::<NetworkUnchecked>::from_str(value.trim())
        .map_err(|_| invalid())?
        .require_network(network)
        .map_err(|_| invalid())
}

/// Check whether a string is a Bitcoin address on any network
pub fn is_btc_address(value: &str) -> bool {
    bitcoin::Address::<NetworkUnchecked>::from_str(value.trim()).is_ok()
}

pub fn is_btc_mainnet_address(value: &str) -> bool {
    parse_btc_address(value, bitcoin::Network::Bitcoin).is_ok()
}

pub fn is_btc_testnet_address(value: &str) -> bool {
    parse_btc_address(value, bitcoin::Network::Testnet).is_ok()
}

/// The all-zero-hash P2PKH address of a network.
///
/// Pegin quotes must carry this as their BTC refund address: refunds go
/// back through the deposit address itself, never to an LP-chosen one.
pub fn pegin_refund_sentinel(network: bitcoin::Network) -> bitcoin::Address {
    bitcoin::Address::p2pkh(PubkeyHash::all_zeros(), network)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    #[test]
    fn test_hex_helpers() {
        assert_eq!(strip_hex_prefix("0xabc"), "abc");
        assert_eq!(strip_hex_prefix("0Xabc"), "abc");
        assert_eq!(strip_hex_prefix("abc"), "abc");
        assert!(hex_eq("0xABcd", "abcd"));
        assert!(!hex_eq("0xabce", "abcd"));
    }

    #[test]
    fn test_parse_quote_hash_prefix_insensitive() {
        let raw = "ab".repeat(32);
        let with_prefix = parse_quote_hash(&format!("0x{}", raw)).unwrap();
        let without = parse_quote_hash(&raw.to_uppercase()).unwrap();
        assert_eq!(with_prefix, without);
        assert!(parse_quote_hash("0x1234").is_err());
        assert!(parse_quote_hash("zz").is_err());
    }

    #[test]
    fn test_rsk_address_shape() {
        assert!(is_rsk_address(LOWER));
        assert!(!is_rsk_address(&LOWER[2..]));
        assert!(!is_rsk_address("0x1234"));
        assert!(matches!(
            validate_rsk_address("0xnothex0000000000000000000000000000000000", 30),
            Err(FlyoverError::InvalidRskAddress { .. })
        ));
    }

    #[test]
    fn test_rsk_checksum_depends_on_chain_id() {
        let address = Address::from_str(LOWER).unwrap();
        let mainnet = address.to_checksum(Some(30));
        let testnet = address.to_checksum(Some(31));

        assert!(validate_rsk_address(&mainnet, 30).is_ok());
        assert!(validate_rsk_address(&testnet, 31).is_ok());
        assert!(validate_rsk_address(LOWER, 31).is_ok());

        if mainnet != testnet {
            assert!(matches!(
                validate_rsk_address(&mainnet, 31),
                Err(FlyoverError::ChecksumError { .. })
            ));
        }
    }

    #[test]
    fn test_btc_networks() {
        let mainnet = pegin_refund_sentinel(bitcoin::Network::Bitcoin).to_string();
        assert_eq!(mainnet, "1111111111111111111114oLvT2");
        assert!(is_btc_mainnet_address(&mainnet));
        assert!(!is_btc_testnet_address(&mainnet));

        let testnet = pegin_refund_sentinel(bitcoin::Network::Testnet).to_string();
        assert!(is_btc_testnet_address(&testnet));
        assert!(!is_btc_mainnet_address(&testnet));
        assert!(is_btc_address(&testnet));
        assert!(!is_btc_address("not-an-address"));
    }

    #[test]
    fn test_parse_btc_address_reports_network() {
        let err = parse_btc_address("1111111111111111111114oLvT2", bitcoin::Network::Testnet)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_BTC_ADDRESS");
        assert!(err.to_string().contains("testnet"));
    }
}
