//! Shared test fixtures

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, PubkeyHash, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};

use crate::address::pegin_refund_sentinel;
use crate::chain::{CallForUser, RawLog};
use crate::common::config::{Network, VerifierSettings};
use crate::retry::RetryPolicy;
use crate::types::{
    LiquidityProvider, PeginQuote, PeginQuoteResponse, PeginQuoteStatus, PeginState,
    PeginStatusInfo, PegoutQuote, PegoutQuoteResponse, PegoutQuoteStatus, PegoutState,
    PegoutStatusInfo,
};

pub const TEST_LBC: &str = "0x8901a2bbf639bfd21a97004ba4d7ae2bd00b8da8";

pub fn test_settings() -> VerifierSettings {
    VerifierSettings {
        network: Network::Testnet,
        lbc_address: TEST_LBC.parse().unwrap(),
        status_retry: RetryPolicy::none(),
    }
}

pub fn sample_quote_hash() -> B256 {
    B256::repeat_byte(0x5a)
}

// ---- keys and signatures ----

pub fn test_secret_key(seed: u8) -> SecretKey {
    SecretKey::from_slice(&[seed.max(1); 32]).unwrap()
}

pub fn address_of(key: &SecretKey) -> Address {
    let public = PublicKey::from_secret_key(SECP256K1, key);
    Address::from_raw_public_key(&public.serialize_uncompressed()[1..])
}

/// EIP-191 signature over the quote hash, `0x` + r || s || v with v in {27, 28}
pub fn sign_quote_hash(key: &SecretKey, hash: B256) -> String {
    let digest = alloy_primitives::eip191_hash_message(hash.as_slice());
    let message = Message::from_digest(digest.0);
    let (recovery_id, compact) = SECP256K1
        .sign_ecdsa_recoverable(&message, key)
        .serialize_compact();

    let mut bytes = compact.to_vec();
    bytes.push(u8::try_from(recovery_id.to_i32() + 27).unwrap());
    format!("0x{}", hex::encode(bytes))
}

// ---- bitcoin ----

/// A testnet P2PKH address owned by the user
pub fn sample_btc_address() -> String {
    bitcoin::Address::p2pkh(PubkeyHash::from_byte_array([7; 20]), bitcoin::Network::Testnet).to_string()
}

/// A testnet P2SH address standing in for the bridge-derived deposit address
pub fn sample_deposit_address() -> String {
    let redeem = ScriptBuf::from_bytes(vec![0x51]);
    bitcoin::Address::p2sh(&redeem, bitcoin::Network::Testnet)
        .unwrap()
        .to_string()
}

pub fn sample_deposit_script() -> ScriptBuf {
    crate::address::parse_btc_address(&sample_deposit_address(), bitcoin::Network::Testnet)
        .unwrap()
        .script_pubkey()
}

pub fn sample_change_script() -> ScriptBuf {
    crate::address::parse_btc_address(&sample_btc_address(), bitcoin::Network::Testnet)
        .unwrap()
        .script_pubkey()
}

/// One-input transaction with the given outputs
pub fn tx_paying(outputs: &[(ScriptBuf, u64)], with_witness: bool) -> Transaction {
    let witness = if with_witness {
        Witness::from_slice(&[vec![0x30; 71], vec![0x02; 33]])
    } else {
        Witness::new()
    };

    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::from_byte_array([1; 32]),
                vout: 0,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness,
        }],
        output: outputs
            .iter()
            .map(|(script, sats)| TxOut {
                value: Amount::from_sat(*sats),
                script_pubkey: script.clone(),
            })
            .collect(),
    }
}

// ---- quotes ----

pub fn sample_pegin_quote() -> PeginQuote {
    PeginQuote {
        fed_btc_addr: "2N1GMB8gxHYR5HLPSRgf9CJ9Lunjb9CTnKB".to_string(),
        lbc_addr: TEST_LBC.to_string(),
        lp_rsk_addr: format!("{:#x}", address_of(&test_secret_key(1))),
        btc_refund_addr: pegin_refund_sentinel(bitcoin::Network::Testnet).to_string(),
        rsk_refund_addr: "0x2222222222222222222222222222222222222222".to_string(),
        lp_btc_addr: sample_btc_address(),
        call_fee: 10_000_000_000_000_000,
        penalty_fee: 1_000_000,
        contract_addr: "0x3333333333333333333333333333333333333333".to_string(),
        data: "0x".to_string(),
        gas_limit: 21_000,
        nonce: 4_711,
        value: 600_000_000_000_000_000,
        agreement_timestamp: 1_700_000_000,
        time_for_deposit: 3_600,
        lp_call_time: 7_200,
        confirmations: 2,
        call_on_register: false,
        gas_fee: 0,
        product_fee_amount: 0,
    }
}

pub fn sample_pegout_quote() -> PegoutQuote {
    PegoutQuote {
        lbc_address: TEST_LBC.to_string(),
        lp_rsk_addr: format!("{:#x}", address_of(&test_secret_key(1))),
        btc_refund_address: sample_btc_address(),
        rsk_refund_address: "0x2222222222222222222222222222222222222222".to_string(),
        lp_btc_addr: sample_btc_address(),
        call_fee: 10_000_000_000_000_000,
        penalty_fee: 1_000_000,
        nonce: 815,
        deposit_addr: sample_btc_address(),
        value: 500_000_000_000_000_000,
        agreement_timestamp: 1_700_000_000,
        deposit_date_limit: 1_700_003_600,
        deposit_confirmations: 10,
        transfer_confirmations: 2,
        transfer_time: 7_200,
        expire_date: 1_700_010_800,
        expire_blocks: 6_000_000,
        gas_fee: 1_000_000_000_000,
        product_fee_amount: 0,
    }
}

pub fn sample_pegin_response() -> PeginQuoteResponse {
    PeginQuoteResponse {
        quote: sample_pegin_quote(),
        quote_hash: sample_quote_hash().to_string(),
    }
}

pub fn sample_pegout_response() -> PegoutQuoteResponse {
    PegoutQuoteResponse {
        quote: sample_pegout_quote(),
        quote_hash: sample_quote_hash().to_string(),
    }
}

/// Stand-in for the contract's struct hash: any field change changes it
pub fn json_hash(quote: &PegoutQuote) -> B256 {
    keccak256(serde_json::to_vec(quote).unwrap())
}

pub fn sample_provider() -> LiquidityProvider {
    LiquidityProvider {
        id: 1,
        provider_address: format!("{:#x}", address_of(&test_secret_key(1))),
        name: "Test LP".to_string(),
        api_base_url: "https://lps.example".to_string(),
        status: true,
    }
}

// ---- provider status bodies ----

pub fn pegin_status_json(quote: &PeginQuote, state: PeginState, call_for_user_tx_hash: &str) -> String {
    let status = PeginQuoteStatus {
        detail: quote.clone(),
        status: PeginStatusInfo {
            state,
            quote_hash: sample_quote_hash().to_string(),
            deposit_address: sample_deposit_address(),
            user_btc_tx_hash: String::new(),
            call_for_user_tx_hash: call_for_user_tx_hash.to_string(),
            register_peg_in_tx_hash: String::new(),
        },
    };
    serde_json::to_string(&status).unwrap()
}

pub fn pegout_status_json(quote: &PegoutQuote, state: PegoutState, lp_btc_tx_hash: &str) -> String {
    let status = PegoutQuoteStatus {
        detail: quote.clone(),
        status: PegoutStatusInfo {
            state,
            quote_hash: sample_quote_hash().to_string(),
            deposit_address: TEST_LBC.to_string(),
            user_rsk_tx_hash: String::new(),
            lp_btc_tx_hash: lp_btc_tx_hash.to_string(),
            refund_peg_out_tx_hash: String::new(),
            bridge_refund_tx_hash: String::new(),
        },
    };
    serde_json::to_string(&status).unwrap()
}

// ---- contract logs ----

/// A `CallForUser` log for `quote_hash` as emitted by `bridge`
pub fn call_for_user_log(bridge: Address, quote_hash: B256) -> RawLog {
    let event = CallForUser {
        from: Address::repeat_byte(0x11),
        dest: Address::repeat_byte(0x22),
        quoteHash: quote_hash,
        gasLimit: U256::from(21_000u64),
        value: U256::from(600_000_000_000_000_000u64),
        data: Bytes::new(),
        success: true,
    };

    RawLog {
        address: bridge,
        topics: vec![
            CallForUser::SIGNATURE_HASH,
            event.from.into_word(),
            event.dest.into_word(),
            quote_hash,
        ],
        data: Bytes::from(event.encode_data()),
    }
}
