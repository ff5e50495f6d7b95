//! flyover-check - operator checks against a liquidity provider
//!
//! Only needs the provider's HTTP API and an Esplora endpoint; checks that
//! require contract-chain reads live in the library.
//!
//! Run modes:
//!   flyover-check status --provider <url> --hash <quote hash> [--pegout]
//!   flyover-check pegout-paid --provider <url> --hash <quote hash>
//!   flyover-check refund-proof --tx <btc txid>
//!   flyover-check config

use std::env;
use std::sync::Arc;

use flyover_verifier::btc_spv::prepare_refund_proof;
use flyover_verifier::clock::TokioSleeper;
use flyover_verifier::common::config::FlyoverConfig;
use flyover_verifier::common::logging::init_from_config;
use flyover_verifier::esplora::EsploraClient;
use flyover_verifier::lps::{LpsClient, ReqwestHttpClient};
use flyover_verifier::payment_proof::is_pegout_quote_paid;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = match FlyoverConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = init_from_config(&config) {
        eprintln!("Warning: logging not initialised: {}", e);
    }

    let ok = match args[1].as_str() {
        "status" => run_status(&config, &args[2..]).await,
        "pegout-paid" => run_pegout_paid(&config, &args[2..]).await,
        "refund-proof" => run_refund_proof(&config, &args[2..]).await,
        "config" => {
            config.print_summary();
            true
        }
        _ => {
            print_usage();
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("flyover-check - verify liquidity provider claims");
    println!();
    println!("Usage:");
    println!("  flyover-check status --provider <url> --hash <quote hash> [--pegout]");
    println!("  flyover-check pegout-paid --provider <url> --hash <quote hash>");
    println!("  flyover-check refund-proof --tx <btc txid>");
    println!("  flyover-check config");
    println!();
    println!("Environment Variables:");
    println!("  FLYOVER_NETWORK                 mainnet | testnet | regtest (default: testnet)");
    println!("  FLYOVER_ESPLORA_URL             Esplora API endpoint");
    println!("  FLYOVER_LBC_ADDRESS             Liquidity bridge contract address");
    println!("  FLYOVER_CAPTCHA_TOKEN           Captcha token for quote acceptance");
    println!("  FLYOVER_STATUS_RETRY_ATTEMPTS   Status fetch attempts (default: 3)");
    println!("  FLYOVER_STATUS_RETRY_DELAY_MS   Delay between attempts (default: 3000)");
    println!("  FLYOVER_LOG_LEVEL               debug | info | warn | error");
}

/// Parsed `--flag value` pairs
#[derive(Default)]
struct Flags {
    provider: Option<String>,
    hash: Option<String>,
    tx: Option<String>,
    pegout: bool,
}

fn parse_flags(args: &[String]) -> Flags {
    let mut flags = Flags::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--provider" if i + 1 < args.len() => {
                flags.provider = Some(args[i + 1].clone());
                i += 2;
            }
            "--hash" if i + 1 < args.len() => {
                flags.hash = Some(args[i + 1].clone());
                i += 2;
            }
            "--tx" if i + 1 < args.len() => {
                flags.tx = Some(args[i + 1].clone());
                i += 2;
            }
            "--pegout" => {
                flags.pegout = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    flags
}

fn lps_client(config: &FlyoverConfig) -> LpsClient {
    LpsClient::new(
        Arc::new(ReqwestHttpClient::new(config.captcha_token.clone())),
        Arc::new(TokioSleeper),
        config.status_retry,
    )
}

fn require(value: Option<String>, flag: &str) -> Option<String> {
    if value.is_none() {
        eprintln!("Missing required flag {}", flag);
    }
    value
}

async fn run_status(config: &FlyoverConfig, args: &[String]) -> bool {
    let flags = parse_flags(args);
    let (Some(provider), Some(hash)) = (require(flags.provider, "--provider"), require(flags.hash, "--hash")) else {
        return false;
    };
    let lps = lps_client(config);

    let result = if flags.pegout {
        lps.pegout_status(&provider, &hash)
            .await
            .map(|s| (format!("{:?}", s.status.state), s.status.state.simple_status()))
    } else {
        lps.pegin_status(&provider, &hash)
            .await
            .map(|s| (format!("{:?}", s.status.state), s.status.state.simple_status()))
    };

    match result {
        Ok((state, simple)) => {
            println!("Quote:  {}", hash);
            println!("State:  {}", state);
            println!("Status: {}", simple);
            true
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            false
        }
    }
}

async fn run_pegout_paid(config: &FlyoverConfig, args: &[String]) -> bool {
    let flags = parse_flags(args);
    let (Some(provider), Some(hash)) = (require(flags.provider, "--provider"), require(flags.hash, "--hash")) else {
        return false;
    };

    let lps = lps_client(config);
    let esplora = EsploraClient::new(&config.esplora_url);
    let result = is_pegout_quote_paid(&lps, &esplora, &provider, &hash).await;

    println!("Quote: {}", hash);
    println!("Paid:  {}", result.is_paid);
    if let Some(e) = &result.error {
        println!("Reason [{}]: {}", e.error_code(), e);
        if e.is_security_violation() {
            println!("Warning: {} should not be trusted", provider);
        }
    }
    true
}

async fn run_refund_proof(config: &FlyoverConfig, args: &[String]) -> bool {
    let flags = parse_flags(args);
    let Some(txid) = require(flags.tx, "--tx") else {
        return false;
    };

    let esplora = EsploraClient::new(&config.esplora_url);
    match prepare_refund_proof(&esplora, &txid).await {
        Ok(proof) => {
            println!("Block:            {} (height {})", proof.block_hash, proof.block_height);
            println!("Tx (no witness):  {}", hex::encode(&proof.tx_without_witness));
            println!("Partial merkle:   {}", hex::encode(&proof.partial_merkle_tree));
            true
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            false
        }
    }
}
