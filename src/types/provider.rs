//! Liquidity Provider Descriptor
//!
//! Providers come from the on-chain registry; only the fields needed to
//! reach and authenticate one are modelled here.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::address::validate_rsk_address;
use crate::common::error::{FlyoverError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityProvider {
    pub id: u64,
    pub provider_address: String,
    pub name: String,
    pub api_base_url: String,
    #[serde(default)]
    pub status: bool,
}

impl LiquidityProvider {
    /// Fail with the full list of empty required fields
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = [
            ("providerAddress", &self.provider_address),
            ("name", &self.name),
            ("apiBaseUrl", &self.api_base_url),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FlyoverError::MissingRequiredFields { fields: missing })
        }
    }

    /// Signing address the provider's quote acceptances must recover to
    pub fn signer(&self, chain_id: u64) -> Result<Address> {
        validate_rsk_address(&self.provider_address, chain_id)
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Check that every named field is present and non-empty in a JSON object.
///
/// `null` and blank strings count as missing. Non-objects miss everything.
pub fn require_fields(value: &serde_json::Value, fields: &[&str]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| match value.get(**field) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlyoverError::MissingRequiredFields { fields: missing })
    }
}
