//! Serializable issuance and verification policies
//!
//! Services usually fix issuer, audience and algorithm in configuration and
//! only vary the payload or token per request. These types deserialize from
//! that configuration and produce the per-call parameter structs.
//!
//! ```json
//! { "issuer": "urn:example:issuer", "audience": ["api", "web"],
//!   "algorithm": "RS384", "expiration": "1h" }
//! ```

use crate::algorithm::Algorithm;
use crate::claims::{Audience, ClaimSet};
use crate::expiry::DEFAULT_EXPIRATION;
use crate::issuer::GenerateParams;
use crate::verifier::ValidateParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_expiration() -> String {
    DEFAULT_EXPIRATION.to_string()
}

/// Issuance settings shared by every token a service mints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerPolicy {
    /// `iss` written on every token
    pub issuer: String,
    /// `aud` written on every token
    pub audience: Audience,
    /// Signature algorithm, RS256 when omitted
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Lifetime expression, `"15m"` when omitted
    #[serde(default = "default_expiration")]
    pub expiration: String,
}

impl IssuerPolicy {
    /// Parameters for minting `payload` under this policy.
    pub fn params(&self, payload: ClaimSet, private_key_pem: impl Into<String>) -> GenerateParams {
        GenerateParams::new(
            payload,
            private_key_pem,
            self.issuer.clone(),
            self.audience.clone(),
        )
        .with_algorithm(self.algorithm)
        .with_expiration(self.expiration.clone())
    }
}

/// Acceptance settings for tokens presented to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierPolicy {
    /// Required `iss`
    pub issuer: String,
    /// Accepted `aud` values
    pub audience: Audience,
    /// Required header `alg`, RS256 when omitted
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Clock-skew tolerance in seconds, capped at five minutes
    #[serde(default)]
    pub leeway_seconds: u64,
}

impl VerifierPolicy {
    /// Parameters for validating `token` under this policy.
    pub fn params(
        &self,
        token: impl Into<String>,
        public_key_pem: impl Into<String>,
    ) -> ValidateParams {
        ValidateParams::new(
            token,
            public_key_pem,
            self.issuer.clone(),
            self.audience.clone(),
        )
        .with_algorithm(self.algorithm)
        .with_leeway(Duration::from_secs(self.leeway_seconds))
    }
}
