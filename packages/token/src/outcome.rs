//! Tagged results for the public operations
//!
//! `generate_token` and `validate_token` never fail and never panic: every
//! outcome is a value with a `success` flag. Errors carry only the generic
//! message of `IssueError` or `ValidateError`.

use crate::claims::ClaimSet;
use crate::clock::{Clock, IdSource, SystemClock, UuidIds};
use crate::compact::Token;
use crate::error::{IssueError, ValidateError};
use crate::issuer::{self, GenerateParams};
use crate::verifier::{self, ValidateParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a token generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateTokenResult {
    /// Whether a token was produced
    pub success: bool,
    /// Compact token, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Generic failure message, on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Token, IssueError>> for GenerateTokenResult {
    fn from(result: Result<Token, IssueError>) -> Self {
        match result {
            Ok(token) => Self {
                success: true,
                token: Some(token.into_string()),
                error: None,
            },
            Err(e) => Self {
                success: false,
                token: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Outcome of a token validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateTokenResult {
    /// Whether the token was accepted
    pub success: bool,
    /// Full claim set, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ClaimSet>,
    /// Generic failure message, on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<ClaimSet, ValidateError>> for ValidateTokenResult {
    fn from(result: Result<ClaimSet, ValidateError>) -> Self {
        match result {
            Ok(payload) => Self {
                success: true,
                payload: Some(payload),
                error: None,
            },
            Err(e) => Self {
                success: false,
                payload: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Mint a token using the wall clock and random identifiers.
#[must_use]
pub fn generate_token(params: &GenerateParams) -> GenerateTokenResult {
    generate_token_with(Arc::new(SystemClock), Arc::new(UuidIds), params)
}

/// [`generate_token`] with injected time and identifier sources.
#[must_use]
pub fn generate_token_with(
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    params: &GenerateParams,
) -> GenerateTokenResult {
    issuer::generate_with(clock, ids, params).into()
}

/// Validate a token against the wall clock.
#[must_use]
pub fn validate_token(params: &ValidateParams) -> ValidateTokenResult {
    validate_token_with(Arc::new(SystemClock), params)
}

/// [`validate_token`] with an injected time source.
#[must_use]
pub fn validate_token_with(clock: Arc<dyn Clock>, params: &ValidateParams) -> ValidateTokenResult {
    verifier::validate_with(clock, params).into()
}
