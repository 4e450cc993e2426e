//! Token verifier
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. structure (three base64url segments, JSON header)
//! 2. header `alg` equals the key's algorithm, `typ` is `JWT`, no `crit`
//! 3. signature
//! 4. payload is a JSON object
//! 5. `iss` equals the expected issuer
//! 6. `aud` shares a recipient with the expected audience
//! 7. `exp` is present and still in the future
//! 8. `iat` is present and not in the future
//! 9. `nbf`, if present, is not in the future
//!
//! Time checks accept a leeway of at most [`MAX_LEEWAY`].

use crate::algorithm::Algorithm;
use crate::claims::{names, Audience, ClaimSet, VerifiedClaims};
use crate::clock::{Clock, SystemClock};
use crate::compact::{Segments, TOKEN_TYPE};
use crate::error::{Rejection, ValidateError};
use crate::keys::{import_verification_key, VerificationKey};
use attestor_common::LoggingTransformer;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Largest clock-skew tolerance accepted.
pub const MAX_LEEWAY: Duration = Duration::from_secs(300);

/// Everything needed to validate one token against PEM key material.
#[derive(Clone)]
pub struct ValidateParams {
    token: String,
    public_key_pem: String,
    issuer: String,
    audience: Audience,
    algorithm: Algorithm,
    leeway: Duration,
}

impl ValidateParams {
    /// Parameters expecting RS256 and no clock skew.
    pub fn new(
        token: impl Into<String>,
        public_key_pem: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<Audience>,
    ) -> Self {
        Self {
            token: token.into(),
            public_key_pem: public_key_pem.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm: Algorithm::default(),
            leeway: Duration::ZERO,
        }
    }

    /// Expect `algorithm` instead of RS256.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Clock-skew tolerance, capped at [`MAX_LEEWAY`].
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway.min(MAX_LEEWAY);
        self
    }

    /// The token being validated.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    fn policy(&self) -> VerificationPolicy {
        VerificationPolicy::new(self.issuer.clone(), self.audience.clone()).with_leeway(self.leeway)
    }
}

impl std::fmt::Debug for ValidateParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidateParams")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

/// Issuer, audience and skew policy enforced by a [`TokenVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPolicy {
    issuer: String,
    audience: Audience,
    leeway: Duration,
}

impl VerificationPolicy {
    /// Policy with no clock-skew tolerance.
    pub fn new(issuer: impl Into<String>, audience: impl Into<Audience>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: Duration::ZERO,
        }
    }

    /// Clock-skew tolerance, capped at [`MAX_LEEWAY`].
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway.min(MAX_LEEWAY);
        self
    }

    /// Expected `iss`.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Accepted recipients.
    #[must_use]
    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    /// Effective clock-skew tolerance.
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    fn leeway_seconds(&self) -> i64 {
        // capped at MAX_LEEWAY, always fits
        i64::try_from(self.leeway.as_secs()).unwrap_or(0)
    }
}

/// Verifies tokens against one imported public key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: VerificationKey,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Verifier using the wall clock.
    #[must_use]
    pub fn new(key: VerificationKey) -> Self {
        Self {
            key,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Algorithm every accepted token must declare.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the opaque `ValidateError` for every kind of rejection. The
    /// cause is logged at debug level with a fingerprint of the token.
    pub fn verify(
        &self,
        token: &str,
        policy: &VerificationPolicy,
    ) -> Result<VerifiedClaims, ValidateError> {
        match self.check(token, policy) {
            Ok(claims) => {
                LoggingTransformer::log_accepted(token, self.key.algorithm().as_str());
                Ok(claims)
            }
            Err(rejection) => {
                LoggingTransformer::log_rejection(token, &rejection);
                Err(ValidateError)
            }
        }
    }

    pub(crate) fn check(
        &self,
        token: &str,
        policy: &VerificationPolicy,
    ) -> Result<VerifiedClaims, Rejection> {
        if policy.issuer.is_empty() {
            return Err(Rejection::InvalidPolicy("issuer is empty"));
        }
        if policy.audience.is_empty() {
            return Err(Rejection::InvalidPolicy("audience is empty"));
        }

        let segments = Segments::split(token)?;
        let header = segments.header()?;

        let expected = self.key.algorithm().as_str();
        if header.alg != expected {
            return Err(Rejection::AlgorithmMismatch {
                expected,
                found: header.alg,
            });
        }
        if let Some(typ) = header.typ {
            if !typ.eq_ignore_ascii_case(TOKEN_TYPE) {
                return Err(Rejection::UnexpectedType(typ));
            }
        }
        if header.crit.is_some() {
            return Err(Rejection::CriticalHeader);
        }

        let signature = segments.signature()?;
        if !self
            .key
            .verify(segments.signing_input().as_bytes(), &signature)
        {
            return Err(Rejection::BadSignature);
        }

        let claims = segments.claims()?;

        let issuer = match claims.get(names::ISSUER) {
            Some(Value::String(iss)) => iss.clone(),
            Some(_) => return Err(Rejection::InvalidClaim(names::ISSUER)),
            None => return Err(Rejection::MissingClaim(names::ISSUER)),
        };
        if issuer != policy.issuer {
            return Err(Rejection::IssuerMismatch);
        }

        let audience = claims
            .get(names::AUDIENCE)
            .ok_or(Rejection::MissingClaim(names::AUDIENCE))
            .and_then(|aud| {
                Audience::from_claim(aud).ok_or(Rejection::InvalidClaim(names::AUDIENCE))
            })?;
        if !audience.intersects(&policy.audience) {
            return Err(Rejection::AudienceMismatch);
        }

        let now = self.clock.now().timestamp();
        let leeway = policy.leeway_seconds();

        let expires_at = numeric_date(&claims, names::EXPIRATION)?
            .ok_or(Rejection::MissingClaim(names::EXPIRATION))?;
        if expires_at <= now.saturating_sub(leeway) {
            return Err(Rejection::Expired {
                exp: expires_at,
                now,
            });
        }

        let issued_at = numeric_date(&claims, names::ISSUED_AT)?
            .ok_or(Rejection::MissingClaim(names::ISSUED_AT))?;
        if issued_at > now.saturating_add(leeway) {
            return Err(Rejection::NotYetValid {
                claim: names::ISSUED_AT,
                at: issued_at,
                now,
            });
        }

        let not_before = numeric_date(&claims, names::NOT_BEFORE)?;
        if let Some(nbf) = not_before {
            if nbf > now.saturating_add(leeway) {
                return Err(Rejection::NotYetValid {
                    claim: names::NOT_BEFORE,
                    at: nbf,
                    now,
                });
            }
        }

        Ok(VerifiedClaims {
            issuer,
            audience,
            issued_at,
            expires_at,
            not_before,
            claims,
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Read a NumericDate claim. Fractional seconds are floored.
fn numeric_date(claims: &ClaimSet, name: &'static str) -> Result<Option<i64>, Rejection> {
    let Some(value) = claims.get(name) else {
        return Ok(None);
    };
    let Value::Number(number) = value else {
        return Err(Rejection::InvalidClaim(name));
    };

    if let Some(seconds) = number.as_i64() {
        return Ok(Some(seconds));
    }
    match number.as_f64() {
        Some(seconds) if seconds.is_finite() => Ok(Some(seconds.floor() as i64)),
        _ => Err(Rejection::InvalidClaim(name)),
    }
}

/// Import the key in `params` and validate the token against the wall clock.
///
/// # Errors
///
/// Returns the opaque `ValidateError` on any failure; the cause is logged.
pub fn validate(params: &ValidateParams) -> Result<ClaimSet, ValidateError> {
    validate_with(Arc::new(SystemClock), params)
}

/// [`validate`] with an injected time source.
///
/// # Errors
///
/// Returns the opaque `ValidateError` on any failure; the cause is logged.
pub fn validate_with(
    clock: Arc<dyn Clock>,
    params: &ValidateParams,
) -> Result<ClaimSet, ValidateError> {
    let key = import_verification_key(&params.public_key_pem, params.algorithm).map_err(|e| {
        LoggingTransformer::log_rejection(&params.token, &Rejection::KeyImport(e));
        ValidateError
    })?;

    TokenVerifier::new(key)
        .with_clock(clock)
        .verify(&params.token, &params.policy())
        .map(VerifiedClaims::into_claim_set)
}
