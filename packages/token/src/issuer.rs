//! Token issuer
//!
//! Builds the final claim set from the caller's payload and the registered
//! claims, signs it and returns the compact token.

use crate::algorithm::Algorithm;
use crate::claims::{names, Audience, ClaimSet};
use crate::clock::{Clock, IdSource, SystemClock, UuidIds};
use crate::compact::{self, Header, Token};
use crate::error::{IssueError, IssueFault};
use crate::expiry::{Expiration, DEFAULT_EXPIRATION};
use crate::keys::{import_signing_key, SigningKey};
use attestor_common::LoggingTransformer;
use serde_json::Value;
use std::sync::Arc;

/// Everything needed to mint one token from PEM key material.
#[derive(Clone)]
pub struct GenerateParams {
    payload: ClaimSet,
    private_key_pem: String,
    issuer: String,
    audience: Audience,
    algorithm: Algorithm,
    expiration: String,
    subject: Option<String>,
}

impl GenerateParams {
    /// Parameters with the default algorithm (RS256) and lifetime (15m).
    pub fn new(
        payload: ClaimSet,
        private_key_pem: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<Audience>,
    ) -> Self {
        Self {
            payload,
            private_key_pem: private_key_pem.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm: Algorithm::default(),
            expiration: DEFAULT_EXPIRATION.to_string(),
            subject: None,
        }
    }

    /// Sign with `algorithm` instead of RS256.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Lifetime as a duration expression such as `"1h"` or `"7d"`.
    #[must_use]
    pub fn with_expiration(mut self, expression: impl Into<String>) -> Self {
        self.expiration = expression.into();
        self
    }

    /// Set the `sub` claim.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Algorithm the token will be signed with.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn options(&self) -> Result<IssueOptions, IssueFault> {
        Ok(IssueOptions {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            expiration: self.expiration.parse()?,
            subject: self.subject.clone(),
        })
    }
}

impl std::fmt::Debug for GenerateParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateParams")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("expiration", &self.expiration)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Registered claim policy for tokens minted by a [`TokenIssuer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOptions {
    /// `iss`
    pub issuer: String,
    /// `aud`
    pub audience: Audience,
    /// Source of `exp`
    pub expiration: Expiration,
    /// `sub`, when set
    pub subject: Option<String>,
}

impl IssueOptions {
    /// Options with the default 15 minute lifetime.
    pub fn new(issuer: impl Into<String>, audience: impl Into<Audience>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            expiration: Expiration::default(),
            subject: None,
        }
    }

    /// Override the lifetime.
    #[must_use]
    pub fn with_expiration(mut self, expiration: impl Into<Expiration>) -> Self {
        self.expiration = expiration.into();
        self
    }

    /// Set the `sub` claim.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Signs tokens with one imported private key.
///
/// Holds no mutable state of its own and can be shared between threads.
#[derive(Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl TokenIssuer {
    /// Issuer using the wall clock and random UUID identifiers.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIds),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the `jti` source.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Algorithm of the underlying key.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    /// Sign `payload` merged with the registered claims from `options`.
    ///
    /// # Errors
    ///
    /// Returns the opaque `IssueError` on any failure; the cause is logged.
    pub fn issue(&self, payload: &ClaimSet, options: &IssueOptions) -> Result<Token, IssueError> {
        self.try_issue(payload, options).map_err(|fault| {
            LoggingTransformer::log_issue_failure(&fault);
            IssueError
        })
    }

    pub(crate) fn try_issue(
        &self,
        payload: &ClaimSet,
        options: &IssueOptions,
    ) -> Result<Token, IssueFault> {
        if options.issuer.is_empty() {
            return Err(IssueFault::MissingIssuer);
        }
        if options.audience.is_empty() {
            return Err(IssueFault::MissingAudience);
        }

        let now = self.clock.now();
        let issued_at = now.timestamp();
        let expires_at = options.expiration.resolve(now)?;
        let token_id = self.ids.next_id();

        let mut claims = payload.clone();
        if let Some(subject) = &options.subject {
            claims.insert(names::SUBJECT.into(), Value::String(subject.clone()));
        }
        claims.insert(names::ISSUER.into(), Value::String(options.issuer.clone()));
        claims.insert(names::AUDIENCE.into(), options.audience.to_claim());
        claims.insert(names::ISSUED_AT.into(), Value::from(issued_at));
        claims.insert(names::EXPIRATION.into(), Value::from(expires_at));
        claims.insert(names::JWT_ID.into(), Value::String(token_id.clone()));

        let header = Header::new(self.key.algorithm());
        let signing_input = compact::signing_input(&header, &claims)?;
        let signature = self.key.sign(signing_input.as_bytes())?;

        LoggingTransformer::log_issued(self.key.algorithm().as_str(), &token_id, expires_at);
        Ok(compact::assemble(signing_input, &signature))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Import the key in `params` and mint a token with the wall clock and
/// random identifiers.
///
/// # Errors
///
/// Returns the opaque `IssueError` on any failure; the cause is logged.
pub fn generate(params: &GenerateParams) -> Result<Token, IssueError> {
    generate_with(Arc::new(SystemClock), Arc::new(UuidIds), params)
}

/// [`generate`] with injected time and identifier sources.
///
/// # Errors
///
/// Returns the opaque `IssueError` on any failure; the cause is logged.
pub fn generate_with(
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    params: &GenerateParams,
) -> Result<Token, IssueError> {
    try_generate(clock, ids, params).map_err(|fault| {
        LoggingTransformer::log_issue_failure(&fault);
        IssueError
    })
}

fn try_generate(
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    params: &GenerateParams,
) -> Result<Token, IssueFault> {
    let key = import_signing_key(&params.private_key_pem, params.algorithm)?;
    let options = params.options()?;
    TokenIssuer::new(key)
        .with_clock(clock)
        .with_ids(ids)
        .try_issue(&params.payload, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SequenceIds};
    use crate::compact::Segments;
    use crate::error::KeyImportError;
    use serde_json::json;

    const PRIVATE_PEM: &str = include_str!("../tests/fixtures/primary_private.pem");
    const PUBLIC_PEM: &str = include_str!("../tests/fixtures/primary_public.pem");
    const NOW: i64 = 1_700_000_000;

    fn payload() -> ClaimSet {
        json!({"role": "admin", "iss": "spoofed", "jti": "spoofed"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn issuer(algorithm: Algorithm) -> TokenIssuer {
        TokenIssuer::new(import_signing_key(PRIVATE_PEM, algorithm).unwrap())
            .with_clock(Arc::new(FixedClock::at_timestamp(NOW)))
            .with_ids(Arc::new(SequenceIds::new("test")))
    }

    #[test]
    fn test_registered_claims_overwrite_payload() {
        let options = IssueOptions::new("urn:issuer", "urn:audience").with_subject("user-1");
        let token = issuer(Algorithm::Rs256).issue(&payload(), &options).unwrap();

        let claims = Segments::split(token.as_str()).unwrap().claims().unwrap();
        assert_eq!(
            Value::Object(claims),
            json!({
                "role": "admin",
                "sub": "user-1",
                "iss": "urn:issuer",
                "aud": "urn:audience",
                "iat": NOW,
                "exp": NOW + 900,
                "jti": "test-1",
            })
        );
    }

    #[test]
    fn test_header_carries_key_algorithm() {
        for alg in Algorithm::ALL {
            let token = issuer(alg)
                .issue(&ClaimSet::new(), &IssueOptions::new("i", "a"))
                .unwrap();
            let header = Segments::split(token.as_str()).unwrap().header().unwrap();
            assert_eq!(header.alg, alg.as_str());
            assert_eq!(header.typ.as_deref(), Some("JWT"));
        }
    }

    #[test]
    fn test_signature_verifies_with_public_key() {
        let token = issuer(Algorithm::Rs512)
            .issue(&payload(), &IssueOptions::new("i", ["a", "b"]))
            .unwrap();
        let key = crate::keys::import_verification_key(PUBLIC_PEM, Algorithm::Rs512).unwrap();

        let segments = Segments::split(token.as_str()).unwrap();
        let signature = segments.signature().unwrap();
        assert!(key.verify(segments.signing_input().as_bytes(), &signature));
    }

    #[test]
    fn test_empty_issuer_or_audience_is_refused() {
        let issuer = issuer(Algorithm::Rs256);
        assert!(matches!(
            issuer.try_issue(&payload(), &IssueOptions::new("", "a")),
            Err(IssueFault::MissingIssuer)
        ));
        assert!(matches!(
            issuer.try_issue(&payload(), &IssueOptions::new("i", "")),
            Err(IssueFault::MissingAudience)
        ));
        assert!(matches!(
            issuer.try_issue(&payload(), &IssueOptions::new("i", Vec::<String>::new())),
            Err(IssueFault::MissingAudience)
        ));
    }

    #[test]
    fn test_generate_reports_generic_error() {
        let params = GenerateParams::new(payload(), PUBLIC_PEM, "i", "a");
        assert!(matches!(
            try_generate(Arc::new(SystemClock), Arc::new(UuidIds), &params),
            Err(IssueFault::KeyImport(KeyImportError::WrongKeyType { .. }))
        ));
        assert_eq!(generate(&params), Err(IssueError));
    }

    #[test]
    fn test_generate_rejects_bad_expiration() {
        let params =
            GenerateParams::new(payload(), PRIVATE_PEM, "i", "a").with_expiration("soon");
        assert!(matches!(
            try_generate(Arc::new(SystemClock), Arc::new(UuidIds), &params),
            Err(IssueFault::Expiry(_))
        ));
    }

    #[test]
    fn test_generate_with_expression() {
        let params = GenerateParams::new(payload(), PRIVATE_PEM, "i", "a")
            .with_algorithm(Algorithm::Rs384)
            .with_expiration("2h");
        let token = generate_with(
            Arc::new(FixedClock::at_timestamp(NOW)),
            Arc::new(SequenceIds::new("g")),
            &params,
        )
        .unwrap();

        let claims = Segments::split(token.as_str()).unwrap().claims().unwrap();
        assert_eq!(claims["exp"], json!(NOW + 7_200));
        assert_eq!(claims["jti"], json!("g-1"));
    }

    #[test]
    fn test_debug_omits_key_material() {
        let params = GenerateParams::new(payload(), PRIVATE_PEM, "i", "a");
        assert!(!format!("{params:?}").contains("PRIVATE KEY"));
    }
}
