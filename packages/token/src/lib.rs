//! RSA-signed, time-bounded identity tokens
//!
//! This crate provides:
//! - Key import from PKCS#8 / SPKI PEM, bound to RS256, RS384 or RS512
//! - Token issuance with registered claims (`iss`, `aud`, `iat`, `exp`, `jti`)
//! - Token verification with algorithm pinning and issuer/audience/expiry policy
//! - Tagged results and async wrappers that never leak why an operation failed
//!
//! ```no_run
//! use attestor_token::{generate_token, validate_token, ClaimSet, GenerateParams, ValidateParams};
//!
//! # let private_pem = "";
//! # let public_pem = "";
//! let issued = generate_token(
//!     &GenerateParams::new(ClaimSet::new(), private_pem, "urn:issuer", "urn:audience")
//!         .with_expiration("1h"),
//! );
//! let token = issued.token.unwrap_or_default();
//!
//! let checked = validate_token(&ValidateParams::new(
//!     token,
//!     public_pem,
//!     "urn:issuer",
//!     "urn:audience",
//! ));
//! assert!(checked.success);
//! ```

mod algorithm;
mod claims;
mod clock;
mod compact;
mod error;
mod expiry;
mod futures;
mod issuer;
mod keys;
mod outcome;
mod policy;
mod verifier;

pub use algorithm::{Algorithm, MIN_RSA_MODULUS_BITS};
pub use claims::{names, Audience, ClaimSet, VerifiedClaims};
pub use clock::{Clock, FixedClock, IdSource, SequenceIds, SystemClock, UuidIds};
pub use compact::{CompactError, Header, Token, TOKEN_TYPE};
pub use error::{ExpiryError, IssueError, KeyImportError, KeyKind, ValidateError};
pub use expiry::{parse_duration, Expiration, DEFAULT_EXPIRATION};
pub use futures::{
    generate_token_async, generate_token_async_with, validate_token_async,
    validate_token_async_with, TokenGenerationFuture, TokenValidationFuture,
};
pub use issuer::{generate, generate_with, GenerateParams, IssueOptions, TokenIssuer};
pub use keys::{import_signing_key, import_verification_key, SigningKey, VerificationKey};
pub use outcome::{
    generate_token, generate_token_with, validate_token, validate_token_with,
    GenerateTokenResult, ValidateTokenResult,
};
pub use policy::{IssuerPolicy, VerifierPolicy};
pub use verifier::{
    validate, validate_with, TokenVerifier, ValidateParams, VerificationPolicy, MAX_LEEWAY,
};
