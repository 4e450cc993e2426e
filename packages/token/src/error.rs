//! Error types for key import, issuance and validation
//!
//! The detailed enums (`KeyImportError`, `ExpiryError`, `IssueFault`,
//! `Rejection`) describe what actually went wrong and are only used inside
//! the crate and in server-side logs. `IssueError` and `ValidateError` are
//! what callers of the public operations see: one generic message each.

use crate::compact::CompactError;
use thiserror::Error;

/// Which half of a key pair an import expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// PKCS#8 private key (signing)
    Private,
    /// SPKI public key (verification)
    Public,
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyKind::Private => f.write_str("private"),
            KeyKind::Public => f.write_str("public"),
        }
    }
}

/// Key material could not be turned into a key handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyImportError {
    /// Not a decodable PEM block of the expected encoding
    #[error("malformed {expected} key PEM")]
    MalformedPem {
        /// Kind of key the caller asked for
        expected: KeyKind,
    },
    /// Decodable, but not an RSA key of the expected kind
    #[error("expected an RSA {expected} key, found {found}")]
    WrongKeyType {
        /// Kind of key the caller asked for
        expected: KeyKind,
        /// What was supplied instead
        found: String,
    },
    /// RSA modulus below the minimum size
    #[error("RSA key is {bits} bits, at least {min} required")]
    WeakKey {
        /// Modulus size of the supplied key
        bits: usize,
        /// Minimum accepted modulus size
        min: usize,
    },
    /// Algorithm identifier outside RS256/RS384/RS512
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Duration expression or expiration timestamp could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    /// Expression does not follow the duration grammar
    #[error("invalid time period format: {0:?}")]
    Invalid(String),
    /// Resulting timestamp is out of range
    #[error("expiration out of range")]
    OutOfRange,
}

/// Internal cause of a failed issuance.
#[derive(Debug, Error)]
pub(crate) enum IssueFault {
    #[error("key import failed: {0}")]
    KeyImport(#[from] KeyImportError),
    #[error("issuer must not be empty")]
    MissingIssuer,
    #[error("audience must not be empty")]
    MissingAudience,
    #[error("bad expiration: {0}")]
    Expiry(#[from] ExpiryError),
    #[error("claim encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("signing failed: {0}")]
    Signing(#[from] rsa::signature::Error),
}

/// Internal cause of a rejected token.
#[derive(Debug, Error)]
pub(crate) enum Rejection {
    #[error("key import failed: {0}")]
    KeyImport(#[from] KeyImportError),
    #[error("verification policy is incomplete: {0}")]
    InvalidPolicy(&'static str),
    #[error("malformed token: {0}")]
    Malformed(#[from] CompactError),
    #[error("header alg {found:?} does not match expected {expected}")]
    AlgorithmMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected typ header {0:?}")]
    UnexpectedType(String),
    #[error("unsupported critical header parameters")]
    CriticalHeader,
    #[error("signature verification failed")]
    BadSignature,
    #[error("missing {0} claim")]
    MissingClaim(&'static str),
    #[error("invalid {0} claim")]
    InvalidClaim(&'static str),
    #[error("issuer mismatch")]
    IssuerMismatch,
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("token expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
    #[error("{claim} {at} is in the future (now {now})")]
    NotYetValid {
        claim: &'static str,
        at: i64,
        now: i64,
    },
}

/// Token generation failed.
///
/// Deliberately carries no detail; the cause is logged server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to generate token")]
pub struct IssueError;

/// Token validation failed.
///
/// Malformed tokens, bad signatures, wrong issuer or audience and expired
/// tokens are indistinguishable through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid or expired token")]
pub struct ValidateError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_messages_are_generic() {
        assert_eq!(IssueError.to_string(), "failed to generate token");
        assert_eq!(ValidateError.to_string(), "invalid or expired token");
    }

    #[test]
    fn test_key_import_messages() {
        let err = KeyImportError::WeakKey {
            bits: 1024,
            min: 2048,
        };
        assert_eq!(err.to_string(), "RSA key is 1024 bits, at least 2048 required");

        let err = KeyImportError::MalformedPem {
            expected: KeyKind::Public,
        };
        assert_eq!(err.to_string(), "malformed public key PEM");
    }

    #[test]
    fn test_rejection_describes_cause() {
        let rejection = Rejection::Expired { exp: 10, now: 11 };
        assert_eq!(rejection.to_string(), "token expired at 10 (now 11)");
    }
}
