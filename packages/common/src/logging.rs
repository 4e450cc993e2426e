//! Structured logging for token operations
//!
//! Provides `env_logger`-based initialization and helpers that log token
//! lifecycle events server-side. Tokens and identifiers are only ever logged
//! as truncated SHA-256 fingerprints, and failures are logged with their
//! internal cause, which must never be handed back to the caller.

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Number of hex characters kept from the SHA-256 digest.
const FINGERPRINT_HEX_LEN: usize = 12;

/// Logging entry points shared by the attestor crates.
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging (call once at application startup)
    ///
    /// Levels are configured through `RUST_LOG`, for example
    /// `RUST_LOG=attestor_token=debug` to see why tokens are rejected.
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for tests; repeated calls are harmless.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a successfully issued token.
    pub fn log_issued(algorithm: &str, token_id: &str, expires_at: i64) {
        let id_hash = token_fingerprint(token_id);
        info!("Token issued (alg: {algorithm}, jti_hash: {id_hash}, exp: {expires_at})");
    }

    /// Log an imported key. Only the algorithm and modulus size are written.
    pub fn log_key_imported(role: &str, algorithm: &str, bits: usize) {
        debug!("Imported {role} key (alg: {algorithm}, bits: {bits})");
    }

    /// Log an async worker that went away before reporting a result.
    pub fn log_worker_dropped(operation: &str) {
        warn!("Token {operation} worker dropped its result");
    }

    /// Log a failed issuance with its internal cause.
    pub fn log_issue_failure(cause: &dyn Display) {
        warn!("Token issuance failed: {cause}");
    }

    /// Log a successful validation.
    pub fn log_accepted(token: &str, algorithm: &str) {
        debug!(
            "Token accepted (alg: {algorithm}, token_hash: {})",
            token_fingerprint(token)
        );
    }

    /// Log a rejected token with its internal cause.
    ///
    /// The cause is for operators only. Callers receive a single generic
    /// message regardless of what is logged here.
    pub fn log_rejection(token: &str, cause: &dyn Display) {
        debug!(
            "Token rejected: {cause} (token_hash: {})",
            token_fingerprint(token)
        );
    }
}

/// SHA-256 fingerprint of a token or identifier, safe to write to logs.
///
/// Returns `#` followed by the first 12 hex characters of the digest.
#[must_use]
pub fn token_fingerprint(value: &str) -> String {
    let digest = hex::encode(Sha256::digest(value.as_bytes()));
    format!("#{}", &digest[..FINGERPRINT_HEX_LEN])
}
