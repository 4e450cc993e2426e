//! Common infrastructure for the attestor crates
//!
//! Currently this is the logging bootstrap plus helpers that let the token
//! crates describe what happened to a token without writing the token, its
//! claims or any key material into the logs.

pub mod logging;

pub use logging::{LoggingTransformer, token_fingerprint};
