//! Compact token encoding: `base64url(header).base64url(payload).base64url(signature)`

use crate::algorithm::Algorithm;
use crate::claims::ClaimSet;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Value of the `typ` header written on every token.
pub const TOKEN_TYPE: &str = "JWT";

/// Structural problems found while splitting or decoding a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompactError {
    /// Not exactly three non-empty segments
    #[error("expected three non-empty segments")]
    SegmentCount,
    /// A segment is not unpadded base64url
    #[error("{0} segment is not base64url")]
    Encoding(&'static str),
    /// Header is not a JSON object with a string `alg`
    #[error("header is not valid JSON")]
    Header,
    /// Payload is not a JSON object
    #[error("payload is not a JSON object")]
    Payload,
}

/// Protected header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signature algorithm name
    pub alg: String,
    /// Media type, `JWT` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Extensions the recipient must understand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,
}

impl Header {
    /// Header for a token signed with `algorithm`.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            alg: algorithm.as_str().to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
            crit: None,
        }
    }
}

/// A signed token in compact form.
///
/// Produced by the issuer and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Borrow the compact string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the compact string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

/// Encode header and claims into the signing input `header.payload`.
pub(crate) fn signing_input(header: &Header, claims: &ClaimSet) -> serde_json::Result<String> {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header_b64}.{payload_b64}"))
}

/// Append the encoded signature to a signing input.
pub(crate) fn assemble(signing_input: String, signature: &[u8]) -> Token {
    let mut token = signing_input;
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(signature));
    Token(token)
}

/// The three segments of a compact token, still encoded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segments<'a> {
    signing_input: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> Segments<'a> {
    pub(crate) fn split(token: &'a str) -> Result<Self, CompactError> {
        let (signing_input, signature) =
            token.rsplit_once('.').ok_or(CompactError::SegmentCount)?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or(CompactError::SegmentCount)?;

        if [header, payload, signature]
            .iter()
            .any(|segment| segment.is_empty() || segment.contains('.'))
        {
            return Err(CompactError::SegmentCount);
        }

        Ok(Self {
            signing_input,
            header,
            payload,
            signature,
        })
    }

    pub(crate) fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    pub(crate) fn header(&self) -> Result<Header, CompactError> {
        let raw = URL_SAFE_NO_PAD
            .decode(self.header)
            .map_err(|_| CompactError::Encoding("header"))?;
        serde_json::from_slice(&raw).map_err(|_| CompactError::Header)
    }

    pub(crate) fn signature(&self) -> Result<Vec<u8>, CompactError> {
        URL_SAFE_NO_PAD
            .decode(self.signature)
            .map_err(|_| CompactError::Encoding("signature"))
    }

    pub(crate) fn claims(&self) -> Result<ClaimSet, CompactError> {
        let raw = URL_SAFE_NO_PAD
            .decode(self.payload)
            .map_err(|_| CompactError::Encoding("payload"))?;
        match serde_json::from_slice(&raw) {
            Ok(Value::Object(claims)) => Ok(claims),
            _ => Err(CompactError::Payload),
        }
    }
}
