//! Claim sets and audiences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Application claims: a JSON object keyed by claim name.
pub type ClaimSet = Map<String, Value>;

/// Registered claim names written by the issuer.
pub mod names {
    /// `iss`
    pub const ISSUER: &str = "iss";
    /// `sub`
    pub const SUBJECT: &str = "sub";
    /// `aud`
    pub const AUDIENCE: &str = "aud";
    /// `iat`
    pub const ISSUED_AT: &str = "iat";
    /// `exp`
    pub const EXPIRATION: &str = "exp";
    /// `nbf`
    pub const NOT_BEFORE: &str = "nbf";
    /// `jti`
    pub const JWT_ID: &str = "jti";
}

/// Intended recipient(s) of a token.
///
/// Serializes as a bare string or an array of strings, matching the `aud`
/// claim encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single recipient
    One(String),
    /// Several recipients
    Many(Vec<String>),
}

impl Audience {
    /// Iterate over the recipients.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Audience::One(aud) => std::slice::from_ref(aud),
            Audience::Many(list) => list,
        };
        slice.iter().map(String::as_str)
    }

    /// Whether `candidate` is one of the recipients.
    #[must_use]
    pub fn contains(&self, candidate: &str) -> bool {
        self.iter().any(|aud| aud == candidate)
    }

    /// Whether the two audiences share at least one recipient.
    #[must_use]
    pub fn intersects(&self, other: &Audience) -> bool {
        other.iter().any(|aud| self.contains(aud))
    }

    /// True when there is no recipient, or a recipient is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let mut recipients = self.iter().peekable();
        recipients.peek().is_none() || recipients.any(str::is_empty)
    }

    /// Read an `aud` claim value.
    pub(crate) fn from_claim(value: &Value) -> Option<Self> {
        match value {
            Value::String(aud) => Some(Audience::One(aud.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Audience::Many),
            _ => None,
        }
    }

    pub(crate) fn to_claim(&self) -> Value {
        match self {
            Audience::One(aud) => Value::String(aud.clone()),
            Audience::Many(list) => Value::Array(list.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<&str> for Audience {
    fn from(aud: &str) -> Self {
        Audience::One(aud.to_string())
    }
}

impl From<String> for Audience {
    fn from(aud: String) -> Self {
        Audience::One(aud)
    }
}

impl From<Vec<String>> for Audience {
    fn from(list: Vec<String>) -> Self {
        Audience::Many(list)
    }
}

impl From<Vec<&str>> for Audience {
    fn from(list: Vec<&str>) -> Self {
        Audience::Many(list.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Audience {
    fn from(list: [&str; N]) -> Self {
        Audience::Many(list.into_iter().map(str::to_string).collect())
    }
}

/// Claims of a token that passed every validation check.
///
/// The registered claims the verifier enforced are available typed; the
/// complete payload, application claims included, is kept as sent.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    pub(crate) issuer: String,
    pub(crate) audience: Audience,
    pub(crate) issued_at: i64,
    pub(crate) expires_at: i64,
    pub(crate) not_before: Option<i64>,
    pub(crate) claims: ClaimSet,
}

impl VerifiedClaims {
    /// `iss`
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// `aud`
    #[must_use]
    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    /// `iat`, seconds since the epoch.
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// `exp`, seconds since the epoch.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// `nbf`, if the token carried one.
    #[must_use]
    pub fn not_before(&self) -> Option<i64> {
        self.not_before
    }

    /// `jti`, if the token carried one as a string.
    #[must_use]
    pub fn jwt_id(&self) -> Option<&str> {
        self.claims.get(names::JWT_ID).and_then(Value::as_str)
    }

    /// `sub`, if the token carried one as a string.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get(names::SUBJECT).and_then(Value::as_str)
    }

    /// Look up any claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The full payload.
    #[must_use]
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Consume into the full payload.
    #[must_use]
    pub fn into_claim_set(self) -> ClaimSet {
        self.claims
    }
}
