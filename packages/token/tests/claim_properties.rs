//! Property tests: arbitrary payloads survive issuance and verification

use attestor_token::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

const PRIVATE_PEM: &str = include_str!("fixtures/primary_private.pem");
const ISSUER: &str = "urn:example:issuer";
const AUDIENCE: &str = "urn:example:audience";
const NOW: i64 = 1_700_000_000;

/// Claims the issuer always writes over caller entries.
const REGISTERED: [&str; 5] = ["iss", "aud", "iat", "exp", "jti"];

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_timestamp(NOW))
}

fn issuer() -> &'static TokenIssuer {
    static ISSUER_HANDLE: OnceLock<TokenIssuer> = OnceLock::new();
    ISSUER_HANDLE.get_or_init(|| {
        let key = import_signing_key(PRIVATE_PEM, Algorithm::Rs256).unwrap();
        TokenIssuer::new(key)
            .with_clock(clock())
            .with_ids(Arc::new(SequenceIds::new("rt")))
    })
}

fn verifier() -> &'static TokenVerifier {
    static VERIFIER: OnceLock<TokenVerifier> = OnceLock::new();
    VERIFIER.get_or_init(|| {
        let key = import_signing_key(PRIVATE_PEM, Algorithm::Rs256)
            .unwrap()
            .verification_key();
        TokenVerifier::new(key).with_clock(clock())
    })
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 .:/-]{0,16}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Claim names, biased towards the registered ones. `nbf` is left out: the
/// verifier enforces it, so an arbitrary value would be a rejection.
fn claim_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z_]{1,10}",
        1 => prop::sample::select(vec!["iss", "aud", "iat", "exp", "jti", "sub"])
            .prop_map(String::from),
    ]
    .prop_filter("nbf is enforced on verification", |name| name != "nbf")
}

fn payload() -> impl Strategy<Value = ClaimSet> {
    prop::collection::btree_map(claim_name(), json_value(), 0..8)
        .prop_map(|map| map.into_iter().collect::<ClaimSet>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn payload_round_trips_with_registered_claims(payload in payload()) {
        let options = IssueOptions::new(ISSUER, AUDIENCE);
        let token = issuer().issue(&payload, &options).unwrap();
        let claims = verifier()
            .verify(token.as_str(), &VerificationPolicy::new(ISSUER, AUDIENCE))
            .unwrap();

        for (name, value) in &payload {
            if !REGISTERED.contains(&name.as_str()) {
                prop_assert_eq!(claims.get(name), Some(value));
            }
        }

        prop_assert_eq!(claims.issuer(), ISSUER);
        prop_assert_eq!(claims.get("aud"), Some(&json!(AUDIENCE)));
        prop_assert_eq!(claims.issued_at(), NOW);
        prop_assert_eq!(claims.expires_at(), NOW + 15 * 60);
        prop_assert!(claims.jwt_id().is_some_and(|id| id.starts_with("rt-")));

        let mut names: BTreeSet<&str> = payload.keys().map(String::as_str).collect();
        names.extend(REGISTERED);
        prop_assert_eq!(claims.claims().len(), names.len());
    }
}
