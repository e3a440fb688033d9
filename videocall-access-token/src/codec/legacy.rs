/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Legacy claim layout, kept so tokens minted by older issuers still verify.
//!
//! Identity travels in `jti` and every grant sits at the top level of the
//! payload under its kind name:
//!
//! ```json
//! {
//!   "iss": "APIxK3b9...",
//!   "jti": "user@example.com",
//!   "nbf": 1707001200,
//!   "exp": 1707004800,
//!   "video": { "roomJoin": true, "room": "standup-2024" }
//! }
//! ```

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{normalize_identity, payload_error, sign, TokenCodec, TokenFormat, Window};
use crate::claims::ClaimSet;
use crate::error::AccessTokenError;
use crate::grants::GrantSet;

#[derive(Debug, Serialize, Deserialize)]
struct LegacyClaims {
    #[serde(default)]
    iss: String,
    #[serde(default, skip_serializing)]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    metadata: String,
    #[serde(flatten)]
    grants: GrantSet,
}

/// Identity in `jti`, grants inlined at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCodec;

impl TokenCodec for LegacyCodec {
    fn format(&self) -> TokenFormat {
        TokenFormat::Legacy
    }

    fn encode(
        &self,
        claims: &ClaimSet,
        algorithm: Algorithm,
        secret: &str,
    ) -> Result<String, AccessTokenError> {
        let wire = LegacyClaims {
            iss: claims.issuer.clone(),
            sub: None,
            jti: Some(claims.identity.clone()),
            iat: Some(claims.issued_at.timestamp()),
            nbf: Some(claims.not_before.timestamp()),
            exp: Some(claims.expiry.timestamp()),
            name: claims.name.clone(),
            metadata: claims.metadata.clone(),
            grants: claims.grants.clone(),
        };
        sign(&wire, algorithm, secret)
    }

    fn detect(&self, _payload: &Map<String, Value>) -> bool {
        true
    }

    fn decode(&self, payload: Map<String, Value>) -> Result<ClaimSet, AccessTokenError> {
        let wire: LegacyClaims =
            serde_json::from_value(Value::Object(payload)).map_err(payload_error)?;
        let window = Window::from_claims(wire.iat, wire.nbf, wire.exp)?;

        Ok(ClaimSet {
            identity: normalize_identity(wire.sub, wire.jti),
            name: wire.name,
            metadata: wire.metadata,
            grants: wire.grants,
            issuer: wire.iss,
            issued_at: window.issued_at,
            not_before: window.not_before,
            expiry: window.expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grants::VideoGrant;
    use serde_json::json;

    #[test]
    fn decodes_inline_grants_and_jti_identity() {
        let payload = json!({
            "iss": "APIkey",
            "jti": "user",
            "nbf": 1_700_000_000,
            "exp": 1_700_000_300,
            "video": { "roomJoin": true, "room": "myroom", "canPublish": true },
        });
        let Value::Object(payload) = payload else {
            unreachable!()
        };

        let claims = LegacyCodec.decode(payload).expect("should decode");
        assert_eq!(claims.identity, "user");
        assert_eq!(claims.issuer, "APIkey");
        assert_eq!(claims.issued_at.timestamp(), 1_700_000_000);
        assert_eq!(
            claims.video(),
            Some(&VideoGrant::new(true, "myroom").with_can_publish(true))
        );
    }

    #[test]
    fn subject_wins_over_jti_when_both_present() {
        let payload = json!({ "sub": "new", "jti": "old", "iat": 0, "exp": 60 });
        let Value::Object(payload) = payload else {
            unreachable!()
        };

        let claims = LegacyCodec.decode(payload).expect("should decode");
        assert_eq!(claims.identity, "new");
        assert!(claims.grants.is_empty());
    }
}
