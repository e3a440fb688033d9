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

//! Current claim layout.
//!
//! # Example payload
//!
//! ```json
//! {
//!   "iss": "APIxK3b9...",
//!   "sub": "user@example.com",
//!   "iat": 1707001200,
//!   "nbf": 1707001200,
//!   "exp": 1707004800,
//!   "name": "Alice",
//!   "grants": { "video": { "roomJoin": true, "room": "standup-2024" } }
//! }
//! ```

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{normalize_identity, payload_error, sign, TokenCodec, TokenFormat, Window};
use crate::claims::ClaimSet;
use crate::error::AccessTokenError;
use crate::grants::GrantSet;

/// Claim name holding the grants map.
pub const GRANTS_CLAIM: &str = "grants";

#[derive(Debug, Serialize, Deserialize)]
struct CurrentClaims {
    #[serde(default)]
    iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    // Never written; tolerated so identity can fall back to it.
    #[serde(default, skip_serializing)]
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
    grants: GrantSet,
}

/// Identity in `sub`, grants nested under `grants`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentCodec;

impl TokenCodec for CurrentCodec {
    fn format(&self) -> TokenFormat {
        TokenFormat::Current
    }

    fn encode(
        &self,
        claims: &ClaimSet,
        algorithm: Algorithm,
        secret: &str,
    ) -> Result<String, AccessTokenError> {
        let wire = CurrentClaims {
            iss: claims.issuer.clone(),
            sub: Some(claims.identity.clone()),
            jti: None,
            iat: Some(claims.issued_at.timestamp()),
            nbf: Some(claims.not_before.timestamp()),
            exp: Some(claims.expiry.timestamp()),
            name: claims.name.clone(),
            metadata: claims.metadata.clone(),
            grants: claims.grants.clone(),
        };
        sign(&wire, algorithm, secret)
    }

    fn detect(&self, payload: &Map<String, Value>) -> bool {
        payload.get(GRANTS_CLAIM).is_some_and(Value::is_object)
    }

    fn decode(&self, payload: Map<String, Value>) -> Result<ClaimSet, AccessTokenError> {
        let wire: CurrentClaims =
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
