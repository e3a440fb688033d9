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

//! Claim layouts and signing.
//!
//! A [`ClaimSet`] can be laid out in two ways inside the JWT payload:
//!
//! | layout    | identity | grants                         |
//! |-----------|----------|--------------------------------|
//! | current   | `sub`    | nested under `grants`          |
//! | legacy    | `jti`    | inlined at the top level       |
//!
//! Both carry `iss` (the API key), `iat`, `nbf` and `exp`, and both are signed
//! with an HMAC over `header.payload`. Issuers pick a layout explicitly; the
//! verifier recognises it from the shape of the payload.

mod current;
mod legacy;

pub use current::CurrentCodec;
pub use legacy::LegacyCodec;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::claims::ClaimSet;
use crate::error::AccessTokenError;

/// Which claim layout a token uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    Current,
    Legacy,
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenFormat::Current => f.write_str("current"),
            TokenFormat::Legacy => f.write_str("legacy"),
        }
    }
}

/// Maps a [`ClaimSet`] to a signed compact token and a decoded payload back
/// to a [`ClaimSet`].
pub trait TokenCodec {
    fn format(&self) -> TokenFormat;

    /// Lay out `claims`, sign with `secret` and serialize as `header.payload.signature`.
    fn encode(
        &self,
        claims: &ClaimSet,
        algorithm: Algorithm,
        secret: &str,
    ) -> Result<String, AccessTokenError>;

    /// Whether a decoded payload is in this codec's layout.
    fn detect(&self, payload: &Map<String, Value>) -> bool;

    fn decode(&self, payload: Map<String, Value>) -> Result<ClaimSet, AccessTokenError>;
}

/// Codecs in detection order. The legacy codec accepts anything and goes last.
static CODECS: [&(dyn TokenCodec + Sync); 2] = [&CurrentCodec, &LegacyCodec];

/// The codec whose layout matches `payload`.
pub fn detect_codec(payload: &Map<String, Value>) -> &'static (dyn TokenCodec + Sync) {
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.detect(payload))
        .unwrap_or(&LegacyCodec)
}

pub(crate) fn sign<T: Serialize>(
    wire: &T,
    algorithm: Algorithm,
    secret: &str,
) -> Result<String, AccessTokenError> {
    encode(
        &Header::new(algorithm),
        wire,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to sign access token: {e}");
        AccessTokenError::Signing(e.to_string())
    })
}

/// Identity lives in `sub`; tokens minted before that carry it in `jti`.
pub(crate) fn normalize_identity(sub: Option<String>, jti: Option<String>) -> String {
    sub.filter(|s| !s.is_empty())
        .or(jti)
        .unwrap_or_default()
}

/// Validity window resolved from the numeric claims.
pub(crate) struct Window {
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl Window {
    /// `iat` and `nbf` stand in for each other when only one is present; `exp`
    /// is required.
    pub fn from_claims(
        iat: Option<i64>,
        nbf: Option<i64>,
        exp: Option<i64>,
    ) -> Result<Self, AccessTokenError> {
        let exp = exp.ok_or_else(|| AccessTokenError::parse("missing exp claim"))?;
        let iat = iat
            .or(nbf)
            .ok_or_else(|| AccessTokenError::parse("missing iat and nbf claims"))?;
        let nbf = nbf.unwrap_or(iat);

        Ok(Self {
            issued_at: timestamp(iat, "iat")?,
            not_before: timestamp(nbf, "nbf")?,
            expiry: timestamp(exp, "exp")?,
        })
    }
}

fn timestamp(secs: i64, claim: &str) -> Result<DateTime<Utc>, AccessTokenError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AccessTokenError::parse(format!("{claim} claim out of range: {secs}")))
}

pub(crate) fn payload_error(e: serde_json::Error) -> AccessTokenError {
    AccessTokenError::parse(format!("invalid claims: {e}"))
}
