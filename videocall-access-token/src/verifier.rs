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

//! Room access token verification.
//!
//! Verification is split in two so the Media Server can look up the secret
//! for the issuing API key before checking anything cryptographic:
//!
//! 1. [`parse_api_token`] checks the compact structure, reads the header and
//!    decodes the claims without trusting them.
//! 2. [`ParsedToken::verify`] recomputes the HMAC with the secret and, on a
//!    match, hands back the claims normalized to a [`ClaimSet`].
//!
//! Tokens in either claim layout verify the same way. Expiry is not checked
//! here; see [`ClaimSet::check_validity`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::claims::ClaimSet;
use crate::codec::{detect_codec, TokenFormat};
use crate::config::is_hmac;
use crate::error::AccessTokenError;

/// A structurally valid token whose signature has not been checked yet.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    raw: String,
    header: Header,
    format: TokenFormat,
    claims: ClaimSet,
}

/// Parse a compact token without checking its signature.
///
/// Fails with [`AccessTokenError::Parse`] unless the token has exactly three
/// non-empty base64url segments, an HMAC header and a readable claims object.
pub fn parse_api_token(raw: &str) -> Result<ParsedToken, AccessTokenError> {
    parse(raw).inspect_err(|e| tracing::debug!("Rejected access token: {e}"))
}

fn parse(raw: &str) -> Result<ParsedToken, AccessTokenError> {
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return Err(AccessTokenError::parse(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let mut decoded = Vec::with_capacity(3);
    for (segment, part) in segments.iter().zip(["header", "payload", "signature"]) {
        if segment.is_empty() {
            return Err(AccessTokenError::parse(format!("empty {part} segment")));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| AccessTokenError::parse(format!("{part} is not base64url: {e}")))?;
        decoded.push(bytes);
    }

    let header = decode_header(raw).map_err(|e| AccessTokenError::parse(format!("header: {e}")))?;
    if !is_hmac(header.alg) {
        return Err(AccessTokenError::parse(format!(
            "unsupported signing algorithm {:?}",
            header.alg
        )));
    }

    let payload: Map<String, Value> = serde_json::from_slice(&decoded[1])
        .map_err(|e| AccessTokenError::parse(format!("payload: {e}")))?;
    let codec = detect_codec(&payload);
    let claims = codec.decode(payload)?;

    Ok(ParsedToken {
        raw: raw.to_string(),
        header,
        format: codec.format(),
        claims,
    })
}

impl ParsedToken {
    /// The issuing API key (`iss`), used to find the verification secret.
    pub fn api_key(&self) -> &str {
        &self.claims.issuer
    }

    pub fn identity(&self) -> &str {
        &self.claims.identity
    }

    pub fn format(&self) -> TokenFormat {
        self.format
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Claims as decoded, before any signature check. Do not grant access
    /// based on these.
    pub fn unverified_claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Check the signature against `secret` and return the claims.
    ///
    /// Fails with [`AccessTokenError::SignatureMismatch`] if the token was not
    /// signed with `secret`. Expiry and not-before are left to the caller.
    pub fn verify(&self, secret: &str) -> Result<ClaimSet, AccessTokenError> {
        let mut validation = Validation::new(self.header.alg);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<Value>(
            &self.raw,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| verification_error(e, &self.claims.issuer))?;

        Ok(self.claims.clone())
    }
}

fn verification_error(e: jsonwebtoken::errors::Error, api_key: &str) -> AccessTokenError {
    match e.kind() {
        ErrorKind::InvalidSignature => {
            tracing::debug!(api_key = %api_key, "Access token signature mismatch");
            AccessTokenError::SignatureMismatch
        }
        _ => {
            tracing::debug!(api_key = %api_key, "Access token verification failed: {e}");
            AccessTokenError::parse(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AccessToken;
    use crate::grants::VideoGrant;
    use jsonwebtoken::{encode, EncodingKey};
    use serde_json::json;
    use std::time::Duration;

    const TEST_KEY: &str = "APItestkey";
    const TEST_SECRET: &str = "test-secret-for-unit-tests";

    fn make_token(identity: &str, room: &str) -> String {
        AccessToken::new(TEST_KEY, TEST_SECRET)
            .set_identity(identity)
            .add_grant(VideoGrant::new(true, room))
            .set_valid_for(Duration::from_secs(600))
            .to_token()
            .unwrap()
    }

    fn sign_raw(claims: &Value, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn verify_valid_token_extracts_claims() {
        let token = make_token("alice@test.com", "room-1");
        let parsed = parse_api_token(&token).expect("should parse");
        assert_eq!(parsed.api_key(), TEST_KEY);
        assert_eq!(parsed.identity(), "alice@test.com");
        assert_eq!(parsed.format(), TokenFormat::Current);
        assert_eq!(parsed.algorithm(), Algorithm::HS256);

        let claims = parsed.verify(TEST_SECRET).expect("should verify");
        assert_eq!(claims.identity, "alice@test.com");
        assert_eq!(claims.video(), Some(&VideoGrant::new(true, "room-1")));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let token = make_token("alice@test.com", "room-1");
        let parsed = parse_api_token(&token).expect("should parse");
        assert_eq!(
            parsed.verify("wrong-secret"),
            Err(AccessTokenError::SignatureMismatch)
        );
        // A failed attempt leaves the parsed token usable.
        assert!(parsed.verify(TEST_SECRET).is_ok());
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let token = make_token("alice@test.com", "room-1");
        let forged = make_token("mallory@test.com", "room-1");
        let segments: Vec<&str> = token.split('.').collect();
        let forged_segments: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", segments[0], forged_segments[1], segments[2]);

        let parsed = parse_api_token(&spliced).expect("structure is still valid");
        assert_eq!(parsed.identity(), "mallory@test.com");
        assert_eq!(
            parsed.verify(TEST_SECRET),
            Err(AccessTokenError::SignatureMismatch)
        );
    }

    #[test]
    fn expired_token_still_verifies() {
        let claims = json!({
            "iss": TEST_KEY,
            "sub": "alice@test.com",
            "iat": 1_000_000,
            "nbf": 1_000_000,
            "exp": 1_000_300,
            "grants": {},
        });
        let token = sign_raw(&claims, Algorithm::HS256);

        let verified = parse_api_token(&token)
            .and_then(|parsed| parsed.verify(TEST_SECRET))
            .expect("expiry is not enforced by verify");
        assert!(verified.is_expired(chrono::Utc::now()));
        assert_eq!(
            verified.check_validity(chrono::Utc::now(), Duration::ZERO),
            Err(AccessTokenError::Expired)
        );
    }

    #[test]
    fn hs384_tokens_verify() {
        let claims = json!({ "iss": TEST_KEY, "sub": "bob", "iat": 0, "exp": 60, "grants": {} });
        let token = sign_raw(&claims, Algorithm::HS384);
        let parsed = parse_api_token(&token).expect("should parse");
        assert_eq!(parsed.algorithm(), Algorithm::HS384);
        assert_eq!(parsed.verify(TEST_SECRET).unwrap().identity, "bob");
    }

    #[test]
    fn verification_errors_map_to_kinds() {
        assert_eq!(
            verification_error(ErrorKind::InvalidSignature.into(), TEST_KEY),
            AccessTokenError::SignatureMismatch
        );
        assert!(matches!(
            verification_error(ErrorKind::InvalidToken.into(), TEST_KEY),
            AccessTokenError::Parse(_)
        ));
        assert!(matches!(
            verification_error(ErrorKind::InvalidAlgorithm.into(), TEST_KEY),
            AccessTokenError::Parse(_)
        ));
    }

    #[test]
    fn garbage_tokens_fail_to_parse() {
        for raw in ["", "not-a-jwt", "not.a.jwt", "a.b", "a..c", "a.b.c.d", "!!.??.**"] {
            assert!(
                matches!(parse_api_token(raw), Err(AccessTokenError::Parse(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn four_segment_token_fails_to_parse() {
        let token = make_token("alice@test.com", "room-1");
        let result = parse_api_token(&format!("{token}.extra"));
        assert!(matches!(result, Err(AccessTokenError::Parse(_))));
    }

    #[test]
    fn non_hmac_header_fails_to_parse() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"x","iat":0,"exp":60,"grants":{}}"#);
        let raw = format!("{header}.{payload}.c2ln");
        assert!(matches!(
            parse_api_token(&raw),
            Err(AccessTokenError::Parse(_))
        ));
    }

    #[test]
    fn payload_without_expiry_fails_to_parse() {
        let token = sign_raw(&json!({ "sub": "x", "iat": 0, "grants": {} }), Algorithm::HS256);
        assert!(matches!(
            parse_api_token(&token),
            Err(AccessTokenError::Parse(_))
        ));
    }
}
