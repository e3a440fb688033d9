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

//! The decoded contents of a room access token.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::error::AccessTokenError;
use crate::grants::{GrantSet, VideoGrant};

/// Everything a token says about its bearer.
///
/// Produced by [`AccessToken::claims`](crate::AccessToken::claims) when issuing
/// and by [`ParsedToken::verify`](crate::ParsedToken::verify) when verifying.
/// The layout the token was encoded with does not show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Participant identity. May be empty.
    pub identity: String,
    /// Display name for the participant. Empty when not set.
    pub name: String,
    /// Opaque application metadata. Empty when not set.
    pub metadata: String,
    pub grants: GrantSet,
    /// API key that signed the token; lets a verifier find the secret.
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl ClaimSet {
    pub fn video(&self) -> Option<&VideoGrant> {
        self.grants.video()
    }

    /// `expiry - issued_at`.
    pub fn valid_for(&self) -> chrono::Duration {
        self.expiry - self.issued_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// Check the validity window against `now`, tolerating `leeway` of clock skew.
    ///
    /// Verification never does this on its own; callers that enforce expiry
    /// call it with the claims returned by `verify`. A leeway reaching past
    /// the representable time range leaves that side of the window open.
    pub fn check_validity(
        &self,
        now: DateTime<Utc>,
        leeway: Duration,
    ) -> Result<(), AccessTokenError> {
        let leeway = chrono::Duration::from_std(leeway).ok();

        let earliest = leeway.and_then(|leeway| now.checked_sub_signed(leeway));
        if earliest.is_some_and(|earliest| earliest >= self.expiry) {
            return Err(AccessTokenError::Expired);
        }
        let latest = leeway.and_then(|leeway| now.checked_add_signed(leeway));
        if latest.is_some_and(|latest| latest < self.not_before) {
            return Err(AccessTokenError::NotYetValid);
        }
        Ok(())
    }
}

/// An API key and the secret used to sign tokens issued under it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyPair {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiKeyPair {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for ApiKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyPair")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}
