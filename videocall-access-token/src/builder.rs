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

//! Room access token issuance.
//!
//! The Meeting Backend builds an [`AccessToken`] per admitted participant and
//! signs it with the API secret; the Media Server validates the signature with
//! the same secret and extracts the claims.

use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;
use std::fmt;
use std::time::Duration;

use crate::claims::{ApiKeyPair, ClaimSet};
use crate::codec::{CurrentCodec, LegacyCodec, TokenCodec};
use crate::config::{is_hmac, AccessTokenConfig, MIN_DEFAULT_VALID_FOR};
use crate::error::AccessTokenError;
use crate::grants::{Grant, GrantSet};

/// Accumulates identity, grants and validity for one token.
///
/// Setters consume and return the builder so calls chain; [`to_token`](Self::to_token)
/// is the terminal step and the only one that validates anything.
///
/// ```
/// use std::time::Duration;
/// use videocall_access_token::{AccessToken, VideoGrant};
///
/// let token = AccessToken::new("APIkey", "secret")
///     .set_identity("user@example.com")
///     .add_grant(VideoGrant::new(true, "standup-2024"))
///     .set_valid_for(Duration::from_secs(600))
///     .to_token()
///     .expect("should sign");
/// assert_eq!(token.split('.').count(), 3);
/// ```
#[derive(Clone)]
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    name: String,
    metadata: String,
    grants: GrantSet,
    valid_for: Option<Duration>,
    default_valid_for: Duration,
    algorithm: Algorithm,
}

impl AccessToken {
    /// Start a token for the given key pair. Never fails; empty keys are
    /// reported by [`to_token`](Self::to_token).
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::with_config(api_key, api_secret, &AccessTokenConfig::default())
    }

    pub fn from_key_pair(keys: &ApiKeyPair) -> Self {
        Self::new(keys.api_key.clone(), keys.api_secret.clone())
    }

    pub fn with_config(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        config: &AccessTokenConfig,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            identity: String::new(),
            name: String::new(),
            metadata: String::new(),
            grants: GrantSet::new(),
            valid_for: None,
            default_valid_for: config.default_valid_for,
            algorithm: config.algorithm,
        }
    }

    pub fn set_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Display name shown to other participants.
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Add a grant. A second grant of the same kind replaces the first.
    pub fn add_grant(mut self, grant: impl Into<Grant>) -> Self {
        self.grants.insert(grant.into());
        self
    }

    /// Token lifetime from the moment it is signed. Truncated to whole
    /// seconds; anything under one second is rejected when encoding.
    pub fn set_valid_for(mut self, valid_for: Duration) -> Self {
        self.valid_for = Some(valid_for);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn grants(&self) -> &GrantSet {
        &self.grants
    }

    /// Claims that a token signed right now would carry.
    pub fn claims(&self) -> Result<ClaimSet, AccessTokenError> {
        self.claims_at(Utc::now())
    }

    /// Sign the claims in the current layout. This is the issuance entry point.
    pub fn to_token(&self) -> Result<String, AccessTokenError> {
        self.encode_with(&CurrentCodec)
    }

    /// Sign the claims in the legacy layout, for exercising compatibility
    /// paths. New tokens should come from [`to_token`](Self::to_token).
    pub fn to_legacy_token(&self) -> Result<String, AccessTokenError> {
        self.encode_with(&LegacyCodec)
    }

    fn encode_with(&self, codec: &dyn TokenCodec) -> Result<String, AccessTokenError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(AccessTokenError::KeysMissing);
        }
        if !is_hmac(self.algorithm) {
            return Err(AccessTokenError::Signing(format!(
                "{:?} is not an HMAC algorithm",
                self.algorithm
            )));
        }

        let claims = self.claims()?;
        let token = codec.encode(&claims, self.algorithm, &self.api_secret)?;

        tracing::debug!(
            api_key = %self.api_key,
            identity = %claims.identity,
            format = %codec.format(),
            expiry = %claims.expiry,
            "issued access token"
        );
        Ok(token)
    }

    fn claims_at(&self, now: DateTime<Utc>) -> Result<ClaimSet, AccessTokenError> {
        let valid_for = match self.valid_for {
            Some(valid_for) => valid_for,
            None if self.default_valid_for <= MIN_DEFAULT_VALID_FOR => {
                return Err(AccessTokenError::InvalidValidity(format!(
                    "default validity {:?} must be longer than {MIN_DEFAULT_VALID_FOR:?}",
                    self.default_valid_for
                )));
            }
            None => self.default_valid_for,
        };
        if valid_for.as_secs() == 0 {
            return Err(AccessTokenError::InvalidValidity(format!(
                "{valid_for:?} is shorter than one second"
            )));
        }
        let ttl = i64::try_from(valid_for.as_secs())
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| AccessTokenError::InvalidValidity(format!("{valid_for:?} is too long")))?;

        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expiry = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AccessTokenError::InvalidValidity(format!("{valid_for:?} is too long"))
        })?;

        Ok(ClaimSet {
            identity: self.identity.clone(),
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            grants: self.grants.clone(),
            issuer: self.api_key.clone(),
            issued_at,
            not_before: issued_at,
            expiry,
        })
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("identity", &self.identity)
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .field("grants", &self.grants)
            .field("valid_for", &self.valid_for)
            .field("default_valid_for", &self.default_valid_for)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
