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

//! Error type for token issuance and verification.

use thiserror::Error;

/// Errors returned while issuing, parsing or verifying an access token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    /// The API key or the API secret is empty. Detected when encoding, never
    /// when the builder is created.
    #[error("missing API key or secret key")]
    KeysMissing,

    /// The requested validity is shorter than one second.
    #[error("invalid validity duration: {0}")]
    InvalidValidity(String),

    /// The signing backend refused to produce a token.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// The token is not a well-formed compact JWS or its claims cannot be read.
    #[error("malformed token: {0}")]
    Parse(String),

    /// The signature does not match the one computed with the supplied secret.
    #[error("token signature does not match")]
    SignatureMismatch,

    /// `exp` is in the past. Only produced by an explicit validity check.
    #[error("token has expired")]
    Expired,

    /// `nbf` is in the future. Only produced by an explicit validity check.
    #[error("token is not valid yet")]
    NotYetValid,
}

impl AccessTokenError {
    pub(crate) fn parse(detail: impl std::fmt::Display) -> Self {
        AccessTokenError::Parse(detail.to_string())
    }
}
