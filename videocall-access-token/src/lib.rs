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

//! Room access tokens for videocall.rs.
//!
//! An access token is an HMAC-signed JWT that tells the Media Server who the
//! bearer is, what they may do in which room, and for how long. The Meeting
//! Backend mints tokens with [`AccessToken`]; the Media Server checks them with
//! [`parse_api_token`] and [`ParsedToken::verify`].
//!
//! Two claim layouts exist. New tokens use the current layout (identity in
//! `sub`, grants under `grants`); tokens in the older layout (identity in
//! `jti`, grants inlined) still verify and decode to the same [`ClaimSet`].
//!
//! Everything here is synchronous and free of shared state; the API key and
//! secret are always passed in explicitly.

pub mod builder;
pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod grants;
pub mod verifier;

pub use builder::AccessToken;
pub use claims::{ApiKeyPair, ClaimSet};
pub use codec::{CurrentCodec, LegacyCodec, TokenCodec, TokenFormat};
pub use config::{AccessTokenConfig, DEFAULT_VALID_FOR};
pub use error::AccessTokenError;
pub use grants::{Grant, GrantKind, GrantSet, VideoGrant};
pub use verifier::{parse_api_token, ParsedToken};
