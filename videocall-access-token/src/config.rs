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

//! Issuance defaults, optionally loaded from environment variables.

use jsonwebtoken::Algorithm;
use std::env;
use std::time::Duration;

/// Validity applied when the builder is never given one: 6 hours.
pub const DEFAULT_VALID_FOR: Duration = Duration::from_secs(6 * 60 * 60);

/// Shortest default validity a configuration may set.
pub const MIN_DEFAULT_VALID_FOR: Duration = Duration::from_secs(60);

/// Defaults used when issuing and checking tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenConfig {
    /// Validity used when `set_valid_for` is not called. Always more than a minute.
    pub default_valid_for: Duration,
    /// HMAC algorithm used to sign new tokens.
    pub algorithm: Algorithm,
    /// Clock skew tolerated by [`ClaimSet::check_validity`](crate::ClaimSet::check_validity).
    pub leeway: Duration,
}

impl Default for AccessTokenConfig {
    fn default() -> Self {
        Self {
            default_valid_for: DEFAULT_VALID_FOR,
            algorithm: Algorithm::HS256,
            leeway: Duration::ZERO,
        }
    }
}

impl AccessTokenConfig {
    /// Load configuration from environment variables.
    ///
    /// # Optional
    /// - `ACCESS_TOKEN_TTL_SECS` (default: `"21600"`, must be greater than 60)
    /// - `ACCESS_TOKEN_ALGORITHM` (`HS256`, `HS384` or `HS512`; default: `"HS256"`)
    /// - `ACCESS_TOKEN_LEEWAY_SECS` (default: `"0"`)
    pub fn from_env() -> Result<Self, String> {
        let ttl_secs = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_VALID_FOR.as_secs().to_string())
            .parse::<u64>()
            .map_err(|_| "ACCESS_TOKEN_TTL_SECS must be a valid non-negative integer")?;
        let default_valid_for = Duration::from_secs(ttl_secs);
        if default_valid_for <= MIN_DEFAULT_VALID_FOR {
            return Err(format!(
                "ACCESS_TOKEN_TTL_SECS must be greater than {}",
                MIN_DEFAULT_VALID_FOR.as_secs()
            ));
        }

        let algorithm = match env::var("ACCESS_TOKEN_ALGORITHM") {
            Ok(name) => parse_hmac_algorithm(&name)
                .ok_or_else(|| format!("ACCESS_TOKEN_ALGORITHM '{name}' is not an HMAC algorithm"))?,
            Err(_) => Algorithm::HS256,
        };

        let leeway_secs = env::var("ACCESS_TOKEN_LEEWAY_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse::<u64>()
            .map_err(|_| "ACCESS_TOKEN_LEEWAY_SECS must be a valid non-negative integer")?;

        Ok(Self {
            default_valid_for,
            algorithm,
            leeway: Duration::from_secs(leeway_secs),
        })
    }
}

/// HMAC algorithms accepted for signing and verification.
pub(crate) fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn parse_hmac_algorithm(name: &str) -> Option<Algorithm> {
    name.trim()
        .to_ascii_uppercase()
        .parse::<Algorithm>()
        .ok()
        .filter(|alg| is_hmac(*alg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("ACCESS_TOKEN_TTL_SECS");
        env::remove_var("ACCESS_TOKEN_ALGORITHM");
        env::remove_var("ACCESS_TOKEN_LEEWAY_SECS");
    }

    #[test]
    fn default_validity_is_more_than_a_minute() {
        assert!(AccessTokenConfig::default().default_valid_for > Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn from_env_uses_defaults_when_unset() {
        clear_env();
        let config = AccessTokenConfig::from_env().expect("defaults should load");
        assert_eq!(config, AccessTokenConfig::default());
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        clear_env();
        env::set_var("ACCESS_TOKEN_TTL_SECS", "600");
        env::set_var("ACCESS_TOKEN_ALGORITHM", "hs512");
        env::set_var("ACCESS_TOKEN_LEEWAY_SECS", "30");

        let config = AccessTokenConfig::from_env().expect("overrides should load");
        clear_env();

        assert_eq!(config.default_valid_for, Duration::from_secs(600));
        assert_eq!(config.algorithm, Algorithm::HS512);
        assert_eq!(config.leeway, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn from_env_rejects_ttl_of_one_minute() {
        clear_env();
        env::set_var("ACCESS_TOKEN_TTL_SECS", "60");
        let result = AccessTokenConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn from_env_rejects_non_hmac_algorithm() {
        clear_env();
        env::set_var("ACCESS_TOKEN_ALGORITHM", "RS256");
        let result = AccessTokenConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn from_env_rejects_garbage_ttl() {
        clear_env();
        env::set_var("ACCESS_TOKEN_TTL_SECS", "ten minutes");
        let result = AccessTokenConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }
}
