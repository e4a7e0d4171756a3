use super::env::{non_empty, parse_or, process_env};
use anyhow::Result;

pub const MIN_SECRET_LEN: usize = 32;
/// Readers stay signed in for a day by default.
pub const DEFAULT_ACCESS_EXPIRY_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = non_empty(&lookup, "JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters");
        }

        let access_token_expiry =
            parse_or(&lookup, "JWT_ACCESS_EXPIRATION", DEFAULT_ACCESS_EXPIRY_SECS);
        if access_token_expiry == 0 {
            anyhow::bail!("JWT_ACCESS_EXPIRATION must be greater than zero");
        }

        Ok(Self {
            secret,
            access_token_expiry,
        })
    }
}
