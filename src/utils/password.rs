use crate::config::env::{parse_or, process_env};
use crate::error::AppResult;
use anyhow::Context;
use std::sync::OnceLock;

/// bcrypt work factor from `BCRYPT_COST`, clamped to what bcrypt accepts.
/// Lower it for local development; production keeps the library default.
pub fn cost_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> u32 {
    parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST).clamp(4, 31)
}

fn cost() -> u32 {
    static COST: OnceLock<u32> = OnceLock::new();
    *COST.get_or_init(|| cost_from_lookup(process_env))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash_with_cost(password, cost())
}

fn hash_with_cost(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost).context("Failed to hash password")?)
}

/// A stored hash bcrypt cannot parse is a mismatch, not a server error, so a
/// corrupted account row only locks out that account.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    match bcrypt::verify(password, hash) {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("unreadable password hash: {e}");
            Ok(false)
        }
    }
}
