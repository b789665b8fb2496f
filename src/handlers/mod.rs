// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) -> Protected (token auth via `token_auth_middleware`)
pub mod protected;
pub mod public;

/// Path ids are positive; anything unparseable becomes 0, which matches no row
/// and so surfaces as the entity's "not found" error.
pub(crate) fn parse_id(raw: &str) -> i64 {
    raw.parse::<i64>().ok().filter(|id| *id > 0).unwrap_or(0)
}
