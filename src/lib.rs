//! # authlane
//!
//! Pluggable authentication and role authorization for HTTP routes.
//!
//! The [`auth`] module holds the engine: a [`auth::Registry`] of strategies
//! (login, named role checks, remember-me re-login and forget-on-logout), the
//! credential record kept in the session, and [`auth::AuthLane`], which
//! answers per request whether the caller is signed in and allowed.
//!
//! The engine knows nothing about where users live. Strategies are plain
//! closures over a [`auth::RequestContext`], so the user directory, the
//! session store and the cookie store are all supplied by the application.
//!
//! ## Demonstration server
//!
//! The [`authlane`] module wires the engine into an axum router with an
//! in-memory session table and user directory, and [`cli`] exposes its
//! settings on the command line.

pub mod auth;
pub mod authlane;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
