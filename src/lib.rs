//! # docrest
//!
//! REST API over a document store. Clients create and read composers, persons,
//! teams (with their players) and customers (with their invoices), and register
//! or log in with a bcrypt-hashed password.
//!
//! Documents live in `PostgreSQL` as `JSONB` rows, one table per collection. A
//! `memory://` DSN swaps in an in-process store for local runs and tests.
//!
//! Unknown document ids answer `401` with `Invalid <resource>Id`; store failures
//! answer `501` with `Database Exception`.

pub mod api;
pub mod cli;
pub mod credentials;
pub mod store;

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
            // non-git build environments
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
