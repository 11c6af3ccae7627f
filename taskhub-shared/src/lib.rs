//! # TaskHub Shared Library
//!
//! This crate contains the types and business logic shared by the TaskHub
//! API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their owner-scoped CRUD operations
//! - `auth`: Password hashing, session tokens, and the auth gate
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
