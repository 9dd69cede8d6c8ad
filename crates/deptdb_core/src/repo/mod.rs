//! Repository layer for department persistence.
//!
//! # Responsibility
//! - Own the `departments` table lifecycle and its SQL statements.
//! - Hand out one canonical in-memory object per persisted row.
//!
//! # Invariants
//! - Driver failures surface as `RepoError::Db`; missing rows surface as
//!   `Ok(None)`.
//! - Every hydrated row passes through the repository's `IdentityCache`.

pub mod department_repo;
pub mod identity_cache;
