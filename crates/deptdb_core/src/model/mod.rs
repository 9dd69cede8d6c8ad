//! Domain model for department records.
//!
//! # Responsibility
//! - Define the in-memory shape of one `departments` row.
//! - Define the shared handle type used by the identity cache.
//!
//! # Invariants
//! - A persisted object is identified by its database-assigned `DepartmentId`.
//! - Deletion is a hard delete; the object survives in memory with `id = None`.

pub mod department;
