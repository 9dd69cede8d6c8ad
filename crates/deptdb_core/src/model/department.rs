//! Department domain model.
//!
//! # Responsibility
//! - Define the active record mirrored from the `departments` table.
//! - Provide the raw row shape used when hydrating records from queries.
//!
//! # Invariants
//! - `id` is `None` until the row is inserted, and is only ever reset to
//!   `None` (on delete) after that.
//! - At most one `SharedDepartment` per id is handed out by a repository.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Integer primary key assigned by SQLite on insert.
pub type DepartmentId = i64;

/// Canonical, shared in-memory representative of one persisted row.
///
/// Two handles for the same row compare equal under `Rc::ptr_eq`.
pub type SharedDepartment = Rc<RefCell<Department>>;

/// One department record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Database-assigned primary key, unset for unsaved objects.
    pub id: Option<DepartmentId>,
    pub name: String,
    pub location: String,
}

impl Department {
    /// Creates an unsaved department.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            location: location.into(),
        }
    }

    /// Builds a department that mirrors an existing row.
    pub fn from_row(row: DepartmentRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.name,
            location: row.location,
        }
    }

    /// Returns whether this object is backed by a database row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Wraps this department into a shared handle.
    pub fn into_shared(self) -> SharedDepartment {
        Rc::new(RefCell::new(self))
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Department {id}: {}, {}>", self.name, self.location),
            None => write!(f, "<Department None: {}, {}>", self.name, self.location),
        }
    }
}

/// Raw `departments` row in column order `(id, name, location)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentRow {
    pub id: DepartmentId,
    pub name: String,
    pub location: String,
}

impl From<(DepartmentId, String, String)> for DepartmentRow {
    fn from((id, name, location): (DepartmentId, String, String)) -> Self {
        Self { id, name, location }
    }
}
