//! Identity map from primary key to canonical shared object.
//!
//! # Invariants
//! - At most one `SharedDepartment` is stored per id.
//! - Entries are only removed by `evict` or `clear`; there is no expiry.
//! - Interior borrows never outlive a method call.

use crate::model::department::{DepartmentId, SharedDepartment};
use std::cell::RefCell;
use std::collections::HashMap;

/// Unbounded identity map owned by one repository instance.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: RefCell<HashMap<DepartmentId, SharedDepartment>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new handle to the cached object for `id`.
    pub fn get(&self, id: DepartmentId) -> Option<SharedDepartment> {
        self.entries.borrow().get(&id).cloned()
    }

    /// Registers `department` as the canonical object for `id`.
    ///
    /// Returns the previously registered object, if any.
    pub fn insert(&self, id: DepartmentId, department: SharedDepartment) -> Option<SharedDepartment> {
        self.entries.borrow_mut().insert(id, department)
    }

    pub fn evict(&self, id: DepartmentId) -> Option<SharedDepartment> {
        self.entries.borrow_mut().remove(&id)
    }

    pub fn contains(&self, id: DepartmentId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
