//! Department repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map department CRUD onto fixed, parameterized SQL statements.
//! - Keep in-memory objects deduplicated through an `IdentityCache`.
//!
//! # Invariants
//! - Each operation is a single autocommitted statement (plus reads).
//! - Repeated reads of one row return the same `SharedDepartment`, with
//!   `name`/`location` refreshed from the row.
//! - `save` on an already persisted object updates its row instead of
//!   inserting a duplicate. If that row no longer exists, the object is
//!   inserted again and receives a new id.

use crate::db::DbError;
use crate::model::department::{Department, DepartmentId, DepartmentRow, SharedDepartment};
use crate::repo::identity_cache::IdentityCache;
use log::{debug, warn};
use rusqlite::{params, Connection, Params, Row};
use std::cell::{Ref, RefMut};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const CREATE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS departments (id INTEGER PRIMARY KEY, name TEXT, location TEXT)";
const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS departments;";
const INSERT_SQL: &str = "INSERT INTO departments (name, location) VALUES (?, ?)";
const UPDATE_SQL: &str = "UPDATE departments SET name = ?, location = ? WHERE id = ?";
const DELETE_SQL: &str = "DELETE FROM departments WHERE id = ?";
const SELECT_ALL_SQL: &str = "SELECT * FROM departments";
const SELECT_BY_ID_SQL: &str = "SELECT * FROM departments WHERE id = ?";
const SELECT_BY_NAME_SQL: &str = "SELECT * FROM departments WHERE name = ?";
const SELECT_BY_NAME_AND_LOCATION_SQL: &str =
    "SELECT * FROM departments WHERE name = ? AND location = ?";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for department persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A stored row cannot be represented as a `Department`.
    InvalidData(String),
    /// The shared object is borrowed by the caller while the repository
    /// needs to read or write it.
    ObjectInUse(Option<DepartmentId>),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted department data: {message}"),
            Self::ObjectInUse(Some(id)) => write!(f, "department {id} is currently borrowed"),
            Self::ObjectInUse(None) => write!(f, "department is currently borrowed"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::ObjectInUse(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for department records.
pub trait DepartmentRepository {
    fn create_table(&self) -> RepoResult<()>;
    fn drop_table(&self) -> RepoResult<()>;
    /// Inserts an unsaved department, or updates an already persisted one.
    ///
    /// A persisted department whose row is gone is inserted again under a
    /// new id.
    fn save(&self, department: &SharedDepartment) -> RepoResult<()>;
    fn create(&self, name: &str, location: &str) -> RepoResult<SharedDepartment>;
    fn update(&self, department: &SharedDepartment) -> RepoResult<()>;
    fn delete(&self, department: &SharedDepartment) -> RepoResult<()>;
    fn get_all(&self) -> RepoResult<Vec<SharedDepartment>>;
    fn find_by_id(&self, id: DepartmentId) -> RepoResult<Option<SharedDepartment>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<SharedDepartment>>;
    fn find_or_create_by(&self, name: &str, location: &str) -> RepoResult<SharedDepartment>;
}

/// SQLite-backed department repository.
///
/// The identity cache lives exactly as long as this value. Two repositories
/// over the same connection hand out distinct objects for the same row.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
    cache: IdentityCache,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_cache(conn, IdentityCache::new())
    }

    /// Builds a repository around a caller-provided cache.
    pub fn with_cache(conn: &'conn Connection, cache: IdentityCache) -> Self {
        Self { conn, cache }
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Returns whether the `departments` table currently exists.
    pub fn table_exists(&self) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'departments'
            );",
            [],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Returns the canonical object for `row`, creating and caching it on
    /// first sight and refreshing `name`/`location` otherwise.
    pub fn instance_from_db(&self, row: DepartmentRow) -> RepoResult<SharedDepartment> {
        if let Some(cached) = self.cache.get(row.id) {
            {
                let mut department = writable(&cached)?;
                department.name = row.name;
                department.location = row.location;
            }
            return Ok(cached);
        }

        let id = row.id;
        let department = Department::from_row(row).into_shared();
        self.cache.insert(id, Rc::clone(&department));
        Ok(department)
    }

    /// Writes `name`/`location` to the row matching `department.id` and
    /// returns the number of rows changed.
    fn update_row(&self, department: &Department) -> RepoResult<usize> {
        let changed = self.conn.execute(
            UPDATE_SQL,
            params![
                department.name.as_str(),
                department.location.as_str(),
                department.id
            ],
        )?;
        Ok(changed)
    }

    fn query_first<P: Params>(&self, sql: &str, params: P) -> RepoResult<Option<SharedDepartment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => {
                let row = parse_department_row(row)?;
                Ok(Some(self.instance_from_db(row)?))
            }
            None => Ok(None),
        }
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_table(&self) -> RepoResult<()> {
        self.conn.execute(CREATE_TABLE_SQL, [])?;
        debug!("event=table_create module=repo status=ok table=departments");
        Ok(())
    }

    fn drop_table(&self) -> RepoResult<()> {
        self.conn.execute(DROP_TABLE_SQL, [])?;
        debug!("event=table_drop module=repo status=ok table=departments");
        Ok(())
    }

    fn save(&self, department: &SharedDepartment) -> RepoResult<()> {
        let mut current = writable(department)?;
        if let Some(stale_id) = current.id {
            if self.update_row(&current)? > 0 {
                debug!("event=department_update module=repo status=ok id={stale_id}");
                return Ok(());
            }
            if self
                .cache
                .get(stale_id)
                .is_some_and(|cached| Rc::ptr_eq(&cached, department))
            {
                self.cache.evict(stale_id);
            }
            warn!(
                "event=department_save module=repo status=reinsert stale_id={stale_id} reason=no_matching_row"
            );
        }

        self.conn.execute(
            INSERT_SQL,
            params![current.name.as_str(), current.location.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        current.id = Some(id);
        drop(current);

        self.cache.insert(id, Rc::clone(department));
        debug!("event=department_insert module=repo status=ok id={id}");
        Ok(())
    }

    fn create(&self, name: &str, location: &str) -> RepoResult<SharedDepartment> {
        let department = Department::new(name, location).into_shared();
        self.save(&department)?;
        Ok(department)
    }

    fn update(&self, department: &SharedDepartment) -> RepoResult<()> {
        let current = readable(department)?;
        let changed = self.update_row(&current)?;

        if changed == 0 {
            warn!(
                "event=department_update module=repo status=noop id={:?} reason=no_matching_row",
                current.id
            );
        } else {
            debug!(
                "event=department_update module=repo status=ok id={:?}",
                current.id
            );
        }
        Ok(())
    }

    fn delete(&self, department: &SharedDepartment) -> RepoResult<()> {
        let mut current = writable(department)?;
        let id = current.id;
        let changed = self.conn.execute(DELETE_SQL, params![id])?;

        if let Some(id) = id {
            self.cache.evict(id);
        }
        current.id = None;

        if changed == 0 {
            warn!("event=department_delete module=repo status=noop id={id:?} reason=no_matching_row");
        } else {
            debug!("event=department_delete module=repo status=ok id={id:?}");
        }
        Ok(())
    }

    fn get_all(&self) -> RepoResult<Vec<SharedDepartment>> {
        let mut stmt = self.conn.prepare(SELECT_ALL_SQL)?;
        let mut rows = stmt.query([])?;
        let mut departments = Vec::new();

        while let Some(row) = rows.next()? {
            let row = parse_department_row(row)?;
            departments.push(self.instance_from_db(row)?);
        }

        Ok(departments)
    }

    fn find_by_id(&self, id: DepartmentId) -> RepoResult<Option<SharedDepartment>> {
        self.query_first(SELECT_BY_ID_SQL, params![id])
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<SharedDepartment>> {
        self.query_first(SELECT_BY_NAME_SQL, params![name])
    }

    fn find_or_create_by(&self, name: &str, location: &str) -> RepoResult<SharedDepartment> {
        match self.query_first(SELECT_BY_NAME_AND_LOCATION_SQL, params![name, location])? {
            Some(existing) => Ok(existing),
            None => self.create(name, location),
        }
    }
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<DepartmentRow> {
    let id: DepartmentId = row.get("id")?;
    let name = row
        .get::<_, Option<String>>("name")?
        .ok_or_else(|| RepoError::InvalidData(format!("NULL departments.name for id {id}")))?;
    let location = row
        .get::<_, Option<String>>("location")?
        .ok_or_else(|| RepoError::InvalidData(format!("NULL departments.location for id {id}")))?;

    Ok(DepartmentRow { id, name, location })
}

fn readable(department: &SharedDepartment) -> RepoResult<Ref<'_, Department>> {
    department
        .try_borrow()
        .map_err(|_| RepoError::ObjectInUse(None))
}

fn writable(department: &SharedDepartment) -> RepoResult<RefMut<'_, Department>> {
    department.try_borrow_mut().map_err(|_| {
        let id = department.try_borrow().ok().and_then(|current| current.id);
        RepoError::ObjectInUse(id)
    })
}
