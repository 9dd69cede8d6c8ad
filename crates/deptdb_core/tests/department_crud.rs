use deptdb_core::{
    open_db_in_memory, Department, DepartmentRepository, RepoError, SqliteDepartmentRepository,
};
use rusqlite::Connection;
use std::rc::Rc;

#[test]
fn create_table_twice_keeps_schema_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);

    assert!(!repo.table_exists().unwrap());
    repo.create_table().unwrap();
    let before = table_sql(&conn);
    repo.create_table().unwrap();

    assert!(repo.table_exists().unwrap());
    assert_eq!(table_sql(&conn), before);
}

#[test]
fn drop_table_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);

    repo.drop_table().unwrap();
    repo.create_table().unwrap();
    repo.drop_table().unwrap();
    repo.drop_table().unwrap();

    assert!(!repo.table_exists().unwrap());
}

#[test]
fn create_assigns_id_matching_find_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let created = repo.create("Engineering", "Building A").unwrap();
    let id = created.borrow().id.unwrap();

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.borrow().id, Some(id));
    assert_eq!(found.borrow().name, "Engineering");
    assert_eq!(found.borrow().location, "Building A");
    assert!(Rc::ptr_eq(&found, &created));
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn save_registers_unsaved_department() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let dept = Department::new("Payroll", "Building C").into_shared();
    assert!(dept.borrow().id.is_none());
    repo.save(&dept).unwrap();

    let id = dept.borrow().id.unwrap();
    assert!(repo.cache().contains(id));
    assert!(Rc::ptr_eq(&repo.cache().get(id).unwrap(), &dept));
}

#[test]
fn save_on_persisted_department_updates_instead_of_inserting() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let dept = repo.create("Legal", "Building D").unwrap();
    let id = dept.borrow().id;
    dept.borrow_mut().location = "Building E".to_string();
    repo.save(&dept).unwrap();

    assert_eq!(dept.borrow().id, id);
    assert_eq!(row_count(&conn), 1);
    let stored: String = conn
        .query_row(
            "SELECT location FROM departments WHERE id = ?1",
            [id.unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "Building E");
}

#[test]
fn save_reinserts_department_whose_row_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let dept = repo.create("Engineering", "Building A").unwrap();
    repo.drop_table().unwrap();
    repo.create_table().unwrap();
    repo.save(&dept).unwrap();

    assert_eq!(row_count(&conn), 1);
    let id = dept.borrow().id.unwrap();
    assert_eq!(stored_ids(&conn), vec![id]);
    assert!(Rc::ptr_eq(&repo.find_by_id(id).unwrap().unwrap(), &dept));
}

#[test]
fn save_reinsert_moves_cache_entry_to_new_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let first = repo.create("Engineering", "Building A").unwrap();
    let dept = repo.create("Sales", "Building B").unwrap();
    let stale_id = dept.borrow().id.unwrap();
    conn.execute("DELETE FROM departments WHERE id = ?1", [stale_id])
        .unwrap();
    repo.delete(&first).unwrap();

    repo.save(&dept).unwrap();

    let new_id = dept.borrow().id.unwrap();
    assert_eq!(stored_ids(&conn), vec![new_id]);
    assert!(Rc::ptr_eq(&repo.cache().get(new_id).unwrap(), &dept));
    assert_ne!(new_id, stale_id);
    assert!(!repo.cache().contains(stale_id));
    assert_eq!(repo.cache().len(), 1);
}

#[test]
fn update_persists_new_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let dept = repo.create("Engineering", "Building A").unwrap();
    let id = dept.borrow().id.unwrap();
    {
        let mut current = dept.borrow_mut();
        current.name = "Platform".to_string();
        current.location = "Building Z".to_string();
    }
    repo.update(&dept).unwrap();

    let fresh_repo = SqliteDepartmentRepository::new(&conn);
    let reloaded = fresh_repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(reloaded.borrow().name, "Platform");
    assert_eq!(reloaded.borrow().location, "Building Z");
}

#[test]
fn update_on_unsaved_department_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();
    repo.create("Engineering", "Building A").unwrap();

    let unsaved = Department::new("Ghost", "Nowhere").into_shared();
    repo.update(&unsaved).unwrap();

    assert!(unsaved.borrow().id.is_none());
    assert!(repo.find_by_name("Ghost").unwrap().is_none());
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn delete_removes_row_evicts_cache_and_clears_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let dept = repo.create("Engineering", "Building A").unwrap();
    let id = dept.borrow().id.unwrap();
    repo.delete(&dept).unwrap();

    assert!(dept.borrow().id.is_none());
    assert!(!repo.cache().contains(id));
    assert!(repo.find_by_id(id).unwrap().is_none());
    assert_eq!(row_count(&conn), 0);
}

#[test]
fn delete_on_unsaved_department_is_harmless() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();
    repo.create("Engineering", "Building A").unwrap();

    let unsaved = Department::new("Ghost", "Nowhere").into_shared();
    repo.delete(&unsaved).unwrap();

    assert!(unsaved.borrow().id.is_none());
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn find_or_create_by_does_not_insert_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let first = repo.find_or_create_by("Sales", "Building B").unwrap();
    let second = repo.find_or_create_by("Sales", "Building B").unwrap();

    assert_eq!(first.borrow().id, second.borrow().id);
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(row_count(&conn), 1);

    let other_site = repo.find_or_create_by("Sales", "Building C").unwrap();
    assert_ne!(other_site.borrow().id, first.borrow().id);
    assert_eq!(row_count(&conn), 2);
}

#[test]
fn find_by_name_returns_first_match_or_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();

    let first = repo.create("Ops", "Building A").unwrap();
    repo.create("Ops", "Building B").unwrap();

    let found = repo.find_by_name("Ops").unwrap().unwrap();
    assert!(Rc::ptr_eq(&found, &first));
    assert!(repo.find_by_name("Research").unwrap().is_none());
}

#[test]
fn get_all_returns_one_object_per_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();
    assert!(repo.get_all().unwrap().is_empty());

    let created = [
        repo.create("Engineering", "Building A").unwrap(),
        repo.create("Sales", "Building B").unwrap(),
        repo.create("Legal", "Building C").unwrap(),
    ];

    let all = repo.get_all().unwrap();
    assert_eq!(all.len() as i64, row_count(&conn));
    for dept in &created {
        assert!(all.iter().any(|loaded| Rc::ptr_eq(loaded, dept)));
    }
}

#[test]
fn get_all_follows_database_row_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();
    repo.create("Engineering", "Building A").unwrap();
    repo.create("Sales", "Building B").unwrap();
    repo.create("Legal", "Building C").unwrap();

    let loaded_ids: Vec<_> = repo
        .get_all()
        .unwrap()
        .iter()
        .map(|dept| dept.borrow().id.unwrap())
        .collect();

    assert_eq!(loaded_ids, stored_ids(&conn));
}

#[test]
fn operations_without_table_return_db_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);

    assert!(matches!(repo.find_by_id(1), Err(RepoError::Db(_))));
    assert!(matches!(repo.get_all(), Err(RepoError::Db(_))));
    assert!(matches!(
        repo.create("Engineering", "Building A"),
        Err(RepoError::Db(_))
    ));
}

#[test]
fn null_columns_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::new(&conn);
    repo.create_table().unwrap();
    conn.execute(
        "INSERT INTO departments (name, location) VALUES (NULL, 'Basement')",
        [],
    )
    .unwrap();

    let err = repo.get_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM departments", [], |row| row.get(0))
        .unwrap()
}

fn table_sql(conn: &Connection) -> String {
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'departments'",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

fn stored_ids(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn.prepare("SELECT id FROM departments").unwrap();
    let ids = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<i64>, _>>()
        .unwrap();
    ids
}
