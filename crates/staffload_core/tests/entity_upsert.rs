use rusqlite::Connection;
use staffload_core::db::migrations::latest_version;
use staffload_core::db::open_db_in_memory;
use staffload_core::{
    Department, DepartmentRepository, Employee, EmployeeRepository, EntityKind, EntityRepository,
    Job, JobRepository, ListQuery, RepoError,
};

fn seed_parents(conn: &mut Connection) {
    let mut departments = DepartmentRepository::try_new(conn).unwrap();
    departments
        .upsert_batch(&[Department::new(10, "Sales"), Department::new(11, "Legal")])
        .unwrap();
    let mut jobs = JobRepository::try_new(conn).unwrap();
    jobs.upsert_batch(&[Job::new(20, "Analyst"), Job::new(21, "Engineer")])
        .unwrap();
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn upsert_then_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    seed_parents(&mut conn);
    let mut repo = EmployeeRepository::try_new(&mut conn).unwrap();

    let employee = Employee::new(1, "Ada", "2024-01-01T00:00:00", 10, 20);
    let persisted = repo.upsert_batch(std::slice::from_ref(&employee)).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].record, employee);
    assert!(persisted[0].created_at > 0);

    let loaded = repo.get(1).unwrap().unwrap();
    assert_eq!(loaded.record, employee);
    assert_eq!(loaded.created_at, persisted[0].created_at);
}

#[test]
fn second_upsert_overwrites_existing_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = DepartmentRepository::try_new(&mut conn).unwrap();

    repo.upsert_batch(&[Department::new(1, "Sales")]).unwrap();
    repo.upsert_batch(&[Department::new(1, "Marketing")])
        .unwrap();

    let loaded = repo.get(1).unwrap().unwrap();
    assert_eq!(loaded.record.department, "Marketing");
    assert_eq!(repo.list(&ListQuery::default()).unwrap().len(), 1);
}

#[test]
fn upsert_replaces_every_non_key_field() {
    let mut conn = open_db_in_memory().unwrap();
    seed_parents(&mut conn);
    let mut repo = EmployeeRepository::try_new(&mut conn).unwrap();

    repo.upsert_batch(&[Employee::new(1, "Ada", "2024-01-01", 10, 20)])
        .unwrap();
    let replacement = Employee::new(1, "Ada Lovelace", "2024-06-01T09:00:00", 11, 21);
    repo.upsert_batch(std::slice::from_ref(&replacement))
        .unwrap();

    assert_eq!(repo.get(1).unwrap().unwrap().record, replacement);
}

#[test]
fn upserting_same_batch_twice_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = JobRepository::try_new(&mut conn).unwrap();
    let batch = vec![Job::new(1, "Analyst"), Job::new(2, "Engineer")];

    repo.upsert_batch(&batch).unwrap();
    let once: Vec<Job> = repo
        .list(&ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|item| item.record)
        .collect();

    repo.upsert_batch(&batch).unwrap();
    let twice: Vec<Job> = repo
        .list(&ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|item| item.record)
        .collect();

    assert_eq!(once, batch);
    assert_eq!(once, twice);
}

#[test]
fn foreign_key_violation_rolls_back_whole_batch() {
    let mut conn = open_db_in_memory().unwrap();
    seed_parents(&mut conn);
    {
        let mut repo = EmployeeRepository::try_new(&mut conn).unwrap();
        let batch = vec![
            Employee::new(1, "Ada", "2024-01-01T00:00:00", 10, 20),
            Employee::new(2, "Bob", "2024-01-01T00:00:00", 99, 20),
            Employee::new(3, "Cy", "2024-01-01T00:00:00", 11, 21),
        ];

        let error = repo.upsert_batch(&batch).unwrap_err();
        match error {
            RepoError::Persistence {
                entity,
                batch,
                record_id,
                ..
            } => {
                assert_eq!(entity, EntityKind::Employee);
                assert_eq!(batch.size, 3);
                assert_eq!(batch.first_id, 1);
                assert_eq!(batch.last_id, 3);
                assert_eq!(record_id, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(repo.get(1).unwrap().is_none());
    }
    assert_eq!(count(&conn, "employees"), 0);
}

#[test]
fn failed_update_keeps_previous_state() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = DepartmentRepository::try_new(&mut conn).unwrap();
    repo.upsert_batch(&[Department::new(1, "Sales"), Department::new(2, "Legal")])
        .unwrap();

    // Renaming 1 is fine, but 2 then collides with the unique name "Ops".
    let error = repo
        .upsert_batch(&[Department::new(1, "Ops"), Department::new(2, "Ops")])
        .unwrap_err();
    assert!(matches!(
        error,
        RepoError::Persistence {
            record_id: Some(2),
            ..
        }
    ));

    assert_eq!(repo.get(1).unwrap().unwrap().record.department, "Sales");
    assert_eq!(repo.get(2).unwrap().unwrap().record.department, "Legal");
}

#[test]
fn invalid_record_is_rejected_before_any_write() {
    let mut conn = open_db_in_memory().unwrap();
    seed_parents(&mut conn);
    let mut repo = EmployeeRepository::try_new(&mut conn).unwrap();

    let error = repo
        .upsert_batch(&[
            Employee::new(1, "Ada", "2024-01-01", 10, 20),
            Employee::new(2, "Bob", "soon", 10, 20),
        ])
        .unwrap_err();
    assert!(matches!(error, RepoError::Validation(_)));
    assert!(repo.get(1).unwrap().is_none());
}

#[test]
fn empty_batch_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = JobRepository::try_new(&mut conn).unwrap();
    assert!(repo.upsert_batch(&[]).unwrap().is_empty());
}

#[test]
fn create_rejects_existing_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = JobRepository::try_new(&mut conn).unwrap();

    let created = repo.create(&Job::new(1, "Analyst")).unwrap();
    assert_eq!(created.record, Job::new(1, "Analyst"));

    let error = repo.create(&Job::new(1, "Engineer")).unwrap_err();
    assert!(matches!(
        error,
        RepoError::Persistence {
            record_id: Some(1),
            ..
        }
    ));

    let error = repo
        .create_batch(&[Job::new(2, "Engineer"), Job::new(1, "Other")])
        .unwrap_err();
    assert!(matches!(error, RepoError::Persistence { .. }));
    assert!(repo.get(2).unwrap().is_none());
}

#[test]
fn list_is_ordered_by_id_and_paginated() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = DepartmentRepository::try_new(&mut conn).unwrap();
    repo.upsert_batch(&[
        Department::new(3, "C"),
        Department::new(1, "A"),
        Department::new(4, "D"),
        Department::new(2, "B"),
    ])
    .unwrap();

    let page = repo
        .list(&ListQuery {
            offset: 1,
            limit: Some(2),
        })
        .unwrap();
    let ids: Vec<i64> = page.iter().map(|item| item.record.id).collect();
    assert_eq!(ids, vec![2, 3]);

    let rest = repo
        .list(&ListQuery {
            offset: 3,
            limit: None,
        })
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].record.id, 4);
}

#[test]
fn delete_returns_removed_row_and_reports_missing_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = JobRepository::try_new(&mut conn).unwrap();
    repo.upsert_batch(&[Job::new(1, "Analyst")]).unwrap();

    let removed = repo.delete(1).unwrap();
    assert_eq!(removed.record, Job::new(1, "Analyst"));
    assert!(repo.get(1).unwrap().is_none());

    let error = repo.delete(1).unwrap_err();
    assert!(matches!(
        error,
        RepoError::NotFound {
            entity: EntityKind::Job,
            id: 1
        }
    ));
}

#[test]
fn deleting_referenced_department_fails_at_storage_layer() {
    let mut conn = open_db_in_memory().unwrap();
    seed_parents(&mut conn);
    {
        let mut employees = EmployeeRepository::try_new(&mut conn).unwrap();
        employees
            .upsert_batch(&[Employee::new(1, "Ada", "2024-01-01", 10, 20)])
            .unwrap();
    }

    let mut departments = DepartmentRepository::try_new(&mut conn).unwrap();
    let error = departments.delete(10).unwrap_err();
    assert!(matches!(error, RepoError::Db(_)));
    assert!(departments.get(10).unwrap().is_some());
}

#[test]
fn updated_at_reflects_storage_write() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO jobs (id, job, created_at, updated_at) VALUES (1, 'Analyst', 1000, 1000);",
        [],
    )
    .unwrap();
    let mut repo = JobRepository::try_new(&mut conn).unwrap();

    let persisted = repo.upsert_batch(&[Job::new(1, "Lead Analyst")]).unwrap();
    assert_eq!(persisted[0].created_at, 1000);
    assert!(persisted[0].updated_at > 1000);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    match DepartmentRepository::try_new(&mut conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE jobs (
            id INTEGER PRIMARY KEY NOT NULL,
            job TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        JobRepository::try_new(&mut conn),
        Err(RepoError::MissingRequiredColumn {
            table: "jobs",
            column: "created_at"
        })
    ));
    assert!(matches!(
        DepartmentRepository::try_new(&mut conn),
        Err(RepoError::MissingRequiredTable("departments"))
    ));
}
