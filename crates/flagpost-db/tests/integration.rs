use flagpost_db::{create_pool, initialize_schema, DbRuntimeSettings, DEFAULT_FLAGS};

#[test]
fn db_initialization_works() {
    let settings = DbRuntimeSettings {
        pool_max_size: 1,
        ..DbRuntimeSettings::default()
    };
    let pool = create_pool(":memory:", settings).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    let seeded = initialize_schema(&conn).expect("failed to initialize schema");
    assert_eq!(seeded, DEFAULT_FLAGS.len());

    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
        .expect("failed to prepare table list query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table list query")
        .map(|r| r.expect("failed to read table name"))
        .collect();

    assert_eq!(tables, vec!["feature_flags".to_string()]);
}

#[test]
fn restart_against_existing_file_does_not_reseed() {
    let temp_file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    let db_path = temp_file.path();

    {
        let pool = create_pool(db_path, DbRuntimeSettings::default()).expect("first open");
        let conn = pool.get().expect("failed to get connection");
        assert_eq!(initialize_schema(&conn).expect("first init"), 10);
        conn.execute("UPDATE feature_flags SET enabled = 0 WHERE id = 1", [])
            .expect("failed to flip flag");
    }

    let pool = create_pool(db_path, DbRuntimeSettings::default()).expect("second open");
    let conn = pool.get().expect("failed to get connection");
    assert_eq!(initialize_schema(&conn).expect("second init"), 0);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM feature_flags", [], |row| row.get(0))
        .expect("failed to count flags");
    assert_eq!(count, 10, "restart must not duplicate rows");

    let enabled: bool = conn
        .query_row("SELECT enabled FROM feature_flags WHERE id = 1", [], |row| {
            row.get(0)
        })
        .expect("failed to read flag");
    assert!(!enabled, "state written before restart must survive");
}
