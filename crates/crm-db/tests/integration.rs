use crm_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn pooled_connections_share_a_file_database() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("crm.db");
    let pool = create_pool(
        path.to_str().expect("utf-8 path"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        let applied = run_migrations(&conn).expect("failed to run migrations");
        assert!(applied > 0);
        conn.execute(
            "INSERT INTO users (id, full_name, email) VALUES ('u1', 'Test User', 'u1@example.com')",
            [],
        )
        .expect("failed to insert user");
    }

    let first = pool.get().expect("first connection");
    let second = pool.get().expect("second connection");

    for conn in [&first, &second] {
        let name: String = conn
            .query_row("SELECT full_name FROM users WHERE id = 'u1'", [], |row| {
                row.get(0)
            })
            .expect("user should be visible to every pooled connection");
        assert_eq!(name, "Test User");
    }
}

#[test]
fn pool_enables_wal_and_foreign_keys() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("crm.db");
    let pool = create_pool(
        path.to_str().expect("utf-8 path"),
        DbRuntimeSettings {
            busy_timeout_ms: 1_000,
            pool_max_size: 2,
        },
    )
    .expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .expect("journal_mode");
    assert_eq!(journal_mode, "wal");

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .expect("foreign_keys");
    assert_eq!(foreign_keys, 1);

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
        .expect("busy_timeout");
    assert_eq!(busy_timeout, 1_000);
}
