pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS slots (
      name TEXT PRIMARY KEY,
      document TEXT NOT NULL,
      written_at INTEGER NOT NULL
    );
    "#,
];
