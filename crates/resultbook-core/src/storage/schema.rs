pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#;

/// Bumped whenever [`DDL`] changes shape.
pub const SCHEMA_VERSION: i64 = 1;
