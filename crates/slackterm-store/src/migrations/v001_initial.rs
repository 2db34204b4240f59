//! v001 -- Initial schema creation.
//!
//! Creates the `users` identity table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY NOT NULL,   -- remote user id, e.g. U024BE7LH
    username   TEXT NOT NULL,
    updated_at INTEGER NOT NULL             -- unix epoch seconds
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
