use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE photos (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                mime_type   TEXT NOT NULL,
                data        BLOB NOT NULL,
                added_at    INTEGER NOT NULL
            );

            CREATE INDEX idx_photos_added_at ON photos(added_at);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                sender      TEXT NOT NULL CHECK (sender IN ('A', 'B')),
                text        TEXT NOT NULL CHECK (length(trim(text)) > 0),
                ts          INTEGER NOT NULL
            );

            CREATE INDEX idx_messages_ts ON messages(ts);

            CREATE TABLE settings (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rerunning_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn empty_message_text_is_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (sender, text, ts) VALUES ('A', '   ', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
