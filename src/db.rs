use crate::constants::BUSY_TIMEOUT_MS;
use crate::error::{MigrationError, StoreError, StoreResult};
use crate::migrations::Migrator;
use libsql::{Builder, Connection, Database};
use tracing::info;

/// Owns the libSQL database handle. Every store call opens its own connection,
/// so independent requests never share connection state.
pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Open (creating if necessary) a local SQLite database file.
    pub async fn open(path: &str) -> StoreResult<Self> {
        info!("Opening database at {}", path);

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::database(format!("Failed to open database: {e}")))?;

        let manager = Self { db };

        // Verify the handle is usable before anyone relies on it
        let conn = manager.get_connection().await?;
        pragma(&conn, "PRAGMA journal_mode = WAL")
            .await
            .map_err(|e| StoreError::database(format!("Failed to enable WAL: {e}")))?;

        Ok(manager)
    }

    /// Get a connection with foreign key enforcement switched on.
    pub async fn get_connection(&self) -> StoreResult<Connection> {
        let conn = self.db.connect().map_err(|e| {
            StoreError::database(format!("Failed to get database connection: {e}"))
        })?;

        conn.execute("PRAGMA foreign_keys = ON", libsql::params![])
            .await
            .map_err(|e| StoreError::database(format!("Failed to configure connection: {e}")))?;
        pragma(&conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))
            .await
            .map_err(|e| StoreError::database(format!("Failed to configure connection: {e}")))?;

        Ok(conn)
    }

    /// Apply every migration that has not been recorded yet.
    pub async fn run_migrations(&self) -> Result<Vec<&'static str>, MigrationError> {
        info!("Running database migrations...");
        let applied = Migrator::new(self).apply_pending().await?;
        info!(
            "Database migrations completed successfully ({} applied)",
            applied.len()
        );
        Ok(applied)
    }
}

// Pragmas that report their new value answer with a row, which `execute`
// refuses, so they go through `query` and the row is drained.
async fn pragma(conn: &Connection, sql: &str) -> Result<(), libsql::Error> {
    let mut rows = conn.query(sql, libsql::params![]).await?;
    while rows.next().await?.is_some() {}
    Ok(())
}

/// Translate a libSQL failure into the store taxonomy. Constraint failures are
/// recognised by SQLite's message text, which names the kind of constraint.
pub fn classify(err: libsql::Error, context: &str) -> StoreError {
    let message = err.to_string();
    if let Some(pos) = message.find("UNIQUE constraint failed") {
        // The message may be wrapped, e.g. "SQLite failure: `UNIQUE constraint failed: accounts.email`"
        let columns = message[pos + "UNIQUE constraint failed".len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .split(|c: char| c == '`' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        StoreError::UniqueViolation {
            constraint: unique_constraint_name(columns),
        }
    } else if message.contains("FOREIGN KEY constraint failed") {
        StoreError::ForeignKeyViolation {
            detail: format!("{context}: {message}"),
        }
    } else {
        StoreError::database(format!("{context}: {message}"))
    }
}

// SQLite reports the offending columns ("accounts.email"), not the constraint
// name, so map the known unique columns back to their named constraints.
fn unique_constraint_name(columns: &str) -> String {
    match columns {
        "accounts.email" => "uq_accounts_email".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_columns_map_to_constraint_names() {
        assert_eq!(unique_constraint_name("accounts.email"), "uq_accounts_email");
        assert_eq!(unique_constraint_name("schema_migrations.name"), "schema_migrations.name");
    }

    async fn pragma_value(conn: &Connection, name: &str) -> i64 {
        let mut rows = conn
            .query(&format!("PRAGMA {name}"), libsql::params![])
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get::<i64>(0).unwrap()
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys_and_wait_on_locks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragmas.db");
        let manager = DatabaseManager::open(path.to_str().unwrap()).await.unwrap();

        let conn = manager.get_connection().await.unwrap();
        assert_eq!(pragma_value(&conn, "foreign_keys").await, 1);
        assert_eq!(pragma_value(&conn, "busy_timeout").await, BUSY_TIMEOUT_MS as i64);

        let mut rows = conn.query("PRAGMA journal_mode", libsql::params![]).await.unwrap();
        let mode = rows.next().await.unwrap().unwrap().get::<String>(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
