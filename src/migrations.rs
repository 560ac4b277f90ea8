//! Ordered, reversible schema migrations with an applied-migrations ledger.

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::db::{classify, DatabaseManager};
use crate::error::{MigrationError, StoreError};
use crate::relations::{foreign_key_clause, foreign_keys_of, EntityKind};
use chrono::{SecondsFormat, Utc};
use libsql::Connection;
use tracing::{info, warn};

/// A named pair of forward and backward steps. Both sides are written to be
/// harmless when re-run against a schema already in the target state.
pub struct Migration {
    pub name: &'static str,
    pub up: fn() -> Vec<String>,
    pub down: fn() -> Vec<String>,
}

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_create_accounts_and_posts",
        up: create_accounts_and_posts,
        down: drop_accounts_and_posts,
    },
    Migration {
        name: "0002_create_comments",
        up: create_comments,
        down: drop_comments,
    },
];

fn foreign_key_clauses(child: EntityKind) -> String {
    foreign_keys_of(child)
        .map(foreign_key_clause)
        .collect::<Vec<_>>()
        .join(",\n    ")
}

fn create_accounts_and_posts() -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER CONSTRAINT pk_accounts PRIMARY KEY AUTOINCREMENT,
    name VARCHAR({MAX_NAME_LENGTH}) NOT NULL,
    email VARCHAR({MAX_EMAIL_LENGTH}) NOT NULL,
    CONSTRAINT uq_accounts_email UNIQUE (email),
    CONSTRAINT ck_accounts_name_length CHECK (length(name) <= {MAX_NAME_LENGTH}),
    CONSTRAINT ck_accounts_email_length CHECK (length(email) <= {MAX_EMAIL_LENGTH})
)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS posts (
    id INTEGER CONSTRAINT pk_posts PRIMARY KEY AUTOINCREMENT,
    title VARCHAR({MAX_TITLE_LENGTH}) NOT NULL,
    content TEXT NOT NULL,
    owner_id INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT,
    CONSTRAINT ck_posts_title_length CHECK (length(title) <= {MAX_TITLE_LENGTH}),
    {}
)",
            foreign_key_clauses(EntityKind::Post)
        ),
        "CREATE INDEX IF NOT EXISTS idx_posts_owner_id ON posts (owner_id)".to_string(),
    ]
}

fn drop_accounts_and_posts() -> Vec<String> {
    vec![
        "DROP INDEX IF EXISTS idx_posts_owner_id".to_string(),
        "DROP TABLE IF EXISTS posts".to_string(),
        "DROP TABLE IF EXISTS accounts".to_string(),
    ]
}

fn create_comments() -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS comments (
    id INTEGER CONSTRAINT pk_comments PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    post_id INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    {}
)",
            foreign_key_clauses(EntityKind::Comment)
        ),
        "CREATE INDEX IF NOT EXISTS idx_comments_author_id ON comments (author_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments (post_id)".to_string(),
    ]
}

fn drop_comments() -> Vec<String> {
    vec![
        "DROP INDEX IF EXISTS idx_comments_post_id".to_string(),
        "DROP INDEX IF EXISTS idx_comments_author_id".to_string(),
        "DROP TABLE IF EXISTS comments".to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: &'static str,
    pub applied_at: Option<String>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

pub struct Migrator<'a> {
    db: &'a DatabaseManager,
    migrations: &'a [Migration],
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a DatabaseManager) -> Self {
        Self::with_migrations(db, MIGRATIONS)
    }

    pub fn with_migrations(db: &'a DatabaseManager, migrations: &'a [Migration]) -> Self {
        Self { db, migrations }
    }

    async fn ledger(&self) -> Result<Connection, MigrationError> {
        let conn = self.db.get_connection().await?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            libsql::params![],
        )
        .await
        .map_err(|e| classify(e, "Failed to create migration ledger"))?;
        Ok(conn)
    }

    async fn applied_at(&self, conn: &Connection, name: &str) -> Result<Option<String>, MigrationError> {
        let mut rows = conn
            .query(
                "SELECT applied_at FROM schema_migrations WHERE name = ?1",
                libsql::params![name],
            )
            .await
            .map_err(|e| classify(e, "Failed to read migration ledger"))?;

        match rows
            .next()
            .await
            .map_err(|e| classify(e, "Failed to read migration ledger"))?
        {
            Some(row) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| classify(e, "Failed to read applied_at"))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        let conn = self.ledger().await?;
        let mut statuses = Vec::with_capacity(self.migrations.len());
        for migration in self.migrations {
            statuses.push(MigrationStatus {
                name: migration.name,
                applied_at: self.applied_at(&conn, migration.name).await?,
            });
        }
        Ok(statuses)
    }

    /// Apply every unrecorded migration in order. Re-running is a no-op.
    pub async fn apply_pending(&self) -> Result<Vec<&'static str>, MigrationError> {
        let conn = self.ledger().await?;
        let mut applied = Vec::new();
        for migration in self.migrations {
            if self.applied_at(&conn, migration.name).await?.is_some() {
                continue;
            }
            self.run(&conn, migration, Direction::Up).await?;
            applied.push(migration.name);
        }
        Ok(applied)
    }

    /// Apply a single migration. Refuses to re-apply one already recorded, and
    /// refuses to skip ahead of an earlier unapplied migration.
    pub async fn apply(&self, name: &str) -> Result<(), MigrationError> {
        let position = self
            .migrations
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| MigrationError::UnknownMigration(name.to_string()))?;

        let conn = self.ledger().await?;
        if self.applied_at(&conn, name).await?.is_some() {
            return Err(MigrationError::AlreadyApplied(name.to_string()));
        }
        for earlier in &self.migrations[..position] {
            if self.applied_at(&conn, earlier.name).await?.is_none() {
                return Err(MigrationError::NotApplied(earlier.name.to_string()));
            }
        }
        self.run(&conn, &self.migrations[position], Direction::Up).await
    }

    /// Revert the most recently applied migration, if any.
    pub async fn revert_last(&self) -> Result<Option<&'static str>, MigrationError> {
        let conn = self.ledger().await?;
        for migration in self.migrations.iter().rev() {
            if self.applied_at(&conn, migration.name).await?.is_some() {
                self.run(&conn, migration, Direction::Down).await?;
                return Ok(Some(migration.name));
            }
        }
        warn!("No applied migrations to revert");
        Ok(None)
    }

    async fn run(
        &self,
        conn: &Connection,
        migration: &Migration,
        direction: Direction,
    ) -> Result<(), MigrationError> {
        let tx = conn
            .transaction()
            .await
            .map_err(|e| classify(e, "Failed to begin migration"))?;

        let steps = match direction {
            Direction::Up => (migration.up)(),
            Direction::Down => (migration.down)(),
        };

        let outcome: Result<(), StoreError> = async {
            for step in &steps {
                tx.execute(step, libsql::params![])
                    .await
                    .map_err(|e| classify(e, migration.name))?;
            }
            match direction {
                Direction::Up => {
                    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
                    tx.execute(
                        "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2)",
                        libsql::params![migration.name, now],
                    )
                    .await
                    .map_err(|e| classify(e, "Failed to record migration"))?;
                }
                Direction::Down => {
                    tx.execute(
                        "DELETE FROM schema_migrations WHERE name = ?1",
                        libsql::params![migration.name],
                    )
                    .await
                    .map_err(|e| classify(e, "Failed to remove migration record"))?;
                }
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| classify(e, "Failed to commit migration"))?;
                info!("Migration {} {}", migration.name, direction.verb());
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!("Rollback of {} failed: {}", migration.name, rollback);
                }
                Err(e.into())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Up => "applied",
            Direction::Down => "reverted",
        }
    }
}
