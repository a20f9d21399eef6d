//! Opening the rule database.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StorageError;
use crate::rule_repo::SqliteRuleRepository;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 4;

/// Where the rules live and how long a writer waits for the lock.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` URL, e.g. `sqlite:stagehand.db?mode=rwc` or `sqlite::memory:`.
    pub database_url: String,
    /// How long a statement waits while another connection holds the write
    /// lock before failing with "database is locked".
    pub busy_timeout: Duration,
}

impl Config {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Open the pool and bring the `rules` table up to date.
    ///
    /// File databases are created when missing and switched to write-ahead
    /// logging so the HTTP handlers can read while a save is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the file cannot be
    /// opened or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let mut options = SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .busy_timeout(self.busy_timeout);
        if !self.is_in_memory() {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Database { pool })
    }
}

/// An open rule database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A rule repository sharing this database's connections.
    #[must_use]
    pub fn rule_repository(&self) -> SqliteRuleRepository {
        SqliteRuleRepository::new(self.pool.clone())
    }

    /// Wait for running statements, then close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_app::ports::RuleRepository;
    use stagehand_domain::automation::{AutomationRule, AutomationTrigger};

    fn scratch_file(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("stagehand-{}-{name}.db", std::process::id()));
        remove_database_files(&path);
        path
    }

    fn remove_database_files(path: &std::path::Path) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.as_os_str().to_owned();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[test]
    fn should_recognise_in_memory_urls() {
        assert!(Config::new("sqlite::memory:").is_in_memory());
        assert!(Config::new("sqlite:file:rules?mode=memory&cache=shared").is_in_memory());
        assert!(!Config::new("sqlite:stagehand.db?mode=rwc").is_in_memory());
    }

    #[test]
    fn should_default_busy_timeout_to_five_seconds() {
        let config = Config::new("sqlite::memory:");
        assert_eq!(config.busy_timeout, Duration::from_secs(5));

        let config = config.with_busy_timeout(Duration::from_millis(250));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn should_create_rules_table_when_opening_memory_db() {
        let db = Config::new("sqlite::memory:").build().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, ["rules"]);
    }

    #[tokio::test]
    async fn should_use_write_ahead_log_for_file_database() {
        let path = scratch_file("wal");
        let url = format!("sqlite:{}", path.display());
        let db = Config::new(url).build().await.unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();

        db.close().await;
        remove_database_files(&path);
        assert_eq!(mode, "wal");
    }

    #[tokio::test]
    async fn should_keep_saved_rules_when_file_database_is_reopened() {
        let path = scratch_file("reopen");
        let url = format!("sqlite:{}", path.display());
        let rule = AutomationRule::builder()
            .name("Kept")
            .trigger(AutomationTrigger::new("SceneChanged"))
            .build()
            .unwrap();

        let db = Config::new(url.clone()).build().await.unwrap();
        let repo = db.rule_repository();
        repo.save(vec![rule.clone()]).await.unwrap();
        db.close().await;

        let db = Config::new(url).build().await.unwrap();
        let loaded = db.rule_repository().load().await.unwrap();
        db.close().await;
        remove_database_files(&path);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, rule.id);
    }
}
