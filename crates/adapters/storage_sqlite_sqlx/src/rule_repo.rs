//! `SQLite` implementation of [`RuleRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use stagehand_app::ports::RuleRepository;
use stagehand_domain::automation::AutomationRule;
use stagehand_domain::error::StagehandError;
use stagehand_domain::id::RuleId;
use stagehand_domain::time::Timestamp;

use crate::error::StorageError;

struct Wrapper(AutomationRule);

fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.to_utc())
        .map_err(decode)
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let trigger_json: String = row.try_get("trigger_data")?;
        let conditions_json: String = row.try_get("conditions")?;
        let actions_json: String = row.try_get("actions")?;
        let cooldown: i64 = row.try_get("cooldown")?;
        let created_at: String = row.try_get("created_at")?;
        let last_triggered: Option<String> = row.try_get("last_triggered")?;
        let trigger_count: i64 = row.try_get("trigger_count")?;

        Ok(Self(AutomationRule {
            id: RuleId::from_str(&id).map_err(decode)?,
            name,
            enabled,
            trigger: serde_json::from_str(&trigger_json).map_err(decode)?,
            conditions: serde_json::from_str(&conditions_json).map_err(decode)?,
            actions: serde_json::from_str(&actions_json).map_err(decode)?,
            cooldown: u64::try_from(cooldown).map_err(decode)?,
            created_at: parse_timestamp(&created_at)?,
            last_triggered: last_triggered.as_deref().map(parse_timestamp).transpose()?,
            trigger_count: u64::try_from(trigger_count).map_err(decode)?,
        }))
    }
}

/// A rule flattened into column values.
struct Columns {
    id: String,
    trigger: String,
    conditions: String,
    actions: String,
    cooldown: i64,
    created_at: String,
    last_triggered: Option<String>,
    trigger_count: i64,
}

impl Columns {
    fn encode(rule: &AutomationRule) -> Result<Self, StorageError> {
        Ok(Self {
            id: rule.id.to_string(),
            trigger: serde_json::to_string(&rule.trigger)?,
            conditions: serde_json::to_string(&rule.conditions)?,
            actions: serde_json::to_string(&rule.actions)?,
            cooldown: i64::try_from(rule.cooldown).unwrap_or(i64::MAX),
            created_at: rule.created_at.to_rfc3339(),
            last_triggered: rule.last_triggered.map(|ts| ts.to_rfc3339()),
            trigger_count: i64::try_from(rule.trigger_count).unwrap_or(i64::MAX),
        })
    }
}

/// `SQLite`-backed rule repository.
///
/// The table always mirrors the last saved snapshot; `position` keeps the
/// store order.
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn replace_all(&self, rules: Vec<AutomationRule>) -> Result<(), StorageError> {
        let encoded = rules
            .iter()
            .map(|rule| Columns::encode(rule).map(|columns| (rule, columns)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rules").execute(&mut *tx).await?;
        for (position, (rule, columns)) in (0_i64..).zip(encoded) {
            sqlx::query(
                "INSERT INTO rules (id, position, name, enabled, trigger_data, conditions, actions, cooldown, created_at, last_triggered, trigger_count) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&columns.id)
            .bind(position)
            .bind(&rule.name)
            .bind(rule.enabled)
            .bind(&columns.trigger)
            .bind(&columns.conditions)
            .bind(&columns.actions)
            .bind(columns.cooldown)
            .bind(&columns.created_at)
            .bind(&columns.last_triggered)
            .bind(columns.trigger_count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn load(&self) -> Result<Vec<AutomationRule>, StagehandError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM rules ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn save(&self, rules: Vec<AutomationRule>) -> Result<(), StagehandError> {
        self.replace_all(rules).await?;
        Ok(())
    }
}
