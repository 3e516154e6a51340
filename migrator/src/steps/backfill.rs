use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::info;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

const DEFAULT_BATCH_SIZE: i64 = 1000;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Step 2 of the canonical sequence: populate `column` with
/// `default_literal` for every row where it is still NULL, in bounded
/// batches. Non-transactional by design — each batch commits on its own
/// so the table is never held under one long-running transaction, the
/// whole point of a zero-downtime backfill. Uses the same
/// loop-until-empty shape as other batch-backfill binaries in this
/// codebase.
pub struct BackfillColumn {
    pub table: String,
    pub column: String,
    pub default_literal: String,
    pub batch_size: i64,
    pub batch_delay: Duration,
    pub timeout: Duration,
}

impl BackfillColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>, default_literal: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            default_literal: default_literal.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn batch_size(mut self, n: i64) -> Self {
        self.batch_size = n;
        self
    }

    pub fn batch_delay(mut self, d: Duration) -> Self {
        self.batch_delay = d;
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Runs the batch loop directly against a pool and returns the total
    /// rows updated. Exposed separately from `MigrationStep::up` so the
    /// operator CLI can report progress without going through the
    /// runner.
    pub async fn run(&self, pool: &sqlx::PgPool) -> Result<u64, MigratorError> {
        let started = Instant::now();
        let mut total_updated: u64 = 0;

        let update_sql = format!(
            "UPDATE {t} SET {c} = {default} WHERE {c} IS NULL AND ctid = ANY(SELECT ctid FROM {t} WHERE {c} IS NULL LIMIT {batch})",
            t = self.table,
            c = self.column,
            default = self.default_literal,
            batch = self.batch_size,
        );

        loop {
            if started.elapsed() >= self.timeout {
                return Err(MigratorError::BackfillTimedOut {
                    table: self.table.clone(),
                    column: self.column.clone(),
                    timeout_secs: self.timeout.as_secs(),
                    rows_updated: total_updated,
                });
            }

            let result = sqlx::query(&update_sql).execute(pool).await?;
            let affected = result.rows_affected();
            total_updated += affected;

            if affected == 0 {
                break;
            }

            info!(table = %self.table, column = %self.column, total_updated, "backfill batch committed");
            tokio::time::sleep(self.batch_delay).await;
        }

        Ok(total_updated)
    }
}

#[async_trait]
impl MigrationStep for BackfillColumn {
    fn name(&self) -> &str {
        "backfill_column"
    }

    fn non_transactional(&self) -> bool {
        true
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let pool = exec.pool()?;
        self.run(pool).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        // Reverting a backfill means nulling the column back out; bounded
        // the same way so a rollback can't hold a long lock either.
        let pool = exec.pool()?;
        let update_sql = format!(
            "UPDATE {t} SET {c} = NULL WHERE {c} IS NOT NULL AND ctid = ANY(SELECT ctid FROM {t} WHERE {c} IS NOT NULL LIMIT {batch})",
            t = self.table,
            c = self.column,
            batch = self.batch_size,
        );
        loop {
            let result = sqlx::query(&update_sql).execute(pool).await?;
            if result.rows_affected() == 0 {
                break;
            }
            tokio::time::sleep(self.batch_delay).await;
        }
        Ok(())
    }
}
