use async_trait::async_trait;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

/// Non-blocking index build. Postgres
/// refuses `CREATE INDEX CONCURRENTLY` inside a transaction block, so
/// this step is always non-transactional; `IF NOT EXISTS` makes re-runs
/// after a failed build idempotent.
pub struct ConcurrentIndexBuild {
    pub index_name: String,
    pub table: String,
    pub columns: Vec<String>,
}

impl ConcurrentIndexBuild {
    pub fn new(index_name: impl Into<String>, table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            table: table.into(),
            columns,
        }
    }
}

#[async_trait]
impl MigrationStep for ConcurrentIndexBuild {
    fn name(&self) -> &str {
        "concurrent_index_build"
    }

    fn non_transactional(&self) -> bool {
        true
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let pool = exec.pool()?;
        let mut conn = pool.acquire().await?;
        let sql = format!(
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS {} ON {} ({})",
            self.index_name,
            self.table,
            self.columns.join(", ")
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let pool = exec.pool()?;
        let mut conn = pool.acquire().await?;
        let sql = format!("DROP INDEX CONCURRENTLY IF EXISTS {}", self.index_name);
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }
}
