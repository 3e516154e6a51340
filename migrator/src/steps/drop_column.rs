use async_trait::async_trait;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

/// Metadata-only drop. Application
/// code must stop reading the column before this step runs — that
/// ordering is the caller's responsibility, not something this step can
/// check.
pub struct DropColumn {
    pub table: String,
    pub column: String,
    pub sql_type: String,
}

impl DropColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            sql_type: sql_type.into(),
        }
    }
}

#[async_trait]
impl MigrationStep for DropColumn {
    fn name(&self) -> &str {
        "drop_column"
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!("ALTER TABLE {} DROP COLUMN IF EXISTS {}", self.table, self.column);
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
            self.table, self.column, self.sql_type
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }
}
