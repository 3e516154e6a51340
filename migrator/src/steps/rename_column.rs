use async_trait::async_trait;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

/// Metadata-only rename.
pub struct RenameColumn {
    pub table: String,
    pub from: String,
    pub to: String,
}

impl RenameColumn {
    pub fn new(table: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

#[async_trait]
impl MigrationStep for RenameColumn {
    fn name(&self) -> &str {
        "rename_column"
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.table, self.from, self.to
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.table, self.to, self.from
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }
}
