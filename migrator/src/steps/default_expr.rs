use async_trait::async_trait;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

/// Step 4 of the canonical sequence: attach a DEFAULT
/// expression so subsequent inserts need not supply the column.
pub struct AttachDefault {
    pub table: String,
    pub column: String,
    pub default_expr: String,
}

impl AttachDefault {
    pub fn new(table: impl Into<String>, column: impl Into<String>, default_expr: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            default_expr: default_expr.into(),
        }
    }
}

#[async_trait]
impl MigrationStep for AttachDefault {
    fn name(&self) -> &str {
        "attach_default"
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
            self.table, self.column, self.default_expr
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", self.table, self.column);
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }
}
