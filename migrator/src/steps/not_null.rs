use async_trait::async_trait;
use sqlx::Row;

use crate::error::MigratorError;
use crate::step::{Executor, MigrationStep};

/// Step 3 of the canonical sequence: attach NOT NULL, gated
/// by a pre-check that counts remaining nulls and aborts if any are
/// found — the backfill must have already reached zero.
pub struct AttachNotNull {
    pub table: String,
    pub column: String,
}

impl AttachNotNull {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

#[async_trait]
impl MigrationStep for AttachNotNull {
    fn name(&self) -> &str {
        "attach_not_null"
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let count_sql = format!("SELECT COUNT(*) AS remaining FROM {} WHERE {} IS NULL", self.table, self.column);
        let row = sqlx::query(&count_sql).fetch_one(&mut *conn).await?;
        let remaining: i64 = row.try_get("remaining")?;
        if remaining > 0 {
            return Err(MigratorError::NullsRemain {
                table: self.table.clone(),
                column: self.column.clone(),
                remaining_nulls: remaining,
            });
        }

        let alter_sql = format!("ALTER TABLE {} ALTER COLUMN {} SET NOT NULL", self.table, self.column);
        sqlx::query(&alter_sql).execute(&mut *conn).await?;
        Ok(())
    }

    async fn down(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        let conn = exec.connection()?;
        let sql = format!("ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL", self.table, self.column);
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }
}
