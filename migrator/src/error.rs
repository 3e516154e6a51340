use thiserror::Error;

/// Errors surfaced by the migrator. Any step failing
/// aborts the migration; previous steps are not rolled back.
#[derive(Debug, Error)]
pub enum MigratorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("step {step} has no down operation")]
    NoDownOperation { step: String },

    #[error("{0}")]
    WrongExecutorKind(&'static str),

    #[error(
        "another migration run holds the advisory lock; concurrent migrator runs are prohibited"
    )]
    LockNotAcquired,

    #[error("backfill for {table}.{column} exceeded its {timeout_secs}s wall-clock budget after updating {rows_updated} rows")]
    BackfillTimedOut {
        table: String,
        column: String,
        timeout_secs: u64,
        rows_updated: u64,
    },

    #[error("refusing to attach NOT NULL on {table}.{column}: {remaining_nulls} rows are still NULL")]
    NullsRemain {
        table: String,
        column: String,
        remaining_nulls: i64,
    },

    #[error("step {step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration cancelled during step {step}")]
    Cancelled { step: String },
}
