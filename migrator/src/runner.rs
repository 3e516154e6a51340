use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::MigratorError;
use crate::lock::AdvisoryLock;
use crate::step::{Executor, Migration, StepTiming};

/// Outcome of a completed `MigrationRunner::run`. Records per-step
/// timing and the cumulative wall-clock of the migration.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub version: i64,
    pub description: String,
    pub steps: Vec<StepTiming>,
    pub total_duration: Duration,
}

/// Drives an ordered `Migration` to completion. Uses the same
/// transactional-step idiom (`pool.begin()`/`commit()`) used
/// throughout this codebase's request handlers, generalized
/// into a per-step wrap/commit loop, plus the
/// record-timing-and-continue shape used by its background task loops.
pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrator's own bookkeeping table if it doesn't exist
    /// yet. Idempotent, metadata-only.
    pub async fn ensure_history_table(&self) -> Result<(), MigratorError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrator_history (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                wall_clock_ms BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Runs every step of `migration` in order. Transactional steps are
    /// wrapped in `pool.begin()`/`commit()` with rollback on error;
    /// non-transactional steps run directly against the pool. Any step
    /// failing aborts the migration — previous steps are NOT rolled
    /// back,.H's requirement that step authors make each
    /// step individually safe and forward-compatible.
    pub async fn run(&self, migration: Migration) -> Result<MigrationReport, MigratorError> {
        self.ensure_history_table().await?;

        let lock = AdvisoryLock::acquire(&self.pool).await?;
        let overall_start = Instant::now();
        let mut timings = Vec::with_capacity(migration.steps.len());

        for step in &migration.steps {
            let started_at = Utc::now();
            let step_start = Instant::now();

            let result = if step.non_transactional() {
                let mut exec = Executor::Pool(&self.pool);
                step.up(&mut exec).await
            } else {
                let mut tx = self.pool.begin().await?;
                let outcome = {
                    let mut exec = Executor::Transaction(&mut tx);
                    step.up(&mut exec).await
                };
                match outcome {
                    Ok(()) => tx.commit().await.map_err(MigratorError::from),
                    Err(err) => {
                        let _ = tx.rollback().await;
                        Err(err)
                    }
                }
            };

            let duration = step_start.elapsed();
            let succeeded = result.is_ok();
            timings.push(StepTiming {
                name: step.name().to_string(),
                started_at,
                duration,
                succeeded,
            });

            match result {
                Ok(()) => {
                    info!(step = step.name(), duration_ms = duration.as_millis(), "migration step completed");
                }
                Err(err) => {
                    warn!(
                        step = step.name(),
                        version = migration.version,
                        ?err,
                        "migration step failed; aborting without rolling back prior steps"
                    );
                    lock.release().await;
                    return Err(err);
                }
            }
        }

        let total_duration = overall_start.elapsed();
        self.record_history(migration.version, &migration.description, total_duration).await?;
        lock.release().await;

        Ok(MigrationReport {
            version: migration.version,
            description: migration.description,
            steps: timings,
            total_duration,
        })
    }

    async fn record_history(&self, version: i64, description: &str, total_duration: Duration) -> Result<(), MigratorError> {
        sqlx::query(
            "INSERT INTO schema_migrator_history (version, description, wall_clock_ms)
             VALUES ($1, $2, $3)
             ON CONFLICT (version) DO NOTHING",
        )
        .bind(version)
        .bind(description)
        .bind(total_duration.as_millis() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
