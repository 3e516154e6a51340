use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::MigratorError;

/// What a step's `up`/`down` gets to operate against. Transactional
/// steps only ever see `Transaction`; non-transactional steps (backfill,
/// concurrent index build) see `Pool` and manage their own connections
/// and sub-transactions, so they never hold a single long-lived lock.
pub enum Executor<'a> {
    Transaction(&'a mut PgConnection),
    Pool(&'a PgPool),
}

impl<'a> Executor<'a> {
    pub fn connection(&mut self) -> Result<&mut PgConnection, MigratorError> {
        match self {
            Executor::Transaction(conn) => Ok(conn),
            Executor::Pool(_) => Err(MigratorError::WrongExecutorKind(
                "step requires a transaction but the runner invoked it outside one",
            )),
        }
    }

    pub fn pool(&self) -> Result<&PgPool, MigratorError> {
        match self {
            Executor::Pool(pool) => Ok(pool),
            Executor::Transaction(_) => Err(MigratorError::WrongExecutorKind(
                "step requires direct pool access but the runner invoked it inside a transaction",
            )),
        }
    }
}

/// A single schema-evolution step. Uses the same trait-object
/// pluggable-backend dispatch as `rate_limiter::RateLimiterEngine`,
/// generalized from a single `check` method to `up`/`down` plus a
/// transactionality flag.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    fn name(&self) -> &str;

    /// Steps that must run outside any transaction (non-blocking index
    /// builds, batched backfills). Defaults to `false`: most schema
    /// changes are metadata-only and safe inside a transaction.
    fn non_transactional(&self) -> bool {
        false
    }

    async fn up(&self, exec: &mut Executor<'_>) -> Result<(), MigratorError>;

    async fn down(&self, _exec: &mut Executor<'_>) -> Result<(), MigratorError> {
        Err(MigratorError::NoDownOperation {
            step: self.name().to_string(),
        })
    }
}

/// Timing and outcome of a single step, recorded by the runner
/// regardless of success so operators can see where a failed migration
/// stopped.
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub succeeded: bool,
}

/// An ordered, named, versioned list of steps.
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub steps: Vec<Box<dyn MigrationStep>>,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Box<dyn MigrationStep>>) -> Self {
        self.steps = steps;
        self
    }

    pub fn push(mut self, step: Box<dyn MigrationStep>) -> Self {
        self.steps.push(step);
        self
    }
}
