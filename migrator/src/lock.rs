use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::warn;

use crate::error::MigratorError;

/// Advisory-lock key shared by every migrator run against a given
/// database, regardless of which migration is executing. The migrator
/// is single-operator: concurrent runs against the same
/// database are prohibited by convention and should be enforced by an
/// advisory lock or similar mechanism provided by the database."
const MIGRATOR_LOCK_KEY: i64 = 0x4D47_5254; // "MGRT" packed into an i64

/// Holds one dedicated pool connection for the lifetime of the lock.
/// Postgres advisory locks are session-scoped and re-entrant within a
/// session, so acquiring and releasing through a borrowed `&PgPool` (a
/// fresh connection per query) would let a second call on the same
/// session silently "succeed" without real contention; pinning a single
/// checked-out connection makes the session identity — and therefore the
/// lock — actually exclusive.
pub struct AdvisoryLock {
    conn: PoolConnection<Postgres>,
    held: bool,
}

impl AdvisoryLock {
    /// Attempts to acquire the session-scoped advisory lock. Returns
    /// `LockNotAcquired` if another session already holds it — the
    /// caller should abort rather than wait, since a concurrent migrator
    /// run is an operator error, not a transient condition worth
    /// blocking on.
    pub async fn acquire(pool: &PgPool) -> Result<Self, MigratorError> {
        let mut conn = pool.acquire().await?;
        let row: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(MIGRATOR_LOCK_KEY)
            .fetch_one(&mut *conn)
            .await?;
        if !row.0 {
            return Err(MigratorError::LockNotAcquired);
        }
        Ok(Self { conn, held: true })
    }

    pub async fn release(mut self) {
        if self.held {
            if let Err(err) = sqlx::query("SELECT pg_advisory_unlock($1)")
                .bind(MIGRATOR_LOCK_KEY)
                .execute(&mut *self.conn)
                .await
            {
                warn!(?err, "failed to release migrator advisory lock");
            }
            self.held = false;
        }
    }
}
