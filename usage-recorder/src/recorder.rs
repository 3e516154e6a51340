use std::sync::Arc;

use chrono::Utc;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::warn;

use crate::metric::UsageMetric;
use crate::metrics::UsageRecorderMetrics;

const QUEUE_CAPACITY: usize = 10_000;
const BATCH_SIZE: usize = 100;
const FLUSH_INTERVAL_SECS: u64 = 5;
const LIVE_COUNTER_TTL_SECS: i64 = 48 * 60 * 60;

#[derive(Debug, Clone, Copy)]
pub struct UsageRecorderConfig {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for UsageRecorderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: QUEUE_CAPACITY,
            batch_size: BATCH_SIZE,
            flush_interval: Duration::from_secs(FLUSH_INTERVAL_SECS),
        }
    }
}

/// Non-blocking usage accounting fabric. `record` is a
/// bounded-queue `try_send`; a single background worker drains the queue
/// on a 100-item batch or a 5-second tick, whichever comes first, and
/// persists durably while also bumping a live per-tenant-per-day Redis
/// hash. Generalized from an in-memory aggregation window to an
/// explicit bounded channel with drop-on-full.
#[derive(Clone)]
pub struct UsageRecorder {
    sender: mpsc::Sender<UsageMetric>,
    pub metrics: Arc<UsageRecorderMetrics>,
}

impl UsageRecorder {
    /// Spawns the background drain task and returns the recorder handle
    /// together with the task's `JoinHandle` so callers can await a
    /// graceful shutdown.
    pub fn spawn(
        pool: PgPool,
        redis: ConnectionManager,
        config: UsageRecorderConfig,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let metrics = Arc::new(UsageRecorderMetrics::new());
        let worker_metrics = metrics.clone();
        let handle = tokio::spawn(drain_loop(rx, pool, redis, config, worker_metrics));
        (
            Self {
                sender: tx,
                metrics,
            },
            handle,
        )
    }

    /// Enqueue a metric without blocking the caller. Returns `false`
    /// (and increments the drop counter) if the queue is full; callers
    /// must never treat this as an error worth surfacing to the client.
    pub fn record(&self, metric: UsageMetric) -> bool {
        match self.sender.try_send(metric) {
            Ok(()) => {
                self.metrics.enqueued_total.inc();
                true
            }
            Err(_) => {
                self.metrics.dropped_total.inc();
                false
            }
        }
    }

    /// Closes the channel so the background worker flushes remaining
    /// items and exits; await the `JoinHandle` returned by `spawn` after
    /// calling this to block until the flush completes.
    pub fn shutdown(self) {
        drop(self.sender);
    }
}

async fn drain_loop(
    mut rx: mpsc::Receiver<UsageMetric>,
    pool: PgPool,
    redis: ConnectionManager,
    config: UsageRecorderConfig,
    metrics: Arc<UsageRecorderMetrics>,
) {
    let mut batch = Vec::with_capacity(config.batch_size);
    let mut ticker = interval(config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_metric = rx.recv() => {
                match maybe_metric {
                    Some(metric) => {
                        batch.push(metric);
                        if batch.len() >= config.batch_size {
                            flush(&pool, &redis, &metrics, std::mem::take(&mut batch)).await;
                        }
                    }
                    None => {
                        flush(&pool, &redis, &metrics, std::mem::take(&mut batch)).await;
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    flush(&pool, &redis, &metrics, std::mem::take(&mut batch)).await;
                }
            }
        }
    }
}

async fn flush(
    pool: &PgPool,
    redis: &ConnectionManager,
    metrics: &UsageRecorderMetrics,
    batch: Vec<UsageMetric>,
) {
    if batch.is_empty() {
        return;
    }

    for item in &batch {
        if let Err(err) = persist(pool, item).await {
            warn!(?err, tenant_id = %item.tenant_id, "failed to persist usage metric");
            metrics.flush_failures_total.inc();
            continue;
        }
        metrics.persisted_total.inc();

        if let Err(err) = bump_live_counters(redis, item).await {
            warn!(?err, tenant_id = %item.tenant_id, "failed to update live usage counters");
        }
    }
}

async fn persist(pool: &PgPool, item: &UsageMetric) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO usage_metrics
            (tenant_id, api_key_id, endpoint, method, status_code, request_bytes,
             response_bytes, latency_ms, occurred_at, client_ip, user_agent)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(item.tenant_id)
    .bind(item.api_key_id)
    .bind(&item.endpoint)
    .bind(&item.method)
    .bind(item.status_code as i32)
    .bind(item.request_bytes as i64)
    .bind(item.response_bytes as i64)
    .bind(item.latency_ms as i64)
    .bind(item.timestamp)
    .bind(item.client_ip.as_deref())
    .bind(item.user_agent.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_metric() -> UsageMetric {
        UsageMetric {
            tenant_id: Uuid::new_v4(),
            api_key_id: Uuid::new_v4(),
            endpoint: "/api/v1/orders/{id}".into(),
            method: "GET".into(),
            status_code: 200,
            request_bytes: 128,
            response_bytes: 512,
            latency_ms: 12,
            timestamp: Utc::now(),
            client_ip: Some("127.0.0.1".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    #[test]
    fn record_drops_and_counts_when_queue_is_full() {
        let (tx, rx) = mpsc::channel(2);
        let recorder = UsageRecorder {
            sender: tx,
            metrics: Arc::new(UsageRecorderMetrics::new()),
        };

        assert!(recorder.record(sample_metric()));
        assert!(recorder.record(sample_metric()));
        assert!(!recorder.record(sample_metric()));

        assert_eq!(recorder.metrics.enqueued_total.get(), 2);
        assert_eq!(recorder.metrics.dropped_total.get(), 1);

        drop(rx);
    }
}

async fn bump_live_counters(
    redis: &ConnectionManager,
    item: &UsageMetric,
) -> Result<(), redis::RedisError> {
    let day = Utc::now().format("%Y-%m-%d");
    let key = format!("usage:{}:{}", item.tenant_id, day);
    let bandwidth = (item.request_bytes + item.response_bytes) as i64;

    let mut conn = redis.clone();
    redis::pipe()
        .atomic()
        .cmd("HINCRBY")
        .arg(&key)
        .arg("requests")
        .arg(1_i64)
        .ignore()
        .cmd("HINCRBY")
        .arg(&key)
        .arg("bandwidth")
        .arg(bandwidth)
        .ignore()
        .cmd("HINCRBY")
        .arg(&key)
        .arg("latency_sum")
        .arg(item.latency_ms as i64)
        .ignore()
        .expire(&key, LIVE_COUNTER_TTL_SECS as usize)
        .ignore()
        .query_async(&mut conn)
        .await
}
