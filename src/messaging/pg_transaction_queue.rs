//! # Postgres Transaction Queue
//!
//! [`TransactionQueue`] backed by the `meta_transaction_jobs` table, so an
//! accepted job outlives the process that enqueued it.
//!
//! ## Row lifecycle
//!
//! `pending -> claimed -> completed | failed`
//!
//! - Workers claim with `FOR UPDATE SKIP LOCKED`; concurrent workers never
//!   receive the same row.
//! - A row left `claimed` past the visibility timeout is claimable again.
//! - The producer's [`JobHandle`] is fed by a task polling the job's own row
//!   until it turns terminal. The task stops when the producer drops the
//!   handle; a row that disappears abandons the job.

use super::errors::{MessagingError, MessagingResult};
use super::transaction_queue::{
    JobHandle, JobOutcome, MetaTransactionJob, MetaTransactionPayload, TransactionQueue,
    TransactionReceipt,
};
use crate::config::MetaTransactionConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

const STATUS_COMPLETED: &str = "completed";
const STATUS_FAILED: &str = "failed";

#[derive(Debug, FromRow)]
struct JobRow {
    job_id: Uuid,
    queue_name: String,
    job_type: String,
    payload: Json<MetaTransactionPayload>,
    enqueued_at: DateTime<Utc>,
}

impl From<JobRow> for MetaTransactionJob {
    fn from(row: JobRow) -> Self {
        Self {
            job_id: row.job_id,
            job_type: row.job_type,
            queue_name: row.queue_name,
            payload: row.payload.0,
            enqueued_at: row.enqueued_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    status: String,
    transaction_hash: Option<String>,
    transaction_status: Option<String>,
    error_message: Option<String>,
}

impl StatusRow {
    /// `None` while the job is still pending or claimed
    fn outcome(self) -> Option<JobOutcome> {
        match self.status.as_str() {
            STATUS_COMPLETED => Some(Ok(TransactionReceipt::new(
                self.transaction_hash.unwrap_or_default(),
                self.transaction_status.unwrap_or_default(),
            ))),
            STATUS_FAILED => Some(Err(self.error_message.unwrap_or_default())),
            _ => None,
        }
    }
}

/// Durable transaction queue on a shared Postgres pool
#[derive(Debug, Clone)]
pub struct PgTransactionQueue {
    pool: PgPool,
    queue_name: String,
    completion_poll_interval: Duration,
    visibility_timeout: Duration,
}

impl PgTransactionQueue {
    pub fn new(pool: PgPool, queue_name: impl Into<String>) -> Self {
        let defaults = MetaTransactionConfig::default();
        Self {
            pool,
            queue_name: queue_name.into(),
            completion_poll_interval: defaults.completion_poll_interval(),
            visibility_timeout: defaults.claim_visibility_timeout(),
        }
    }

    pub fn from_config(pool: PgPool, config: &MetaTransactionConfig) -> Self {
        Self::new(pool, &config.queue_name)
            .with_completion_poll_interval(config.completion_poll_interval())
            .with_visibility_timeout(config.claim_visibility_timeout())
    }

    pub fn with_completion_poll_interval(mut self, interval: Duration) -> Self {
        self.completion_poll_interval = interval;
        self
    }

    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Jobs waiting to be claimed
    pub async fn pending_count(&self) -> MessagingResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM meta_transaction_jobs WHERE queue_name = $1 AND status = 'pending'",
        )
        .bind(&self.queue_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.operation_error("pending_count", e))
    }

    /// Current row status of `job_id`, if the row exists
    pub async fn job_status(&self, job_id: Uuid) -> MessagingResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT status FROM meta_transaction_jobs WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.operation_error("job_status", e))
    }

    fn operation_error(&self, operation: &str, error: sqlx::Error) -> MessagingError {
        MessagingError::queue_operation(&self.queue_name, operation, error.to_string())
    }
}

async fn fetch_status(pool: &PgPool, job_id: Uuid) -> Result<Option<StatusRow>, sqlx::Error> {
    sqlx::query_as::<_, StatusRow>(
        r#"
        SELECT status, transaction_hash, transaction_status, error_message
        FROM meta_transaction_jobs
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

/// Feed `completion` once the job's row turns terminal
async fn watch_completion(
    pool: PgPool,
    job_id: Uuid,
    interval: Duration,
    mut completion: oneshot::Sender<JobOutcome>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = completion.closed() => {
                debug!(job_id = %job_id, "Producer stopped waiting; completion watch ends");
                return;
            }
            _ = ticker.tick() => {}
        }

        if pool.is_closed() {
            warn!(job_id = %job_id, "Pool closed before the job settled");
            return;
        }

        match fetch_status(&pool, job_id).await {
            Ok(Some(row)) => {
                if let Some(outcome) = row.outcome() {
                    let _ = completion.send(outcome);
                    return;
                }
            }
            Ok(None) => {
                warn!(job_id = %job_id, "Job row removed before reaching a terminal state");
                return;
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to read job status; retrying");
            }
        }
    }
}

#[async_trait]
impl TransactionQueue for PgTransactionQueue {
    async fn enqueue(&self, job: MetaTransactionJob) -> MessagingResult<JobHandle> {
        let job_id = job.job_id;

        // Jobs land on this queue whatever name they carry
        sqlx::query(
            r#"
            INSERT INTO meta_transaction_jobs (job_id, queue_name, job_type, payload, status, enqueued_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            "#,
        )
        .bind(job_id)
        .bind(&self.queue_name)
        .bind(&job.job_type)
        .bind(Json(&job.payload))
        .bind(job.enqueued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MessagingError::queue_unavailable(&self.queue_name, e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        tokio::spawn(watch_completion(
            self.pool.clone(),
            job_id,
            self.completion_poll_interval,
            tx,
        ));

        debug!(queue = %self.queue_name, job_id = %job_id, "Meta-transaction job persisted");
        Ok(JobHandle::new(job_id, rx))
    }

    async fn claim(&self) -> MessagingResult<Option<MetaTransactionJob>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE meta_transaction_jobs
            SET status = 'claimed', claimed_at = NOW()
            WHERE job_id = (
                SELECT job_id
                FROM meta_transaction_jobs
                WHERE queue_name = $1
                  AND (
                      status = 'pending'
                      OR (status = 'claimed' AND claimed_at < NOW() - make_interval(secs => $2))
                  )
                ORDER BY enqueued_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING job_id, queue_name, job_type, payload, enqueued_at
            "#,
        )
        .bind(&self.queue_name)
        .bind(self.visibility_timeout.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.operation_error("claim", e))?;

        Ok(row.map(MetaTransactionJob::from))
    }

    async fn complete(&self, job_id: Uuid, outcome: JobOutcome) -> MessagingResult<()> {
        let (status, hash, transaction_status, error_message) = match outcome {
            Ok(receipt) => (
                STATUS_COMPLETED,
                Some(receipt.transaction_hash),
                Some(receipt.status),
                None,
            ),
            Err(message) => (STATUS_FAILED, None, None, Some(message)),
        };

        let result = sqlx::query(
            r#"
            UPDATE meta_transaction_jobs
            SET status = $2,
                transaction_hash = $3,
                transaction_status = $4,
                error_message = $5,
                completed_at = NOW()
            WHERE job_id = $1 AND status IN ('pending', 'claimed')
            "#,
        )
        .bind(job_id)
        .bind(status)
        .bind(hash)
        .bind(transaction_status)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| self.operation_error("complete", e))?;

        if result.rows_affected() == 0 {
            return Err(MessagingError::JobNotFound { job_id });
        }
        debug!(queue = %self.queue_name, job_id = %job_id, status, "Meta-transaction job completed");
        Ok(())
    }

    async fn wait_for_work(&self, max_wait: Duration) {
        tokio::time::sleep(max_wait).await;
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}
