//! # Meta-Transaction Queue
//!
//! Work queue contract for blockchain transactions that are submitted and
//! settled asynchronously. The queue owns a job until it reaches a terminal
//! state; the producer only ever holds a [`JobHandle`].
//!
//! Completion is explicit: a producer must await [`JobHandle::wait`] (or
//! [`JobHandle::wait_timeout`]) to observe the transaction hash and status.
//! Nothing on the handle is populated before that wait returns.

use super::errors::{MessagingError, MessagingResult};
use crate::constants::queues;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

/// Body of a queued meta-transaction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransactionPayload {
    pub params: Value,
    pub subject_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Value>,
}

/// A queued meta-transaction, serialized as `{jobId, type, queueName, payload, enqueuedAt}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransactionJob {
    pub job_id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub queue_name: String,
    pub payload: MetaTransactionPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl MetaTransactionJob {
    pub fn new(
        queue_name: impl Into<String>,
        job_type: impl Into<String>,
        payload: MetaTransactionPayload,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            job_type: job_type.into(),
            queue_name: queue_name.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Settled transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub status: String,
}

impl TransactionReceipt {
    pub fn new(transaction_hash: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            status: status.into(),
        }
    }

    /// Parse the raw job result `{data: {hash, status}}` a relayer reports
    pub fn from_job_result(result: &Value) -> MessagingResult<Self> {
        let data = result.get("data").ok_or_else(|| MessagingError::MessageDeserialization {
            message: "job result has no data".to_string(),
        })?;
        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| MessagingError::MessageDeserialization {
                    message: format!("job result has no {name}"),
                })
        };

        Ok(Self {
            transaction_hash: field("hash")?,
            status: field("status")?,
        })
    }
}

/// Terminal state reported by a worker: a receipt or a failure message
pub type JobOutcome = Result<TransactionReceipt, String>;

/// Producer-side reference to a queued job
#[derive(Debug)]
pub struct JobHandle {
    job_id: Uuid,
    completion: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn new(job_id: Uuid, completion: oneshot::Receiver<JobOutcome>) -> Self {
        Self { job_id, completion }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Suspend until the job reaches a terminal state
    pub async fn wait(self) -> MessagingResult<TransactionReceipt> {
        let job_id = self.job_id;
        match self.completion.await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(message)) => Err(MessagingError::job_failed(job_id, message)),
            Err(_) => Err(MessagingError::JobAbandoned { job_id }),
        }
    }

    /// Like [`JobHandle::wait`], bounded. The job itself keeps running.
    pub async fn wait_timeout(self, limit: Duration) -> MessagingResult<TransactionReceipt> {
        let job_id = self.job_id;
        match tokio::time::timeout(limit, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(MessagingError::CompletionTimeout {
                job_id,
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }
}

/// Durable work queue for meta-transactions
#[async_trait]
pub trait TransactionQueue: Send + Sync {
    /// Enqueue a job; returns once the queue has accepted it
    async fn enqueue(&self, job: MetaTransactionJob) -> MessagingResult<JobHandle>;

    /// Claim the next pending job, if any (worker operation)
    async fn claim(&self) -> MessagingResult<Option<MetaTransactionJob>>;

    /// Record the terminal state of a claimed job (worker operation)
    async fn complete(&self, job_id: Uuid, outcome: JobOutcome) -> MessagingResult<()>;

    /// Resolve when new work may be available, or after `max_wait`
    async fn wait_for_work(&self, max_wait: Duration);

    fn queue_name(&self) -> &str;
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<MetaTransactionJob>,
    waiters: HashMap<Uuid, oneshot::Sender<JobOutcome>>,
    closed: bool,
}

/// In-process transaction queue.
///
/// Pending jobs are kept in FIFO order. Claimed jobs stay registered until
/// completed; closing the queue rejects new work and abandons nothing that
/// has already been accepted.
#[derive(Debug)]
pub struct InMemoryTransactionQueue {
    queue_name: String,
    state: Mutex<QueueState>,
    work_available: Notify,
}

impl InMemoryTransactionQueue {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            state: Mutex::new(QueueState::default()),
            work_available: Notify::new(),
        }
    }

    /// Stop accepting new jobs; subsequent enqueues fail as unavailable
    pub fn close(&self) {
        self.state.lock().closed = true;
        warn!(queue = %self.queue_name, "Transaction queue closed");
    }

    pub fn reopen(&self) {
        self.state.lock().closed = false;
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Jobs accepted but not yet completed, claimed or not
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

impl Default for InMemoryTransactionQueue {
    fn default() -> Self {
        Self::new(queues::META_TXN_QUEUE)
    }
}

#[async_trait]
impl TransactionQueue for InMemoryTransactionQueue {
    async fn enqueue(&self, job: MetaTransactionJob) -> MessagingResult<JobHandle> {
        let (tx, rx) = oneshot::channel();
        let job_id = job.job_id;
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(MessagingError::queue_unavailable(
                    &self.queue_name,
                    "queue is not accepting jobs",
                ));
            }
            state.waiters.insert(job_id, tx);
            state.pending.push_back(job);
        }
        self.work_available.notify_one();

        debug!(queue = %self.queue_name, job_id = %job_id, "Meta-transaction job enqueued");
        Ok(JobHandle::new(job_id, rx))
    }

    async fn claim(&self) -> MessagingResult<Option<MetaTransactionJob>> {
        Ok(self.state.lock().pending.pop_front())
    }

    async fn complete(&self, job_id: Uuid, outcome: JobOutcome) -> MessagingResult<()> {
        let waiter = self
            .state
            .lock()
            .waiters
            .remove(&job_id)
            .ok_or(MessagingError::JobNotFound { job_id })?;

        // The producer may have stopped waiting; the job is still terminal
        if waiter.send(outcome).is_err() {
            debug!(job_id = %job_id, "Job completed after its producer stopped waiting");
        }
        Ok(())
    }

    async fn wait_for_work(&self, max_wait: Duration) {
        if self.pending_count() > 0 {
            return;
        }
        let _ = tokio::time::timeout(max_wait, self.work_available.notified()).await;
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_receipt_from_job_result() {
        let receipt =
            TransactionReceipt::from_job_result(&json!({"data": {"hash": "0x9", "status": "1"}}))
                .unwrap();
        assert_eq!(receipt, TransactionReceipt::new("0x9", "1"));

        assert!(TransactionReceipt::from_job_result(&json!({"data": {"hash": "0x9"}})).is_err());
        assert!(TransactionReceipt::from_job_result(&json!({})).is_err());
    }

    fn job() -> MetaTransactionJob {
        MetaTransactionJob::new(
            queues::META_TXN_QUEUE,
            queues::ADD_QUEUE_JOB,
            MetaTransactionPayload {
                params: json!({"metaTxRequest": {"to": "0xabc"}}),
                subject_id: Uuid::new_v4(),
                trigger: None,
            },
        )
    }

    #[tokio::test]
    async fn test_enqueue_claim_complete() {
        let queue = InMemoryTransactionQueue::default();
        let handle = queue.enqueue(job()).await.unwrap();
        assert_eq!(queue.pending_count(), 1);

        let claimed = queue.claim().await.unwrap().expect("job pending");
        assert_eq!(claimed.job_id, handle.job_id());
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.in_flight_count(), 1);

        queue
            .complete(claimed.job_id, Ok(TransactionReceipt::new("0xhash", "success")))
            .await
            .unwrap();

        let receipt = handle.wait().await.unwrap();
        assert_eq!(receipt.transaction_hash, "0xhash");
        assert_eq!(queue.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_jobs() {
        let queue = InMemoryTransactionQueue::default();
        queue.close();
        let err = queue.enqueue(job()).await.unwrap_err();
        assert!(matches!(err, MessagingError::QueueUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_failed_job_surfaces_message() {
        let queue = InMemoryTransactionQueue::default();
        let handle = queue.enqueue(job()).await.unwrap();
        let job_id = handle.job_id();
        queue
            .complete(job_id, Err("nonce too low".to_string()))
            .await
            .unwrap();

        let err = handle.wait().await.unwrap_err();
        assert_eq!(err, MessagingError::job_failed(job_id, "nonce too low"));
    }

    #[tokio::test]
    async fn test_wait_timeout_leaves_job_queued() {
        let queue = InMemoryTransactionQueue::default();
        let handle = queue.enqueue(job()).await.unwrap();

        let err = handle
            .wait_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::CompletionTimeout { .. }));
        assert_eq!(queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_completing_unknown_job_fails() {
        let queue = InMemoryTransactionQueue::default();
        let job_id = Uuid::new_v4();
        let err = queue.complete(job_id, Err("x".into())).await.unwrap_err();
        assert_eq!(err, MessagingError::JobNotFound { job_id });
    }

    #[test]
    fn test_receipt_wire_shape() {
        let receipt = TransactionReceipt::new("0x1", "success");
        assert_eq!(
            serde_json::to_value(&receipt).unwrap(),
            json!({"transactionHash": "0x1", "status": "success"})
        );
    }

    #[test]
    fn test_job_wire_shape() {
        let job = job();
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["type"], "ADD_QUEUE");
        assert_eq!(value["queueName"], "META_TXN");
        assert_eq!(value["jobId"], json!(job.job_id));
        assert_eq!(
            value["payload"],
            json!({
                "params": {"metaTxRequest": {"to": "0xabc"}},
                "subjectId": job.payload.subject_id,
            })
        );
        assert!(value.get("job_type").is_none());

        let parsed: MetaTransactionJob = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, job);
    }
}
