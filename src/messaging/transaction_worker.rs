//! # Transaction Worker
//!
//! Consumer side of the meta-transaction queue: claims jobs, hands each to a
//! [`TransactionRelayer`] and records the terminal state so waiting producers
//! resume. Jobs are processed one at a time in claim order.
//!
//! Retry policy is the relayer's concern. A relayer error completes the job
//! as failed; it is never requeued here. A relayer panic is treated the same
//! way and the loop keeps running.

use super::errors::MessagingResult;
use super::transaction_queue::{MetaTransactionJob, TransactionQueue, TransactionReceipt};
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Submits a queued meta-transaction to the chain
#[async_trait]
pub trait TransactionRelayer: Send + Sync {
    async fn relay(&self, job: &MetaTransactionJob) -> Result<TransactionReceipt, String>;
}

/// Polling worker bound to one queue
pub struct TransactionWorker {
    queue: Arc<dyn TransactionQueue>,
    relayer: Arc<dyn TransactionRelayer>,
    poll_interval: Duration,
}

/// Running worker; dropping the handle stops the loop after its current job
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl WorkerHandle {
    /// Signal shutdown and wait for the loop to exit. Returns jobs processed.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(processed) => processed,
            Err(e) => {
                error!(error = %e, "Transaction worker task failed");
                0
            }
        }
    }
}

impl TransactionWorker {
    pub fn new(
        queue: Arc<dyn TransactionQueue>,
        relayer: Arc<dyn TransactionRelayer>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            relayer,
            poll_interval,
        }
    }

    /// Spawn the worker loop on the current runtime
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });
        WorkerHandle { shutdown, task }
    }

    /// Process jobs until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(queue = %self.queue.queue_name(), "Transaction worker started");
        let mut processed = 0u64;

        loop {
            let stop = *shutdown.borrow();
            if stop {
                break;
            }

            match self.process_next().await {
                Ok(true) => {
                    processed += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Transaction worker iteration failed"),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = self.queue.wait_for_work(self.poll_interval) => {}
            }
        }

        info!(
            queue = %self.queue.queue_name(),
            processed = processed,
            "Transaction worker stopped"
        );
        processed
    }

    /// Claim and settle one job. Returns whether a job was processed.
    pub async fn process_next(&self) -> MessagingResult<bool> {
        let Some(job) = self.queue.claim().await? else {
            return Ok(false);
        };

        debug!(job_id = %job.job_id, subject_id = %job.payload.subject_id, "Relaying meta-transaction");
        let outcome = match AssertUnwindSafe(self.relayer.relay(&job))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = format!("relayer panicked: {}", panic_message(&*panic));
                error!(job_id = %job.job_id, error = %message, "Meta-transaction relayer panicked");
                Err(message)
            }
        };
        if let Err(message) = &outcome {
            warn!(job_id = %job.job_id, error = %message, "Meta-transaction relay failed");
        }

        self.queue.complete(job.job_id, outcome).await?;
        Ok(true)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
