//! # Meta-Transaction Submitter
//!
//! Submits blockchain transactions through the meta-transaction work queue
//! and suspends the calling task until the job settles. `submit` returns only
//! once the transaction hash and status are known.
//!
//! There is no retry and no cancellation at this layer: an enqueue failure is
//! fatal to the dispatch, and an accepted job runs to completion even when the
//! caller stops waiting for it.

use crate::config::MetaTransactionConfig;
use crate::messaging::{
    MetaTransactionJob, MetaTransactionPayload, TransactionQueue, TransactionReceipt,
};
use crate::orchestration::errors::OrchestrationResult;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub struct MetaTransactionSubmitter {
    queue: Arc<dyn TransactionQueue>,
    job_type: String,
    completion_timeout: Option<Duration>,
}

impl MetaTransactionSubmitter {
    pub fn new(queue: Arc<dyn TransactionQueue>, config: &MetaTransactionConfig) -> Self {
        Self {
            queue,
            job_type: config.job_type.clone(),
            completion_timeout: config.completion_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Enqueue a transaction request and wait for its receipt
    #[instrument(skip(self, params, trigger), fields(queue = %self.queue.queue_name()))]
    pub async fn submit(
        &self,
        params: Value,
        subject_id: Uuid,
        trigger: Option<Value>,
    ) -> OrchestrationResult<TransactionReceipt> {
        let job = MetaTransactionJob::new(
            self.queue.queue_name(),
            &self.job_type,
            MetaTransactionPayload {
                params,
                subject_id,
                trigger,
            },
        );

        let handle = self.queue.enqueue(job).await.map_err(|e| {
            error!(error = %e, "Meta-transaction could not be enqueued");
            e
        })?;
        let job_id = handle.job_id();

        let settled = match self.completion_timeout {
            Some(limit) => handle.wait_timeout(limit).await,
            None => handle.wait().await,
        };

        match settled {
            Ok(receipt) => {
                info!(
                    job_id = %job_id,
                    transaction_hash = %receipt.transaction_hash,
                    status = %receipt.status,
                    "Meta-transaction settled"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Meta-transaction did not settle");
                Err(e.into())
            }
        }
    }

    pub fn queue_name(&self) -> &str {
        self.queue.queue_name()
    }
}
