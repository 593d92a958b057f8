//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use rahat_core::config::RahatConfig;
use rahat_core::events::DomainEvent;
use rahat_core::messaging::{
    InMemoryPeerClient, InMemoryTransactionQueue, MetaTransactionJob, TransactionRelayer,
    TransactionReceipt,
};
use rahat_core::orchestration::DispatchSystem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct TestSystem {
    pub system: DispatchSystem,
    pub peer: Arc<InMemoryPeerClient>,
    pub queue: Arc<InMemoryTransactionQueue>,
}

pub fn test_system() -> TestSystem {
    test_system_with(RahatConfig::default())
}

pub fn test_system_with(config: RahatConfig) -> TestSystem {
    let (system, peer, queue) = DispatchSystem::in_memory(&config).expect("bootstrap");
    TestSystem {
        system,
        peer,
        queue,
    }
}

/// Relayer that settles every job with a hash derived from its id
#[derive(Default)]
pub struct RecordingRelayer {
    pub relayed: AtomicUsize,
}

#[async_trait]
impl TransactionRelayer for RecordingRelayer {
    async fn relay(&self, job: &MetaTransactionJob) -> Result<TransactionReceipt, String> {
        self.relayed.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionReceipt::new(
            format!("0x{}", job.job_id.simple()),
            "success",
        ))
    }
}

impl RecordingRelayer {
    pub fn count(&self) -> usize {
        self.relayed.load(Ordering::SeqCst)
    }
}

/// Relayer that fails every job
pub struct RevertingRelayer;

#[async_trait]
impl TransactionRelayer for RevertingRelayer {
    async fn relay(&self, _job: &MetaTransactionJob) -> Result<TransactionReceipt, String> {
        Err("execution reverted".to_string())
    }
}

/// Relayer whose first call panics; later calls settle like [`RecordingRelayer`]
#[derive(Default)]
pub struct PanicOnceRelayer {
    panicked: AtomicBool,
    pub settled: RecordingRelayer,
}

#[async_trait]
impl TransactionRelayer for PanicOnceRelayer {
    async fn relay(&self, job: &MetaTransactionJob) -> Result<TransactionReceipt, String> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("relayer lost its signer");
        }
        self.settled.relay(job).await
    }
}

/// Drain every event currently buffered on a subscription
pub fn drain(receiver: &mut broadcast::Receiver<DomainEvent>) -> Vec<DomainEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub fn short_timeout() -> Duration {
    Duration::from_millis(50)
}
