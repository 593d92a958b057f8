//! # Dispatch System Bootstrap
//!
//! Wires the dispatch core together from configuration and the two
//! transports the host process supplies: the peer client and the
//! meta-transaction queue. The registry is composed exactly once here.

use crate::actions::registry::ActionRegistry;
use crate::actions::tables::default_registry;
use crate::config::{ConfigManager, RahatConfig};
use crate::events::{EventPublisher, NotificationEmitter};
use crate::messaging::{
    InMemoryPeerClient, InMemoryTransactionQueue, PeerClient, PgTransactionQueue,
    TransactionQueue, TransactionRelayer, TransactionWorker, WorkerHandle,
};
use crate::orchestration::command_sender::CommandSender;
use crate::orchestration::dispatcher::ActionDispatcher;
use crate::orchestration::errors::OrchestrationResult;
use crate::orchestration::meta_transaction::MetaTransactionSubmitter;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Fully wired dispatch core
pub struct DispatchSystem {
    pub dispatcher: Arc<ActionDispatcher>,
    pub publisher: EventPublisher,
    pub queue: Arc<dyn TransactionQueue>,
    config: RahatConfig,
}

impl DispatchSystem {
    /// Build from a validated configuration and the host's transports
    pub fn bootstrap(
        config: &RahatConfig,
        peer: Arc<dyn PeerClient>,
        queue: Arc<dyn TransactionQueue>,
    ) -> OrchestrationResult<Self> {
        let publisher = EventPublisher::new(config.events.channel_capacity);
        let emitter = Arc::new(NotificationEmitter::new(publisher.clone()));
        let sender = Arc::new(CommandSender::new(peer, emitter, &config.dispatch));
        let submitter = Arc::new(MetaTransactionSubmitter::new(
            Arc::clone(&queue),
            &config.meta_transactions,
        ));

        let registry = default_registry(submitter, publisher.clone())?;
        let stats = registry.stats();
        info!(
            actions = stats.total_actions,
            tables = stats.tables.len(),
            meta_transaction_actions = stats.meta_transaction_actions,
            queue = %queue.queue_name(),
            "Dispatch system bootstrapped"
        );

        let dispatcher = Arc::new(ActionDispatcher::new(Arc::new(registry), sender));

        Ok(Self {
            dispatcher,
            publisher,
            queue,
            config: config.clone(),
        })
    }

    pub fn from_config_manager(
        manager: &ConfigManager,
        peer: Arc<dyn PeerClient>,
        queue: Arc<dyn TransactionQueue>,
    ) -> OrchestrationResult<Self> {
        Self::bootstrap(manager.config(), peer, queue)
    }

    /// In-process transports, for tests and embedded use
    pub fn in_memory(
        config: &RahatConfig,
    ) -> OrchestrationResult<(Self, Arc<InMemoryPeerClient>, Arc<InMemoryTransactionQueue>)> {
        let peer = Arc::new(InMemoryPeerClient::new());
        let queue = Arc::new(InMemoryTransactionQueue::new(
            &config.meta_transactions.queue_name,
        ));
        let system = Self::bootstrap(config, peer.clone(), queue.clone())?;
        Ok((system, peer, queue))
    }

    /// Durable queue on `pool`; the schema must already be migrated
    pub fn postgres(
        config: &RahatConfig,
        peer: Arc<dyn PeerClient>,
        pool: PgPool,
    ) -> OrchestrationResult<(Self, Arc<PgTransactionQueue>)> {
        let queue = Arc::new(PgTransactionQueue::from_config(
            pool,
            &config.meta_transactions,
        ));
        let system = Self::bootstrap(config, peer, queue.clone())?;
        Ok((system, queue))
    }

    /// Start a worker draining the meta-transaction queue
    pub fn start_worker(&self, relayer: Arc<dyn TransactionRelayer>) -> WorkerHandle {
        TransactionWorker::new(
            Arc::clone(&self.queue),
            relayer,
            self.config.meta_transactions.worker_poll_interval(),
        )
        .spawn()
    }

    pub fn registry(&self) -> &ActionRegistry {
        self.dispatcher.registry()
    }

    pub fn config(&self) -> &RahatConfig {
        &self.config
    }
}
