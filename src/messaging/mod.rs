//! # Messaging Module
//!
//! Message-bus plumbing for the dispatch core: peer command envelopes and the
//! request/response client used to reach peer microservices, plus the
//! meta-transaction work queue (in-process or Postgres-backed) and its worker.

pub mod envelope;
pub mod errors;
pub mod peer_client;
pub mod pg_transaction_queue;
pub mod transaction_queue;
pub mod transaction_worker;

pub use envelope::CommandEnvelope;
pub use errors::{MessagingError, MessagingResult};
pub use peer_client::{InMemoryPeerClient, PeerClient, PeerResponder};
pub use pg_transaction_queue::PgTransactionQueue;
pub use transaction_queue::{
    InMemoryTransactionQueue, JobHandle, JobOutcome, MetaTransactionJob, MetaTransactionPayload,
    TransactionQueue, TransactionReceipt,
};
pub use transaction_worker::{TransactionRelayer, TransactionWorker, WorkerHandle};
