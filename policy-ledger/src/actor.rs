//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`Ledger`]; nothing else can reach the chain or buffer
//! - Submissions, seals, resets and reads are serialized through one mailbox
//! - Async message passing with backpressure (bounded channel)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Console / request handlers                  │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   Ledger { chain, pending }  +  Metrics               │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::config::IssuanceConfig;
use crate::ledger::ChainAudit;
use crate::metrics::Metrics;
use crate::types::{
    policy_details, AccountId, Block, PolicyDetails, PolicyStatus, PolicyType, Transaction,
};
use crate::{Error, Ledger, Result};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

/// Fields of a transaction submission
#[derive(Debug, Clone)]
pub struct Submission {
    /// Sending party
    pub sender: AccountId,
    /// Receiving party
    pub receiver: AccountId,
    /// Amount, must be non-negative
    pub amount: Decimal,
    /// Policy metadata
    pub policy_details: PolicyDetails,
}

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Stage a transaction
    AddTransaction {
        submission: Submission,
        response: oneshot::Sender<Result<u64>>,
    },

    /// Stage a transaction and seal it into its own block in one step
    SubmitAndSeal {
        submission: Submission,
        proof: u64,
        response: oneshot::Sender<Result<Block>>,
    },

    /// Seal with a caller-supplied previous hash
    CreateBlock {
        proof: u64,
        previous_hash: String,
        response: oneshot::Sender<Block>,
    },

    /// Seal linked to the current tip
    SealBlock {
        proof: u64,
        response: oneshot::Sender<Result<Block>>,
    },

    /// Get latest block
    GetLastBlock {
        response: oneshot::Sender<Result<Block>>,
    },

    /// Snapshot of every sealed block
    GetChain {
        response: oneshot::Sender<Vec<Block>>,
    },

    /// Snapshot of the pending buffer
    GetPending {
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Linkage check
    ValidateChain {
        response: oneshot::Sender<bool>,
    },

    /// Full integrity report
    Audit {
        response: oneshot::Sender<ChainAudit>,
    },

    /// Discard everything and re-seal genesis
    Reset {
        response: oneshot::Sender<()>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// Exclusively owned ledger
    ledger: Ledger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Metrics collector
    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: Ledger, mailbox: mpsc::Receiver<LedgerMessage>, metrics: Metrics) -> Self {
        metrics.set_chain_length(ledger.len());
        Self {
            ledger,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::debug!("Ledger actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::AddTransaction {
                submission,
                response,
            } => {
                let result = self.add_transaction(submission);
                let _ = response.send(result);
            }

            LedgerMessage::SubmitAndSeal {
                submission,
                proof,
                response,
            } => {
                let result = self
                    .add_transaction(submission)
                    .and_then(|_| self.seal_block(proof));
                let _ = response.send(result);
            }

            LedgerMessage::CreateBlock {
                proof,
                previous_hash,
                response,
            } => {
                let block = self.ledger.create_block(proof, previous_hash).clone();
                self.metrics.record_block_sealed(self.ledger.len());
                let _ = response.send(block);
            }

            LedgerMessage::SealBlock { proof, response } => {
                let _ = response.send(self.seal_block(proof));
            }

            LedgerMessage::GetLastBlock { response } => {
                let _ = response.send(self.ledger.last_block().cloned());
            }

            LedgerMessage::GetChain { response } => {
                let _ = response.send(self.ledger.blocks().to_vec());
            }

            LedgerMessage::GetPending { response } => {
                let _ = response.send(self.ledger.pending().to_vec());
            }

            LedgerMessage::ValidateChain { response } => {
                let valid = self.ledger.validate_chain();
                self.metrics.record_integrity_check(valid);
                let _ = response.send(valid);
            }

            LedgerMessage::Audit { response } => {
                let audit = self.ledger.audit();
                self.metrics.record_integrity_check(audit.is_valid());
                let _ = response.send(audit);
            }

            LedgerMessage::Reset { response } => {
                self.ledger.reset();
                self.metrics.set_chain_length(self.ledger.len());
                let _ = response.send(());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn add_transaction(&mut self, submission: Submission) -> Result<u64> {
        let result = self.ledger.add_transaction(
            submission.sender,
            submission.receiver,
            submission.amount,
            submission.policy_details,
        );
        self.metrics.record_submission(result.is_ok());
        result
    }

    fn seal_block(&mut self, proof: u64) -> Result<Block> {
        let block = self.ledger.seal_block(proof)?.clone();
        self.metrics.record_block_sealed(self.ledger.len());
        Ok(block)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
    metrics: Metrics,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>, metrics: Metrics) -> Self {
        Self { sender, metrics }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Stage a transaction; returns the index of the next block
    pub async fn add_transaction(&self, submission: Submission) -> Result<u64> {
        self.request(|response| LedgerMessage::AddTransaction {
            submission,
            response,
        })
        .await?
    }

    /// Stage a transaction and seal it without interleaving other writers
    pub async fn submit_and_seal(&self, submission: Submission, proof: u64) -> Result<Block> {
        self.request(|response| LedgerMessage::SubmitAndSeal {
            submission,
            proof,
            response,
        })
        .await?
    }

    /// Issue an active policy paid into the vault account and seal it
    pub async fn issue_policy(
        &self,
        issuance: &IssuanceConfig,
        holder: &str,
        premium: Decimal,
        policy_type: PolicyType,
        proof: u64,
    ) -> Result<Block> {
        if let Err(e) = issuance.check(holder, premium) {
            self.metrics.record_submission(false);
            return Err(e);
        }

        let submission = Submission {
            sender: AccountId::new(issuance.vault_account.as_str()),
            receiver: AccountId::new(holder),
            amount: premium,
            policy_details: policy_details(policy_type, PolicyStatus::Active),
        };
        self.submit_and_seal(submission, proof).await
    }

    /// Seal with a caller-supplied previous hash
    pub async fn create_block(&self, proof: u64, previous_hash: String) -> Result<Block> {
        self.request(|response| LedgerMessage::CreateBlock {
            proof,
            previous_hash,
            response,
        })
        .await
    }

    /// Seal linked to the current tip
    pub async fn seal_block(&self, proof: u64) -> Result<Block> {
        self.request(|response| LedgerMessage::SealBlock { proof, response })
            .await?
    }

    /// Get latest block
    pub async fn last_block(&self) -> Result<Block> {
        self.request(|response| LedgerMessage::GetLastBlock { response })
            .await?
    }

    /// Snapshot of the chain
    pub async fn chain(&self) -> Result<Vec<Block>> {
        self.request(|response| LedgerMessage::GetChain { response })
            .await
    }

    /// Snapshot of the pending buffer
    pub async fn pending(&self) -> Result<Vec<Transaction>> {
        self.request(|response| LedgerMessage::GetPending { response })
            .await
    }

    /// Linkage check
    pub async fn validate_chain(&self) -> Result<bool> {
        self.request(|response| LedgerMessage::ValidateChain { response })
            .await
    }

    /// Full integrity report
    pub async fn audit(&self) -> Result<ChainAudit> {
        self.request(|response| LedgerMessage::Audit { response })
            .await
    }

    /// Discard the ledger and re-seal genesis
    pub async fn reset(&self) -> Result<()> {
        self.request(|response| LedgerMessage::Reset { response })
            .await
    }

    /// Metrics recorded by the actor
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor. Must be called inside a Tokio runtime.
pub fn spawn_ledger_actor(ledger: Ledger, mailbox_capacity: usize, metrics: Metrics) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx, metrics.clone());

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(receiver: &str, amount: i64) -> Submission {
        Submission {
            sender: AccountId::new("Insurance_Vault"),
            receiver: AccountId::new(receiver),
            amount: Decimal::from(amount),
            policy_details: PolicyDetails::new(),
        }
    }

    fn spawn() -> LedgerHandle {
        spawn_ledger_actor(Ledger::new(), 16, Metrics::new().unwrap())
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn();
        assert_eq!(handle.chain().await.unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_caller_protocol() {
        let handle = spawn();

        let next = handle.add_transaction(submission("Alice", 100)).await.unwrap();
        assert_eq!(next, 2);
        assert_eq!(handle.pending().await.unwrap().len(), 1);

        let previous_hash = handle.last_block().await.unwrap().digest();
        let block = handle.create_block(200, previous_hash).await.unwrap();
        assert_eq!(block.index(), 2);
        assert_eq!(block.transactions().len(), 1);
        assert!(handle.pending().await.unwrap().is_empty());
        assert!(handle.validate_chain().await.unwrap());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_rejects_invalid_submission() {
        let handle = spawn();

        let result = handle.submit_and_seal(submission("", 10), 200).await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(handle.chain().await.unwrap().len(), 1);
        assert_eq!(handle.metrics().transactions_rejected.get(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_policy_enforces_issuance_rules() {
        let handle = spawn();
        let issuance = IssuanceConfig::default();

        let err = handle
            .issue_policy(&issuance, "Alice", Decimal::new(999, 2), PolicyType::FlightDelay, 200)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(handle.chain().await.unwrap().len(), 1);

        let err = handle
            .issue_policy(&issuance, "  ", Decimal::ONE_HUNDRED, PolicyType::CryptoTheft, 200)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(handle.chain().await.unwrap().len(), 1);
        assert!(handle.pending().await.unwrap().is_empty());
        assert_eq!(handle.metrics().transactions_rejected.get(), 2);

        let block = handle
            .issue_policy(&issuance, "Alice", Decimal::TEN, PolicyType::CropInsurance, 200)
            .await
            .unwrap();
        assert_eq!(block.index(), 2);
        let tx = &block.transactions()[0];
        assert_eq!(tx.sender().as_str(), "Insurance_Vault");
        assert_eq!(tx.receiver().as_str(), "Alice");
        assert_eq!(tx.amount(), Decimal::TEN);
        assert_eq!(handle.chain().await.unwrap().len(), 2);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_reset() {
        let handle = spawn();
        handle.submit_and_seal(submission("Alice", 10), 200).await.unwrap();
        handle.add_transaction(submission("Bob", 10)).await.unwrap();

        handle.reset().await.unwrap();

        assert_eq!(handle.chain().await.unwrap().len(), 1);
        assert!(handle.pending().await.unwrap().is_empty());
        assert_eq!(handle.metrics().chain_length.get(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_after_shutdown() {
        let handle = spawn();
        handle.shutdown().await.unwrap();

        // Give the actor a chance to drop its mailbox
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let err = handle.chain().await.unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }
}
