//! Submission and confirmation of built transactions.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use solana_sdk::signature::Signature;

use crate::builder::BuiltTransaction;
use crate::error::{LedgerError, SettlementError};
use crate::ledger::{Ledger, TxFailure, TxStatus};
use crate::mirror::{Mirror, MirrorUpdate};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SettlementBridge<L: ?Sized> {
    ledger: Arc<L>,
    mirror: Option<Arc<dyn Mirror>>,
    poll_interval: Duration,
}

impl<L: Ledger + ?Sized> SettlementBridge<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            mirror: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn Mirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Submit `built` and wait up to `timeout` for confirmation.
    ///
    /// On `TimedOut` the transaction may still land; callers must re-query
    /// state before retrying. The mirror is only told about confirmed
    /// transactions, and never holds up the result.
    pub async fn settle(
        &self,
        built: &BuiltTransaction,
        timeout: Duration,
    ) -> Result<Signature, SettlementError> {
        let signature = self
            .ledger
            .submit(&built.payer, &built.instructions)
            .await?;
        info!("Submitted {:?} as {}", built.intent, signature);

        match tokio::time::timeout(timeout, self.await_confirmation(&signature)).await {
            Ok(Ok(())) => {
                info!("Confirmed {}", signature);
                self.notify_mirror(built, signature);
                Ok(signature)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(
                    "No confirmation for {} within {:?}; outcome unknown",
                    signature, timeout
                );
                Err(SettlementError::TimedOut { signature })
            }
        }
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<(), SettlementError> {
        loop {
            match self.ledger.signature_status(signature).await {
                Ok(Some(TxStatus::Confirmed)) => return Ok(()),
                Ok(Some(TxStatus::Failed(TxFailure::Program(kind)))) => {
                    return Err(SettlementError::Rejected(kind))
                }
                Ok(Some(TxStatus::Failed(TxFailure::Other(reason)))) => {
                    return Err(SettlementError::Ledger(LedgerError::Failed(reason)))
                }
                Ok(None) => {}
                // Keep polling; the deadline bounds transient transport errors
                Err(err) => warn!("Status query for {} failed: {}", signature, err),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn notify_mirror(&self, built: &BuiltTransaction, signature: Signature) {
        let Some(mirror) = self.mirror.clone() else {
            return;
        };
        let Some(update) = MirrorUpdate::from_intent(&built.intent, signature) else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = mirror.record(&update).await {
                warn!(
                    "Mirror update for {} failed, on-chain state is unaffected: {}",
                    signature, err
                );
            }
        });
    }
}
