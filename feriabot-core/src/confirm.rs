use std::sync::Arc;

use chrono::Utc;
use feriabot_types::{Balance, NewTransaction, ProcessedTransaction, TransactionType};
use rust_decimal::Decimal;

use crate::balance;
use crate::errors::ProcessError;
use crate::pending::PendingStore;
use crate::replies;
use crate::traits::{Messenger, TransactionStore};

/// Suggestions at or above this confidence are committed immediately, with
/// the correction window left open; anything below only opens the window.
pub const AUTO_COMMIT_CONFIDENCE: f32 = 0.8;

/// The confidence-gated confirmation/correction flow.
///
/// Per sender this is a two-state machine: idle, or awaiting a correction
/// for the single pending suggestion held in [`PendingStore`]. Expiry of
/// the pending slot returns the sender to idle with no side effects.
pub struct ConfirmationFlow {
    store: Arc<dyn TransactionStore>,
    messenger: Arc<dyn Messenger>,
    pending: Arc<PendingStore>,
    low_balance_threshold: Decimal,
}

impl ConfirmationFlow {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        messenger: Arc<dyn Messenger>,
        pending: Arc<PendingStore>,
        low_balance_threshold: Decimal,
    ) -> Self {
        Self {
            store,
            messenger,
            pending,
            low_balance_threshold,
        }
    }

    /// Entry point for a freshly classified transaction.
    pub async fn handle_classified(
        &self,
        sender: &str,
        suggestion: ProcessedTransaction,
    ) -> Result<(), ProcessError> {
        if suggestion.confidence >= AUTO_COMMIT_CONFIDENCE {
            self.commit_with_correction_window(sender, suggestion).await
        } else {
            self.ask_for_clarification(sender, suggestion).await
        }
    }

    async fn commit_with_correction_window(
        &self,
        sender: &str,
        suggestion: ProcessedTransaction,
    ) -> Result<(), ProcessError> {
        let transaction = self
            .store
            .create(NewTransaction {
                sender: sender.to_string(),
                kind: suggestion.kind,
                amount: suggestion.amount,
                description: suggestion.description.clone(),
            })
            .await?;

        tracing::info!(sender, id = transaction.id, kind = suggestion.kind.as_str(), "transaction committed");

        let balance = self.balance_for(sender).await?;
        let mut reply = replies::transaction_registered(
            suggestion.kind,
            suggestion.amount,
            &suggestion.description,
            &balance,
        );
        self.append_alert_if_low(&balance, &mut reply);

        self.messenger.send(sender, &reply).await?;

        // The window opens only once the vendor has seen the confirmation.
        self.pending.put(sender, &suggestion, Some(transaction.id));

        Ok(())
    }

    async fn ask_for_clarification(
        &self,
        sender: &str,
        suggestion: ProcessedTransaction,
    ) -> Result<(), ProcessError> {
        tracing::info!(
            sender,
            confidence = suggestion.confidence,
            "low confidence, deferring commit"
        );

        self.pending.put(sender, &suggestion, None);
        self.messenger
            .send(sender, &replies::clarification_request(&suggestion))
            .await?;

        Ok(())
    }

    /// Applies a correction keyword. In-place type update when the pending
    /// entry references a committed row; otherwise the deferred suggestion
    /// is committed now under the corrected type.
    ///
    /// The pending entry is removed only after the store call succeeds, so
    /// a store failure leaves the window open for a retry.
    pub async fn apply_correction(
        &self,
        sender: &str,
        new_kind: TransactionType,
    ) -> Result<(), ProcessError> {
        let Some(pending) = self.pending.get(sender) else {
            self.messenger
                .send(sender, replies::no_pending_correction())
                .await?;
            return Ok(());
        };

        if let Some(id) = pending.committed_id {
            let updated = self.store.update_kind(id, new_kind).await?;
            if !updated {
                // The row is gone; nothing to correct anymore.
                tracing::warn!(sender, id, "pending correction references a missing row");
                self.pending.remove(sender);
                self.messenger
                    .send(sender, replies::no_pending_correction())
                    .await?;
                return Ok(());
            }
            tracing::info!(sender, id, new_kind = new_kind.as_str(), "transaction corrected in place");
        } else {
            self.store
                .create(NewTransaction {
                    sender: sender.to_string(),
                    kind: new_kind,
                    amount: pending.amount,
                    description: pending.description.clone(),
                })
                .await?;
            tracing::info!(sender, new_kind = new_kind.as_str(), "deferred suggestion committed with corrected type");
        }

        self.pending.remove(sender);

        let balance = self.balance_for(sender).await?;
        let mut reply =
            replies::correction_applied(new_kind, pending.amount, &pending.description, &balance);
        self.append_alert_if_low(&balance, &mut reply);

        self.messenger.send(sender, &reply).await?;

        Ok(())
    }

    pub async fn balance_for(&self, sender: &str) -> Result<Balance, ProcessError> {
        let transactions = self.store.list_by_sender(sender).await?;
        Ok(balance::aggregate(sender, &transactions, Utc::now()))
    }

    fn append_alert_if_low(&self, balance: &Balance, reply: &mut String) {
        if balance.current_balance < self.low_balance_threshold {
            reply.push_str(&replies::low_balance_alert(balance));
        }
    }
}
