use std::sync::Arc;

use chrono::Utc;
use feriabot_types::{InboundMessage, MessageKind};
use rust_decimal::Decimal;

use crate::balance;
use crate::confirm::ConfirmationFlow;
use crate::errors::ProcessError;
use crate::keywords::{self, SearchPatterns, SearchQuery};
use crate::pending::PendingStore;
use crate::replies;
use crate::traits::{Messenger, TransactionClassifier, TransactionStore};

/// Dispatches each inbound message to the correction flow, a command
/// handler, or the classification pipeline. One router instance is shared
/// by all senders; everything per-sender lives in the pending store.
pub struct MessageRouter {
    classifier: Arc<dyn TransactionClassifier>,
    store: Arc<dyn TransactionStore>,
    messenger: Arc<dyn Messenger>,
    pending: Arc<PendingStore>,
    flow: ConfirmationFlow,
    search: SearchPatterns,
}

impl MessageRouter {
    pub fn new(
        classifier: Arc<dyn TransactionClassifier>,
        store: Arc<dyn TransactionStore>,
        messenger: Arc<dyn Messenger>,
        pending: Arc<PendingStore>,
        low_balance_threshold: Decimal,
    ) -> Self {
        let flow = ConfirmationFlow::new(
            store.clone(),
            messenger.clone(),
            pending.clone(),
            low_balance_threshold,
        );

        Self {
            classifier,
            store,
            messenger,
            pending,
            flow,
            search: SearchPatterns::new(),
        }
    }

    /// Message-processing boundary: every collaborator failure is caught
    /// here, logged, and turned into a friendly fallback reply. Nothing
    /// propagates to the transport layer.
    pub async fn handle(&self, message: &InboundMessage) {
        match self.process(message).await {
            Ok(()) => {}
            Err(ProcessError::Transport(error)) => {
                // Replies are not retried by the core; if we cannot reach
                // the vendor there is nothing more to surface.
                tracing::error!(
                    message_id = %message.message_id,
                    sender = %message.sender,
                    %error,
                    "transport failure, aborting message"
                );
            }
            Err(ProcessError::Classify(error)) => {
                tracing::error!(
                    message_id = %message.message_id,
                    sender = %message.sender,
                    %error,
                    "classification failure"
                );
                self.try_send(&message.sender, replies::classifier_unavailable())
                    .await;
            }
            Err(ProcessError::Store(error)) => {
                tracing::error!(
                    message_id = %message.message_id,
                    sender = %message.sender,
                    %error,
                    "store failure"
                );
                self.try_send(&message.sender, replies::store_failed()).await;
            }
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<(), ProcessError> {
        match message.kind {
            MessageKind::Text => {
                let Some(text) = message.text.as_deref() else {
                    tracing::warn!(message_id = %message.message_id, "text message without body");
                    return Ok(());
                };
                self.process_text(&message.sender, text).await
            }
            MessageKind::Audio => self.process_audio(message).await,
            MessageKind::Image => self.process_image(message).await,
        }
    }

    /// Priority dispatch for plain text (and transcribed audio).
    async fn process_text(&self, sender: &str, text: &str) -> Result<(), ProcessError> {
        if let Some(new_kind) = keywords::correction_keyword(text) {
            if self.pending.has(sender) {
                return self.flow.apply_correction(sender, new_kind).await;
            }
            // No window open: the bare keyword carries no amount, so it
            // falls through and the classifier will shrug at it.
        }

        if keywords::is_greeting(text) {
            self.messenger.send(sender, replies::welcome()).await?;
            return Ok(());
        }

        if let Some(query) = self.search.parse(text) {
            return self.handle_search(sender, query).await;
        }

        if keywords::is_balance_inquiry(text) {
            return self.handle_balance_inquiry(sender).await;
        }

        match self.classifier.classify_text(text).await? {
            Some(suggestion) => self.flow.handle_classified(sender, suggestion).await,
            None => {
                self.messenger
                    .send(sender, replies::unintelligible_text())
                    .await?;
                Ok(())
            }
        }
    }

    async fn process_audio(&self, message: &InboundMessage) -> Result<(), ProcessError> {
        let Some(bytes) = self.fetch_media(message).await? else {
            return Ok(());
        };

        match self.classifier.transcribe_audio(&bytes).await? {
            Some(text) => {
                tracing::info!(sender = %message.sender, transcript = %text, "voice note transcribed");
                self.process_text(&message.sender, &text).await
            }
            None => {
                self.messenger
                    .send(&message.sender, replies::unintelligible_audio())
                    .await?;
                Ok(())
            }
        }
    }

    async fn process_image(&self, message: &InboundMessage) -> Result<(), ProcessError> {
        let Some(bytes) = self.fetch_media(message).await? else {
            return Ok(());
        };

        match self.classifier.classify_image(&bytes).await? {
            Some(suggestion) => self.flow.handle_classified(&message.sender, suggestion).await,
            None => {
                self.messenger
                    .send(&message.sender, replies::unreadable_ticket())
                    .await?;
                Ok(())
            }
        }
    }

    /// Downloads the message's media. A failed download is reported to the
    /// sender and ends processing without propagating: the media id is only
    /// valid for a retry from their side anyway.
    async fn fetch_media(&self, message: &InboundMessage) -> Result<Option<Vec<u8>>, ProcessError> {
        let Some(media_ref) = message.media_ref.as_deref() else {
            tracing::warn!(message_id = %message.message_id, "media message without media id");
            return Ok(None);
        };

        match self.messenger.fetch_media(media_ref).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) => {
                tracing::warn!(
                    message_id = %message.message_id,
                    sender = %message.sender,
                    %error,
                    "media download failed"
                );
                self.messenger
                    .send(&message.sender, replies::media_download_failed())
                    .await?;
                Ok(None)
            }
        }
    }

    async fn handle_search(&self, sender: &str, query: SearchQuery) -> Result<(), ProcessError> {
        let matches = self
            .store
            .search(sender, &query.term, Some(query.kind))
            .await?;

        tracing::info!(sender, term = %query.term, hits = matches.len(), "transaction search");

        self.messenger
            .send(sender, &replies::search_results(&query.term, query.kind, &matches))
            .await?;

        Ok(())
    }

    async fn handle_balance_inquiry(&self, sender: &str) -> Result<(), ProcessError> {
        let transactions = self.store.list_by_sender(sender).await?;

        let now = Utc::now();
        let summary = balance::aggregate(sender, &transactions, now);
        let average = balance::daily_expense_average(&transactions, now);
        let estimate = balance::cash_flow_estimate(&summary, average);

        self.messenger
            .send(sender, &replies::balance_summary(&summary, &estimate))
            .await?;

        Ok(())
    }

    async fn try_send(&self, sender: &str, body: &str) {
        if let Err(error) = self.messenger.send(sender, body).await {
            tracing::error!(sender, %error, "could not deliver fallback reply");
        }
    }
}
