use async_trait::async_trait;
use feriabot_types::{NewTransaction, ProcessedTransaction, Transaction, TransactionType};

use crate::errors::{ClassifyError, StoreError, TransportError};

/// The "understand financial intent" oracle. Advisory only: implementations
/// never write state, and confidence is the only signal the confirmation
/// flow branches on.
#[async_trait]
pub trait TransactionClassifier: Send + Sync {
    /// Best-guess transaction from colloquial Spanish text, or None when no
    /// financial intent is found.
    async fn classify_text(
        &self,
        text: &str,
    ) -> Result<Option<ProcessedTransaction>, ClassifyError>;

    /// Best-guess transaction from a ticket photo, or None when no purchase
    /// or sale information is extractable.
    async fn classify_image(
        &self,
        image: &[u8],
    ) -> Result<Option<ProcessedTransaction>, ClassifyError>;

    /// Spanish transcript of a voice note, or None when transcription came
    /// back empty. Callers degrade gracefully on None.
    async fn transcribe_audio(&self, audio: &[u8]) -> Result<Option<String>, ClassifyError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;

    /// Changes only the kind of an existing row. Returns false when no row
    /// with that id exists.
    async fn update_kind(&self, id: i64, new_kind: TransactionType) -> Result<bool, StoreError>;

    async fn list_by_sender(&self, sender: &str) -> Result<Vec<Transaction>, StoreError>;

    /// Case-insensitive description substring search, newest first,
    /// optionally filtered by kind.
    async fn search(
        &self,
        sender: &str,
        term: &str,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, StoreError>;
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), TransportError>;

    async fn fetch_media(&self, media_ref: &str) -> Result<Vec<u8>, TransportError>;
}
