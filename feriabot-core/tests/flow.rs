//! End-to-end tests of the router and confirmation flow over in-memory
//! collaborators.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use feriabot_core::errors::{ClassifyError, StoreError, TransportError};
use feriabot_core::{
    ConfirmationFlow, MessageRouter, Messenger, PendingStore, TransactionClassifier,
    TransactionStore,
};
use feriabot_types::{
    InboundMessage, NewTransaction, ProcessedTransaction, Transaction, TransactionType,
};
use rust_decimal::Decimal;

#[derive(Default)]
struct MockStore {
    rows: Mutex<Vec<Transaction>>,
    next_id: AtomicI64,
    fail_updates: AtomicBool,
}

impl MockStore {
    fn rows(&self) -> Vec<Transaction> {
        self.rows.lock().unwrap().clone()
    }

    fn seed(&self, kind: TransactionType, amount: &str, description: &str) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().unwrap().push(Transaction {
            id,
            sender: SENDER.to_string(),
            kind,
            amount: amount.parse().unwrap(),
            description: description.to_string(),
            created_at: Utc::now() - Duration::minutes(id),
            updated_at: None,
        });
    }
}

#[async_trait]
impl TransactionStore for MockStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = Transaction {
            id,
            sender: transaction.sender,
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_kind(&self, id: i64, new_kind: TransactionType) -> Result<bool, StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection lost".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.kind = new_kind;
                row.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_sender(&self, sender: &str) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.sender == sender)
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        sender: &str,
        term: &str,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let term = term.to_lowercase();
        let mut matches: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.sender == sender
                    && row.description.to_lowercase().contains(&term)
                    && kind.map_or(true, |k| row.kind == k)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }
}

#[derive(Default)]
struct MockMessenger {
    sent: Mutex<Vec<(String, String)>>,
    fail_media: AtomicBool,
}

impl MockMessenger {
    fn last_reply(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, body)| body.clone())
            .unwrap_or_default()
    }

    fn reply_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, to: &str, body: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }

    async fn fetch_media(&self, _media_ref: &str) -> Result<Vec<u8>, TransportError> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(TransportError::Http("download failed".to_string()));
        }
        Ok(vec![0xFF, 0xD8])
    }
}

#[derive(Default)]
struct StubClassifier {
    text_result: Mutex<Option<ProcessedTransaction>>,
    image_result: Mutex<Option<ProcessedTransaction>>,
    transcript: Mutex<Option<String>>,
}

#[async_trait]
impl TransactionClassifier for StubClassifier {
    async fn classify_text(
        &self,
        _text: &str,
    ) -> Result<Option<ProcessedTransaction>, ClassifyError> {
        Ok(self.text_result.lock().unwrap().clone())
    }

    async fn classify_image(
        &self,
        _image: &[u8],
    ) -> Result<Option<ProcessedTransaction>, ClassifyError> {
        Ok(self.image_result.lock().unwrap().clone())
    }

    async fn transcribe_audio(&self, _audio: &[u8]) -> Result<Option<String>, ClassifyError> {
        Ok(self.transcript.lock().unwrap().clone())
    }
}

const SENDER: &str = "5215512345678";

struct Harness {
    classifier: Arc<StubClassifier>,
    store: Arc<MockStore>,
    messenger: Arc<MockMessenger>,
    pending: Arc<PendingStore>,
    router: MessageRouter,
}

fn harness_with_threshold(threshold: &str) -> Harness {
    let classifier = Arc::new(StubClassifier::default());
    let store = Arc::new(MockStore::default());
    let messenger = Arc::new(MockMessenger::default());
    let pending = Arc::new(PendingStore::new(Duration::seconds(120)));

    let router = MessageRouter::new(
        classifier.clone(),
        store.clone(),
        messenger.clone(),
        pending.clone(),
        threshold.parse().unwrap(),
    );

    Harness {
        classifier,
        store,
        messenger,
        pending,
        router,
    }
}

fn harness() -> Harness {
    // Threshold low enough that no test trips the alert by accident.
    harness_with_threshold("-1000000")
}

fn sale_suggestion(confidence: f32) -> ProcessedTransaction {
    ProcessedTransaction {
        kind: TransactionType::Sale,
        amount: "45.00".parse().unwrap(),
        description: "3 refrescos".to_string(),
        confidence,
    }
}

#[tokio::test]
async fn high_confidence_commits_and_opens_correction_window() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.95));

    let message = InboundMessage::text("m1", SENDER, "Vendí 3 refrescos a 15 pesos cada uno");
    h.router.handle(&message).await;

    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, TransactionType::Sale);
    assert_eq!(rows[0].amount, "45.00".parse::<Decimal>().unwrap());
    assert!(rows[0].description.contains("refrescos"));

    let reply = h.messenger.last_reply();
    assert!(reply.contains("Registré VENTA de $45.00"));
    assert!(reply.contains("Total ventas: $45.00"));

    let pending = h.pending.get(SENDER).unwrap();
    assert_eq!(pending.committed_id, Some(rows[0].id));
}

#[tokio::test]
async fn low_confidence_defers_commit() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.5));

    let message = InboundMessage::text("m1", SENDER, "45 del ticket");
    h.router.handle(&message).await;

    assert!(h.store.rows().is_empty());

    let pending = h.pending.get(SENDER).unwrap();
    assert_eq!(pending.committed_id, None);
    assert!(h.messenger.last_reply().contains("Responde: VENTA o GASTO"));
}

#[tokio::test]
async fn correction_flips_committed_type_only() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.95));
    h.router
        .handle(&InboundMessage::text("m1", SENDER, "Vendí 3 refrescos"))
        .await;

    h.router
        .handle(&InboundMessage::text("m2", SENDER, "gasto"))
        .await;

    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, TransactionType::Expense);
    assert_eq!(rows[0].amount, "45.00".parse::<Decimal>().unwrap());
    assert_eq!(rows[0].description, "3 refrescos");
    assert!(rows[0].updated_at.is_some());

    let reply = h.messenger.last_reply();
    assert!(reply.contains("Corregido a GASTO"));
    assert!(reply.contains("Total ventas: $0.00"));
    assert!(reply.contains("Total gastos: $45.00"));

    assert!(!h.pending.has(SENDER));
}

#[tokio::test]
async fn correction_without_committed_row_creates_transaction() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.5));
    h.router
        .handle(&InboundMessage::text("m1", SENDER, "45 del ticket"))
        .await;
    assert!(h.store.rows().is_empty());

    h.router
        .handle(&InboundMessage::text("m2", SENDER, "es gasto"))
        .await;

    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, TransactionType::Expense);
    assert_eq!(rows[0].amount, "45.00".parse::<Decimal>().unwrap());
    assert!(!h.pending.has(SENDER));
}

#[tokio::test]
async fn correction_with_nothing_pending_replies_and_does_nothing() {
    let h = harness();
    let flow = ConfirmationFlow::new(
        h.store.clone(),
        h.messenger.clone(),
        h.pending.clone(),
        Decimal::ZERO,
    );

    flow.apply_correction(SENDER, TransactionType::Expense)
        .await
        .unwrap();

    assert!(h.store.rows().is_empty());
    assert!(h.messenger.last_reply().contains("No hay transacciones pendientes"));
}

#[tokio::test]
async fn failed_in_place_correction_keeps_pending_entry() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.95));
    h.router
        .handle(&InboundMessage::text("m1", SENDER, "Vendí 3 refrescos"))
        .await;

    h.store.fail_updates.store(true, Ordering::SeqCst);
    h.router
        .handle(&InboundMessage::text("m2", SENDER, "gasto"))
        .await;

    // The vendor saw a retry prompt and the window stayed open.
    assert!(h.messenger.last_reply().contains("Intenta de nuevo"));
    assert!(h.pending.has(SENDER));

    // Retry once the store is back.
    h.store.fail_updates.store(false, Ordering::SeqCst);
    h.router
        .handle(&InboundMessage::text("m3", SENDER, "gasto"))
        .await;

    assert_eq!(h.store.rows()[0].kind, TransactionType::Expense);
    assert!(!h.pending.has(SENDER));
}

#[tokio::test]
async fn unrelated_message_leaves_pending_untouched() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.5));
    h.router
        .handle(&InboundMessage::text("m1", SENDER, "45 del ticket"))
        .await;
    assert!(h.pending.has(SENDER));

    *h.classifier.text_result.lock().unwrap() = None;
    h.router
        .handle(&InboundMessage::text("m2", SENDER, "qué onda"))
        .await;

    // Still correctable after the interleaved message.
    assert!(h.pending.has(SENDER));
    h.router
        .handle(&InboundMessage::text("m3", SENDER, "venta"))
        .await;
    assert_eq!(h.store.rows().len(), 1);
    assert_eq!(h.store.rows()[0].kind, TransactionType::Sale);
}

#[tokio::test]
async fn balance_inquiry_with_no_history_reports_zero() {
    let h = harness();

    h.router
        .handle(&InboundMessage::text("m1", SENDER, "¿cuánto tengo?"))
        .await;

    let reply = h.messenger.last_reply();
    assert!(reply.contains("Saldo actual: $0.00"));
    assert!(h.store.rows().is_empty());
}

#[tokio::test]
async fn search_totals_matching_expenses() {
    let h = harness();
    h.store.seed(TransactionType::Expense, "500.00", "mercancía del proveedor");
    h.store.seed(TransactionType::Expense, "300.50", "más mercancía");
    h.store.seed(TransactionType::Sale, "999.00", "venta de mercancía");

    h.router
        .handle(&InboundMessage::text("m1", SENDER, "cuánto gasté en mercancía"))
        .await;

    let reply = h.messenger.last_reply();
    assert!(reply.contains("$800.50"));
    assert!(reply.contains("2 movimiento(s)"));
}

#[tokio::test]
async fn greeting_gets_instructions_not_classification() {
    let h = harness();
    // Would commit if the pipeline ran; the greeting must win.
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.95));

    h.router
        .handle(&InboundMessage::text("m1", SENDER, "hola"))
        .await;

    assert!(h.store.rows().is_empty());
    assert!(h.messenger.last_reply().contains("asistente de cuentas"));
}

#[tokio::test]
async fn audio_is_transcribed_then_routed() {
    let h = harness();
    *h.classifier.transcript.lock().unwrap() = Some("vendí 3 refrescos a 15".to_string());
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.95));

    h.router
        .handle(&InboundMessage::media(
            "m1",
            SENDER,
            feriabot_types::MessageKind::Audio,
            "media-123",
        ))
        .await;

    assert_eq!(h.store.rows().len(), 1);
    assert!(h.messenger.last_reply().contains("Registré VENTA"));
}

#[tokio::test]
async fn failed_transcription_prompts_for_text() {
    let h = harness();
    *h.classifier.transcript.lock().unwrap() = None;

    h.router
        .handle(&InboundMessage::media(
            "m1",
            SENDER,
            feriabot_types::MessageKind::Audio,
            "media-123",
        ))
        .await;

    assert!(h.messenger.last_reply().contains("audio"));
    assert!(h.store.rows().is_empty());
}

#[tokio::test]
async fn ticket_image_flows_through_confirmation() {
    let h = harness();
    *h.classifier.image_result.lock().unwrap() = Some(ProcessedTransaction {
        kind: TransactionType::Expense,
        amount: "350.00".parse().unwrap(),
        description: "ticket OXXO".to_string(),
        confidence: 0.4,
    });

    h.router
        .handle(&InboundMessage::media(
            "m1",
            SENDER,
            feriabot_types::MessageKind::Image,
            "media-456",
        ))
        .await;

    // Low confidence image: clarification, no commit.
    assert!(h.store.rows().is_empty());
    assert!(h.pending.has(SENDER));
    assert!(h.messenger.last_reply().contains("VENTA o GASTO"));
}

#[tokio::test]
async fn failed_media_download_reports_and_stops() {
    let h = harness();
    h.messenger.fail_media.store(true, Ordering::SeqCst);

    h.router
        .handle(&InboundMessage::media(
            "m1",
            SENDER,
            feriabot_types::MessageKind::Image,
            "media-456",
        ))
        .await;

    assert_eq!(h.messenger.reply_count(), 1);
    assert!(h.messenger.last_reply().contains("No pude descargar"));
}

#[tokio::test]
async fn low_balance_alert_appends_after_commit() {
    let h = harness_with_threshold("500");
    *h.classifier.text_result.lock().unwrap() = Some(ProcessedTransaction {
        kind: TransactionType::Expense,
        amount: "80.00".parse().unwrap(),
        description: "luz".to_string(),
        confidence: 0.9,
    });

    h.router
        .handle(&InboundMessage::text("m1", SENDER, "pagué 80 de luz"))
        .await;

    let reply = h.messenger.last_reply();
    assert!(reply.contains("Registré GASTO"));
    assert!(reply.contains("¡Aguas! Tu saldo está muy bajo"));
}

#[tokio::test]
async fn second_suggestion_replaces_first() {
    let h = harness();
    *h.classifier.text_result.lock().unwrap() = Some(sale_suggestion(0.5));
    h.router
        .handle(&InboundMessage::text("m1", SENDER, "45 del ticket"))
        .await;

    *h.classifier.text_result.lock().unwrap() = Some(ProcessedTransaction {
        kind: TransactionType::Expense,
        amount: "99.00".parse().unwrap(),
        description: "otra cosa".to_string(),
        confidence: 0.5,
    });
    h.router
        .handle(&InboundMessage::text("m2", SENDER, "99 de otra cosa"))
        .await;

    let pending = h.pending.get(SENDER).unwrap();
    assert_eq!(pending.amount, "99.00".parse::<Decimal>().unwrap());

    // Correcting now commits the latest suggestion only.
    h.router
        .handle(&InboundMessage::text("m3", SENDER, "venta"))
        .await;
    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, "99.00".parse::<Decimal>().unwrap());
}
