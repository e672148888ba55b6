use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use feriabot_types::{PendingCorrection, ProcessedTransaction};

/// In-memory, per-sender, single-slot cache of the latest suggestion
/// awaiting a type correction.
///
/// Expiry is a wall-clock comparison done lazily on read; `sweep` exists
/// only to bound memory and is never needed for correctness. Entries do not
/// survive a restart, which is acceptable at a TTL of minutes — the vendor
/// just resends.
///
/// Concurrent messages from the same sender race on the slot with
/// last-write-wins semantics; this is accepted for a human-paced chat.
pub struct PendingStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, PendingCorrection>>,
}

impl PendingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores a suggestion for the sender, replacing any existing one.
    /// `committed_id` links the window to an already-committed transaction.
    pub fn put(
        &self,
        sender: &str,
        suggestion: &ProcessedTransaction,
        committed_id: Option<i64>,
    ) {
        self.put_at(sender, suggestion, committed_id, Utc::now());
    }

    fn put_at(
        &self,
        sender: &str,
        suggestion: &ProcessedTransaction,
        committed_id: Option<i64>,
        now: DateTime<Utc>,
    ) {
        let pending = PendingCorrection {
            sender: sender.to_string(),
            kind: suggestion.kind,
            amount: suggestion.amount,
            description: suggestion.description.clone(),
            suggested_at: now,
            expires_at: now + self.ttl,
            committed_id,
        };

        let mut entries = self.entries.lock().unwrap();
        entries.insert(sender.to_string(), pending);
    }

    /// Returns the sender's pending correction, deleting and returning None
    /// when it has expired.
    pub fn get(&self, sender: &str) -> Option<PendingCorrection> {
        self.get_at(sender, Utc::now())
    }

    fn get_at(&self, sender: &str, now: DateTime<Utc>) -> Option<PendingCorrection> {
        let mut entries = self.entries.lock().unwrap();

        let expired = entries
            .get(sender)
            .map_or(false, |pending| pending.is_expired(now));
        if expired {
            entries.remove(sender);
            tracing::debug!(sender, "pending correction expired");
            return None;
        }

        entries.get(sender).cloned()
    }

    pub fn remove(&self, sender: &str) -> Option<PendingCorrection> {
        self.entries.lock().unwrap().remove(sender)
    }

    pub fn has(&self, sender: &str) -> bool {
        self.get(sender).is_some()
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, pending| !pending.is_expired(now));
        before - entries.len()
    }
}
