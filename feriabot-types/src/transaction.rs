use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction kinds understood by the bookkeeping flow.
///
/// The wire and storage encoding is the Spanish word the vendors themselves
/// use ("venta" / "gasto" / "ajuste"); `as_str` and `parse` are the only
/// mapping between the enum and that encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "venta")]
    Sale,
    #[serde(rename = "gasto")]
    Expense,
    #[serde(rename = "ajuste")]
    CashAdjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "venta",
            TransactionType::Expense => "gasto",
            TransactionType::CashAdjustment => "ajuste",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "venta" => Some(TransactionType::Sale),
            "gasto" => Some(TransactionType::Expense),
            "ajuste" => Some(TransactionType::CashAdjustment),
            _ => None,
        }
    }

    /// Uppercase label used in replies to the vendor.
    pub fn label_es(&self) -> &'static str {
        match self {
            TransactionType::Sale => "VENTA",
            TransactionType::Expense => "GASTO",
            TransactionType::CashAdjustment => "AJUSTE DE CAJA",
        }
    }
}

/// A persisted transaction, as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub sender: String,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A transaction about to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub sender: String,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
}

/// Classifier output for one message. Never persisted as-is.
///
/// Adjustments may carry a negative amount (cash withdrawals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub confidence: f32,
}

/// A suggestion awaiting a yes/no-style type correction from the sender.
///
/// `committed_id` is present when the suggestion was confident enough to be
/// committed immediately and the correction window merely allows flipping
/// the type of that row.
#[derive(Debug, Clone)]
pub struct PendingCorrection {
    pub sender: String,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub suggested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub committed_id: Option<i64>,
}

impl PendingCorrection {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Derived balance for one sender, recomputed from the full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub sender: String,
    pub current_balance: Decimal,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub total_adjustments: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// How long the cash in the till will last at the recent spending pace.
///
/// `days_left` is None when either the balance or the spending average is
/// non-positive, i.e. there is nothing meaningful to project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowEstimate {
    pub daily_average: Decimal,
    pub days_left: Option<Decimal>,
}
