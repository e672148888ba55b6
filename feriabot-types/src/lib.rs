pub mod message;
pub mod transaction;

pub use message::{InboundMessage, MessageKind};
pub use transaction::{
    Balance, CashFlowEstimate, NewTransaction, PendingCorrection, ProcessedTransaction,
    Transaction, TransactionType,
};
