use async_trait::async_trait;
use feriabot_core::errors::StoreError;
use feriabot_core::TransactionStore;
use feriabot_types::{NewTransaction, Transaction, TransactionType};

use crate::database::{transactions, AsyncDbConnection};

/// SQLite-backed implementation of the core transaction store.
pub struct SqliteTransactionStore {
    conn: AsyncDbConnection,
}

impl SqliteTransactionStore {
    pub fn new(conn: AsyncDbConnection) -> Self {
        Self { conn }
    }
}

fn to_store_error(error: anyhow::Error) -> StoreError {
    StoreError::Query(error.to_string())
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        transactions::insert_transaction(self.conn.clone(), &transaction)
            .await
            .map_err(to_store_error)
    }

    async fn update_kind(&self, id: i64, new_kind: TransactionType) -> Result<bool, StoreError> {
        transactions::update_transaction_kind(self.conn.clone(), id, new_kind)
            .await
            .map_err(to_store_error)
    }

    async fn list_by_sender(&self, sender: &str) -> Result<Vec<Transaction>, StoreError> {
        transactions::list_transactions_by_sender(self.conn.clone(), sender)
            .await
            .map_err(to_store_error)
    }

    async fn search(
        &self,
        sender: &str,
        term: &str,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, StoreError> {
        transactions::search_transactions(self.conn.clone(), sender, term, kind)
            .await
            .map_err(to_store_error)
    }
}
