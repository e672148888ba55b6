use crate::database::AsyncDbConnection;
use anyhow::Result;
use chrono::{DateTime, Utc};
use feriabot_types::{NewTransaction, Transaction, TransactionType};
use rusqlite::{params, Row};
use rust_decimal::Decimal;

/// Amounts are persisted as canonical decimal strings; money never touches
/// a binary float on its way in or out of SQLite.
fn map_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(2)?;
    let kind = TransactionType::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown transaction kind: {kind_str}").into(),
        )
    })?;

    let amount_str: String = row.get(3)?;
    let amount: Decimal = amount_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("invalid amount '{amount_str}': {e}").into(),
        )
    })?;

    let created_at: i64 = row.get(5)?;
    let updated_at: Option<i64> = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        sender: row.get(1)?,
        kind,
        amount,
        description: row.get(4)?,
        created_at: timestamp_to_datetime(created_at),
        updated_at: updated_at.map(timestamp_to_datetime),
    })
}

fn timestamp_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

pub async fn insert_transaction(
    conn: AsyncDbConnection,
    transaction: &NewTransaction,
) -> Result<Transaction> {
    let conn = conn.lock().await?;
    let now = Utc::now();

    let id: i64 = conn.query_row(
        "INSERT INTO transactions (sender, kind, amount, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
        params![
            &transaction.sender,
            transaction.kind.as_str(),
            transaction.amount.to_string(),
            &transaction.description,
            now.timestamp_millis(),
        ],
        |row| row.get(0),
    )?;

    Ok(Transaction {
        id,
        sender: transaction.sender.clone(),
        kind: transaction.kind,
        amount: transaction.amount,
        description: transaction.description.clone(),
        created_at: now,
        updated_at: None,
    })
}

/// Changes only the kind column. Returns false when the id does not exist.
pub async fn update_transaction_kind(
    conn: AsyncDbConnection,
    id: i64,
    new_kind: TransactionType,
) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = Utc::now().timestamp_millis();

    let updated = conn.execute(
        "UPDATE transactions SET kind = ?1, updated_at = ?2 WHERE id = ?3",
        params![new_kind.as_str(), now, id],
    )?;

    Ok(updated > 0)
}

pub async fn list_transactions_by_sender(
    conn: AsyncDbConnection,
    sender: &str,
) -> Result<Vec<Transaction>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT id, sender, kind, amount, description, created_at, updated_at
            FROM transactions
            WHERE sender = ?1
            ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map([sender], map_row)?;

    let mut transactions = Vec::new();
    for row_result in rows {
        transactions.push(row_result?);
    }

    Ok(transactions)
}

/// Case-insensitive description substring search, newest first, optionally
/// filtered by kind.
pub async fn search_transactions(
    conn: AsyncDbConnection,
    sender: &str,
    term: &str,
    kind: Option<TransactionType>,
) -> Result<Vec<Transaction>> {
    let conn = conn.lock().await?;
    let pattern = format!("%{}%", term.to_lowercase());

    let mut transactions = Vec::new();

    if let Some(kind) = kind {
        let mut stmt = conn.prepare(
            "SELECT id, sender, kind, amount, description, created_at, updated_at
                FROM transactions
                WHERE sender = ?1 AND LOWER(description) LIKE ?2 AND kind = ?3
                ORDER BY created_at DESC, id DESC
                LIMIT 20",
        )?;
        let rows = stmt.query_map(params![sender, pattern, kind.as_str()], map_row)?;
        for row_result in rows {
            transactions.push(row_result?);
        }
    } else {
        let mut stmt = conn.prepare(
            "SELECT id, sender, kind, amount, description, created_at, updated_at
                FROM transactions
                WHERE sender = ?1 AND LOWER(description) LIKE ?2
                ORDER BY created_at DESC, id DESC
                LIMIT 20",
        )?;
        let rows = stmt.query_map(params![sender, pattern], map_row)?;
        for row_result in rows {
            transactions.push(row_result?);
        }
    }

    Ok(transactions)
}
