use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender VARCHAR NOT NULL,
            kind VARCHAR NOT NULL CHECK (kind IN ('venta', 'gasto', 'ajuste')),
            amount VARCHAR NOT NULL,
            description VARCHAR NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_sender
            ON transactions (sender, created_at)",
        [],
    )?;

    Ok(())
}
