use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // The UNIQUE constraint on reference is the authoritative duplicate
    // guard for webhook ingestion.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            received_date VARCHAR NOT NULL,
            received_time VARCHAR NOT NULL,
            sender VARCHAR NOT NULL DEFAULT 'S/D',
            amount VARCHAR NOT NULL,
            reference VARCHAR NOT NULL UNIQUE,
            full_message TEXT,
            bank VARCHAR NOT NULL,
            state VARCHAR NOT NULL DEFAULT 'FREE' CHECK (state IN ('FREE', 'REDEEMED')),
            order_code VARCHAR,
            redeemed_at VARCHAR,
            redeemed_ip VARCHAR,
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Indexes for the admin listing and state filters
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_state ON payments(state)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_created_at ON payments(created_at)",
        [],
    )?;

    Ok(())
}
