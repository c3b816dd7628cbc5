use crate::database::AsyncDbConnection;
use anyhow::Result;
use extractors::validation::parse_stored_amount;
use rusqlite::{params, Row};
use shared_types::{Bank, Currency, PaymentCandidate, PaymentRecord, PaymentState, PaymentTotals};

/// Search filter applied across the columns an operator actually looks
/// things up by. SQLite LIKE is case-insensitive for ASCII.
const SEARCH_CLAUSE: &str = "reference LIKE ?1 \
     OR order_code LIKE ?1 \
     OR sender LIKE ?1 \
     OR bank LIKE ?1 \
     OR amount LIKE ?1";

const RECORD_COLUMNS: &str = "id, received_date, received_time, sender, amount, reference, \
     full_message, bank, state, order_code, redeemed_at, redeemed_ip, created_at";

/// Subset of columns the verification flow needs.
pub struct PaymentMatch {
    pub id: i64,
    pub state: PaymentState,
    pub bank: String,
    pub amount: String,
    pub reference: String,
}

/// Inserts a new FREE record unless the reference already exists; the UNIQUE
/// constraint makes concurrent deliveries of the same reference idempotent.
/// Returns the new row id, or None when the reference was already present.
pub async fn insert_payment_if_absent(
    conn: AsyncDbConnection,
    candidate: &PaymentCandidate,
    received_date: &str,
    received_time: &str,
) -> Result<Option<i64>> {
    let conn = conn.lock().await;
    let now = chrono::Utc::now().timestamp();

    // Bounded storage for free-text fields
    let sender: String = candidate.sender.chars().take(50).collect();
    let message: String = candidate.raw_excerpt.chars().take(500).collect();

    let changed = conn.execute(
        "INSERT OR IGNORE INTO payments
         (received_date, received_time, sender, amount, reference, full_message, bank, state, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'FREE', ?8)",
        params![
            received_date,
            received_time,
            sender,
            candidate.amount,
            candidate.reference,
            message,
            candidate.bank.as_str(),
            now,
        ],
    )?;

    if changed == 0 {
        Ok(None)
    } else {
        Ok(Some(conn.last_insert_rowid()))
    }
}

/// Looks up records for a user-supplied reference: exactly six ASCII digits
/// are treated as a suffix, anything else requires exact equality.
pub async fn find_matches(conn: AsyncDbConnection, reference: &str) -> Result<Vec<PaymentMatch>> {
    let conn = conn.lock().await;

    let suffix_mode = reference.len() == 6 && reference.chars().all(|c| c.is_ascii_digit());

    let mut stmt;
    let rows = if suffix_mode {
        stmt = conn.prepare(
            "SELECT id, state, bank, amount, reference FROM payments WHERE reference LIKE ?1",
        )?;
        stmt.query_map([format!("%{reference}")], map_payment_match)?
    } else {
        stmt = conn.prepare(
            "SELECT id, state, bank, amount, reference FROM payments WHERE reference = ?1",
        )?;
        stmt.query_map([reference], map_payment_match)?
    };

    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }

    Ok(matches)
}

/// Conditional FREE -> REDEEMED transition, guarded on both id and prior
/// state in a single UPDATE. Returns false when the record was no longer
/// FREE by the time the update ran.
pub async fn redeem_payment(
    conn: AsyncDbConnection,
    id: i64,
    order_code: &str,
    redeemed_at: &str,
    redeemed_ip: &str,
) -> Result<bool> {
    let conn = conn.lock().await;

    let changed = conn.execute(
        "UPDATE payments
         SET state = 'REDEEMED', order_code = ?1, redeemed_at = ?2, redeemed_ip = ?3
         WHERE id = ?4 AND state = 'FREE'",
        params![order_code, redeemed_at, redeemed_ip, id],
    )?;

    Ok(changed == 1)
}

/// Unconditional reset to FREE, clearing all redemption metadata.
pub async fn release_payment(conn: AsyncDbConnection, reference: &str) -> Result<bool> {
    let conn = conn.lock().await;

    let changed = conn.execute(
        "UPDATE payments
         SET state = 'FREE', order_code = NULL, redeemed_at = NULL, redeemed_ip = NULL
         WHERE reference = ?1",
        params![reference],
    )?;

    Ok(changed > 0)
}

/// Deletion is terminal.
pub async fn delete_payment(conn: AsyncDbConnection, reference: &str) -> Result<bool> {
    let conn = conn.lock().await;

    let changed = conn.execute("DELETE FROM payments WHERE reference = ?1", params![reference])?;

    Ok(changed > 0)
}

pub async fn count_payments(conn: AsyncDbConnection, search: Option<&str>) -> Result<u64> {
    let conn = conn.lock().await;

    let count: i64 = match search {
        Some(term) => conn.query_row(
            &format!("SELECT COUNT(*) FROM payments WHERE {SEARCH_CLAUSE}"),
            [like_pattern(term)],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))?,
    };

    Ok(count as u64)
}

/// Newest-first page of records, optionally filtered by the search term.
pub async fn list_payments(
    conn: AsyncDbConnection,
    search: Option<&str>,
    limit: u32,
    offset: u64,
) -> Result<Vec<PaymentRecord>> {
    let conn = conn.lock().await;

    let mut stmt;
    let rows = match search {
        Some(term) => {
            stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM payments WHERE {SEARCH_CLAUSE} \
                 ORDER BY id DESC LIMIT ?2 OFFSET ?3"
            ))?;
            stmt.query_map(
                params![like_pattern(term), limit, offset as i64],
                map_payment_record,
            )?
        }
        None => {
            stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM payments ORDER BY id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            stmt.query_map(params![limit, offset as i64], map_payment_record)?
        }
    };

    let mut payments = Vec::new();
    for row in rows {
        payments.push(row?);
    }

    Ok(payments)
}

/// Scans every matching record and buckets amounts by the bank's currency:
/// Binance in USD, the Colombian banks in COP, everything else (including
/// unknown bank tags) in bolivars. Unparsable amounts are skipped.
pub async fn payment_totals(conn: AsyncDbConnection, search: Option<&str>) -> Result<PaymentTotals> {
    let conn = conn.lock().await;

    let mut stmt;
    let rows = match search {
        Some(term) => {
            stmt = conn.prepare(&format!(
                "SELECT amount, bank FROM payments WHERE {SEARCH_CLAUSE}"
            ))?;
            stmt.query_map([like_pattern(term)], map_amount_bank)?
        }
        None => {
            stmt = conn.prepare("SELECT amount, bank FROM payments")?;
            stmt.query_map([], map_amount_bank)?
        }
    };

    let mut totals = PaymentTotals {
        bs: 0.0,
        usd: 0.0,
        cop: 0.0,
    };

    for row in rows {
        let (amount, bank) = row?;
        let Some(value) = parse_stored_amount(&amount) else {
            continue;
        };
        match bank.parse::<Bank>().map(|b| b.currency()) {
            Ok(Currency::Usd) => totals.usd += value,
            Ok(Currency::Cop) => totals.cop += value,
            _ => totals.bs += value,
        }
    }

    Ok(totals)
}

fn like_pattern(term: &str) -> String {
    format!("%{term}%")
}

fn map_payment_match(row: &Row) -> rusqlite::Result<PaymentMatch> {
    let state: String = row.get(1)?;
    Ok(PaymentMatch {
        id: row.get(0)?,
        state: state.parse().unwrap_or(PaymentState::Free),
        bank: row.get(2)?,
        amount: row.get(3)?,
        reference: row.get(4)?,
    })
}

fn map_payment_record(row: &Row) -> rusqlite::Result<PaymentRecord> {
    let state: String = row.get(8)?;
    Ok(PaymentRecord {
        id: row.get(0)?,
        received_date: row.get(1)?,
        received_time: row.get(2)?,
        sender: row.get(3)?,
        amount: row.get(4)?,
        reference: row.get(5)?,
        full_message: row.get(6)?,
        bank: row.get(7)?,
        state: state.parse().unwrap_or(PaymentState::Free),
        order_code: row.get(9)?,
        redeemed_at: row.get(10)?,
        redeemed_ip: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn map_amount_bank(row: &Row) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&dir.path().join("payments.db")).unwrap();
        (dir, db)
    }

    fn candidate(bank: Bank, amount: &str, reference: &str) -> PaymentCandidate {
        PaymentCandidate {
            bank,
            sender: "04120001122".to_string(),
            amount: amount.to_string(),
            reference: reference.to_string(),
            raw_excerpt: format!("pago {amount} Ref: {reference}"),
        }
    }

    async fn insert(db: &Database, bank: Bank, amount: &str, reference: &str) -> Option<i64> {
        insert_payment_if_absent(
            db.async_connection.clone(),
            &candidate(bank, amount, reference),
            "05/08/2026",
            "09:15 AM",
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_reference() {
        let (_dir, db) = test_db();

        assert!(insert(&db, Bank::Bdv, "150,50", "123456789012").await.is_some());
        assert!(insert(&db, Bank::Banesco, "999,99", "123456789012").await.is_none());
        assert_eq!(count_payments(db.async_connection.clone(), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn six_digit_lookup_matches_by_suffix() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "150,50", "ABC123456789").await;

        let matches = find_matches(db.async_connection.clone(), "456789").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reference, "ABC123456789");

        // Eight digits is not a suffix lookup; it must match exactly.
        let matches = find_matches(db.async_connection.clone(), "23456789").await.unwrap();
        assert!(matches.is_empty());

        let matches = find_matches(db.async_connection.clone(), "ABC123456789").await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn shared_suffix_is_ambiguous() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "100,00", "AAA111222333").await;
        insert(&db, Bank::Plaza, "200,00", "BBB999222333").await;

        let matches = find_matches(db.async_connection.clone(), "222333").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.state == PaymentState::Free));
    }

    #[tokio::test]
    async fn unknown_reference_finds_nothing() {
        let (_dir, db) = test_db();

        let matches = find_matches(db.async_connection.clone(), "654321").await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn redeem_is_conditional_on_free_state() {
        let (_dir, db) = test_db();
        let id = insert(&db, Bank::Bdv, "150,50", "REF99887766").await.unwrap();

        let redeemed = redeem_payment(
            db.async_connection.clone(),
            id,
            "MESA-4",
            "05/08/2026 10:00 AM",
            "10.0.0.1",
        )
        .await
        .unwrap();
        assert!(redeemed);

        // A second attempt observes REDEEMED and fails the guard.
        let redeemed_again = redeem_payment(
            db.async_connection.clone(),
            id,
            "MESA-5",
            "05/08/2026 10:01 AM",
            "10.0.0.2",
        )
        .await
        .unwrap();
        assert!(!redeemed_again);

        let matches = find_matches(db.async_connection.clone(), "REF99887766").await.unwrap();
        assert_eq!(matches[0].state, PaymentState::Redeemed);
    }

    #[tokio::test]
    async fn release_clears_redemption_metadata() {
        let (_dir, db) = test_db();
        let id = insert(&db, Bank::Bdv, "150,50", "REF11223344").await.unwrap();
        redeem_payment(
            db.async_connection.clone(),
            id,
            "42",
            "05/08/2026 10:00 AM",
            "10.0.0.1",
        )
        .await
        .unwrap();

        assert!(release_payment(db.async_connection.clone(), "REF11223344").await.unwrap());

        let records = list_payments(db.async_connection.clone(), None, 50, 0).await.unwrap();
        assert_eq!(records[0].state, PaymentState::Free);
        assert!(records[0].order_code.is_none());
        assert!(records[0].redeemed_at.is_none());
        assert!(records[0].redeemed_ip.is_none());

        // Released records can be redeemed again.
        assert!(redeem_payment(
            db.async_connection.clone(),
            id,
            "43",
            "05/08/2026 11:00 AM",
            "10.0.0.1",
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn delete_is_terminal() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "150,50", "REF55667788").await;

        assert!(delete_payment(db.async_connection.clone(), "REF55667788").await.unwrap());
        assert!(!delete_payment(db.async_connection.clone(), "REF55667788").await.unwrap());
        assert_eq!(count_payments(db.async_connection.clone(), None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "100,00", "REF00000001").await;
        insert(&db, Bank::Bdv, "200,00", "REF00000002").await;
        insert(&db, Bank::Bdv, "300,00", "REF00000003").await;

        let page = list_payments(db.async_connection.clone(), None, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].reference, "REF00000003");
        assert_eq!(page[1].reference, "REF00000002");

        let page = list_payments(db.async_connection.clone(), None, 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].reference, "REF00000001");
    }

    #[tokio::test]
    async fn search_filters_across_fields() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "150,50", "REF11112222").await;
        insert(&db, Bank::Binance, "25.5", "REF33334444").await;

        let found = list_payments(db.async_connection.clone(), Some("binance"), 50, 0)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reference, "REF33334444");

        let found = list_payments(db.async_connection.clone(), Some("1111"), 50, 0)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        assert_eq!(
            count_payments(db.async_connection.clone(), Some("REF")).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn totals_bucket_by_bank_currency() {
        let (_dir, db) = test_db();
        insert(&db, Bank::Bdv, "150,50", "REF10000001").await;
        insert(&db, Bank::Plaza, "1.000,00", "REF10000002").await;
        insert(&db, Bank::Binance, "25.5", "REF10000003").await;
        insert(&db, Bank::Nequi, "3000", "REF10000004").await;

        // Legacy rows can carry bank tags the enum does not know; they land
        // in the bolivar bucket. Unparsable amounts are skipped.
        {
            let conn = db.connection.lock().unwrap();
            conn.execute(
                "INSERT INTO payments (received_date, received_time, sender, amount, reference, full_message, bank, state, created_at)
                 VALUES ('05/08/2026', '09:00 AM', 'S/D', '10,00', 'REF10000005', '', 'MERCANTIL', 'FREE', 0)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO payments (received_date, received_time, sender, amount, reference, full_message, bank, state, created_at)
                 VALUES ('05/08/2026', '09:00 AM', 'S/D', 'garbage', 'REF10000006', '', 'BDV', 'FREE', 0)",
                [],
            )
            .unwrap();
        }

        let totals = payment_totals(db.async_connection.clone(), None).await.unwrap();
        assert!((totals.bs - 1160.50).abs() < 1e-9);
        assert!((totals.usd - 25.5).abs() < 1e-9);
        assert!((totals.cop - 3000.0).abs() < 1e-9);
    }
}
