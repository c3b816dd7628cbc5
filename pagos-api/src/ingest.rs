use crate::database::{payments as payments_db, AsyncDbConnection};
use crate::helpers::vet;
use anyhow::Result;
use extractors::{PatternSpec, PaymentNotificationExtractor};

/// Counters for one webhook delivery.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Runs the notification extractor over incoming webhook text and persists
/// the resulting candidates as FREE records.
pub struct NotificationIngestor {
    db_conn: AsyncDbConnection,
    extractor: PaymentNotificationExtractor,
}

impl NotificationIngestor {
    pub fn new(db_conn: AsyncDbConnection) -> Self {
        Self {
            db_conn,
            extractor: PaymentNotificationExtractor::new(),
        }
    }

    /// Extends the built-in pattern table with profiles from the config.
    pub fn with_patterns(db_conn: AsyncDbConnection, extra: &[PatternSpec]) -> Result<Self> {
        Ok(Self {
            db_conn,
            extractor: PaymentNotificationExtractor::with_extra_patterns(extra)?,
        })
    }

    /// One failed insert is logged and skipped; it never blocks the other
    /// candidates from the same delivery.
    pub async fn ingest(&self, text: &str) -> IngestOutcome {
        let candidates = self.extractor.extract(text);
        let (received_date, received_time) = vet::reception_stamps();

        let mut outcome = IngestOutcome::default();
        for candidate in &candidates {
            let inserted = payments_db::insert_payment_if_absent(
                self.db_conn.clone(),
                candidate,
                &received_date,
                &received_time,
            )
            .await;

            match inserted {
                Ok(Some(id)) => {
                    tracing::info!(
                        reference = %candidate.reference,
                        bank = %candidate.bank,
                        id,
                        "payment recorded"
                    );
                    outcome.inserted += 1;
                }
                Ok(None) => {
                    tracing::debug!(
                        reference = %candidate.reference,
                        "duplicate reference ignored"
                    );
                    outcome.duplicates += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        reference = %candidate.reference,
                        "failed to persist payment"
                    );
                }
            }
        }

        outcome
    }
}
