//! Human-readable document number generation
//!
//! Numbers look like `BAT-20240117-0001`; the sequence is scoped per document
//! type per day and held in the `document_sequences` table so concurrent
//! callers never observe the same value.

use chrono::NaiveDate;
use shared::types::Clock;
use shared::validation::validate_document_prefix;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Numbering service for batch/order document codes
#[derive(Clone)]
pub struct NumberingService {
    db: PgPool,
    clock: Clock,
}

impl NumberingService {
    /// Create a new NumberingService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            clock: Clock::System,
        }
    }

    /// Create a service with a pinned clock (used by tests)
    pub fn with_clock(db: PgPool, clock: Clock) -> Self {
        Self { db, clock }
    }

    /// Generate the next document number: PREFIX-YYYYMMDD-NNNN
    pub async fn next_number(&self, doc_type: &str, prefix: &str) -> AppResult<String> {
        validate_document_prefix(prefix).map_err(|message| AppError::Validation {
            field: "prefix".to_string(),
            message: message.to_string(),
        })?;

        let today = self.clock.today();

        // Single upsert so the increment is atomic under concurrency
        let sequence: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO document_sequences (doc_type, seq_date, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (doc_type, seq_date)
            DO UPDATE SET last_value = document_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(doc_type)
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        Ok(format_document_number(prefix, today, sequence))
    }
}

/// Format a document number: PREFIX-YYYYMMDD-NNNN
pub fn format_document_number(prefix: &str, date: NaiveDate, sequence: i32) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prefix_date_and_zero_padded_sequence() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        assert_eq!(format_document_number("BAT", date, 1), "BAT-20240117-0001");
        assert_eq!(format_document_number("SO", date, 42), "SO-20240117-0042");
    }

    #[test]
    fn sequence_widens_past_four_digits() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            format_document_number("PO", date, 12345),
            "PO-20241231-12345"
        );
    }
}
