//! Receipt numbering - unique, year-scoped `RCPT-<YYYY>-<NNNN>` identifiers.
//!
//! Numbers come from a per-year counter row that is bumped with a single
//! `UPDATE ... SET last_sequence = last_sequence + 1`, the same atomic-update pattern
//! used for balances elsewhere. The bump must run inside the database transaction
//! that persists the receipt: the counter row stays write-locked until commit, so
//! concurrent issuers in the same year queue behind each other, and a rollback hands
//! the number back.
//!
//! A missing counter row is seeded from the number of receipts already stored for
//! that year, so numbering continues after receipts written before the counter
//! existed. If that seed lands on a number that is already taken, the unique index on
//! `receipt_number` rejects the insert and [`insert_sequenced_receipt`] moves on to
//! the next number, up to [`MAX_SEQUENCING_ATTEMPTS`] times.
//!
//! Transactions that read other rows before numbering must call [`lock_counter`]
//! first, so they hold the write lock from their first statement.

use crate::{
    entities::{PaymentReceipt, ReceiptCounter, payment_receipt, receipt_counter},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, Set, SqlErr, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use std::{fmt, str::FromStr};
use tracing::{debug, instrument, warn};

/// Fixed prefix printed on every receipt
pub const RECEIPT_PREFIX: &str = "RCPT";

/// How many numbers one receipt insert may try before giving up
pub const MAX_SEQUENCING_ATTEMPTS: u32 = 5;

/// A parsed receipt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiptNumber {
    /// Calendar year of issue
    pub year: i32,
    /// 1-based position within the year
    pub sequence: i64,
}

impl ReceiptNumber {
    /// Number for position `sequence` of `year`.
    #[must_use]
    pub const fn new(year: i32, sequence: i64) -> Self {
        Self { year, sequence }
    }
}

impl fmt::Display for ReceiptNumber {
    /// Sequence is padded to four digits and widens past 9999.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RECEIPT_PREFIX}-{:04}-{:04}", self.year, self.sequence)
    }
}

impl FromStr for ReceiptNumber {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidReceiptNumber {
            value: value.to_string(),
        };

        let mut parts = value.split('-');
        let (Some(prefix), Some(year), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if prefix != RECEIPT_PREFIX
            || year.len() != 4
            || !all_digits(year)
            || sequence.len() < 4
            || !all_digits(sequence)
            || (sequence.len() > 4 && sequence.starts_with('0'))
        {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let sequence = sequence.parse().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }
        Ok(Self { year, sequence })
    }
}

/// Calendar year (UTC) a receipt issued at `issued_at` is numbered under.
#[must_use]
pub fn receipt_year(issued_at: DateTime<Utc>) -> i32 {
    issued_at.year()
}

/// Counts receipts already stored for `year`.
pub async fn count_receipts_for_year<C>(db: &C, year: i32) -> Result<u64>
where
    C: ConnectionTrait,
{
    PaymentReceipt::find()
        .filter(payment_receipt::Column::Year.eq(year))
        .count(db)
        .await
        .map_err(Into::into)
}

async fn bump_counter<C>(db: &C, year: i32) -> std::result::Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    // Write first so the counter row is locked before anything is read
    let updated = ReceiptCounter::update_many()
        .col_expr(
            receipt_counter::Column::LastSequence,
            Expr::col(receipt_counter::Column::LastSequence).add(1),
        )
        .filter(receipt_counter::Column::Year.eq(year))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        let existing = PaymentReceipt::find()
            .filter(payment_receipt::Column::Year.eq(year))
            .count(db)
            .await?;
        let seeded = i64::try_from(existing)
            .map_err(|e| DbErr::Custom(format!("receipt count out of range: {e}")))?
            + 1;

        receipt_counter::ActiveModel {
            year: Set(year),
            last_sequence: Set(seeded),
        }
        .insert(db)
        .await?;
        debug!(year, seeded, "Seeded receipt counter");
        return Ok(seeded);
    }

    ReceiptCounter::find_by_id(year)
        .one(db)
        .await?
        .map(|counter| counter.last_sequence)
        .ok_or_else(|| DbErr::RecordNotFound(format!("receipt counter for {year}")))
}

/// Takes the database write lock through `year`'s counter row without changing it.
///
/// `SQLite` cannot upgrade a read lock to a write lock while another transaction
/// holds one, so a transaction that reads before numbering fails with "database is
/// locked" under contention. Run this as the first statement of any transaction
/// that will call [`next_sequence`]; concurrent issuers then wait their turn here.
///
/// # Errors
/// Returns `Error::SequencingUnavailable` if the lock cannot be taken.
#[instrument(skip(db))]
pub async fn lock_counter<C>(db: &C, year: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    ReceiptCounter::update_many()
        .col_expr(
            receipt_counter::Column::LastSequence,
            Expr::col(receipt_counter::Column::LastSequence).add(0),
        )
        .filter(receipt_counter::Column::Year.eq(year))
        .exec(db)
        .await
        .map_err(|e| Error::SequencingUnavailable {
            year,
            reason: e.to_string(),
        })?;
    Ok(())
}

/// Reserves the next receipt number for `year`.
///
/// Call this on the transaction that will persist the receipt. The reservation only
/// becomes permanent when that transaction commits.
///
/// # Errors
/// Returns `Error::SequencingUnavailable` if the counter cannot be read or updated.
#[instrument(skip(db))]
pub async fn next_sequence<C>(db: &C, year: i32) -> Result<ReceiptNumber>
where
    C: ConnectionTrait,
{
    let sequence = bump_counter(db, year)
        .await
        .map_err(|e| Error::SequencingUnavailable {
            year,
            reason: e.to_string(),
        })?;
    Ok(ReceiptNumber::new(year, sequence))
}

/// Whether a database error is a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Numbers and inserts a receipt inside `txn`.
///
/// `draft` carries every column except the number fields, which are filled in per
/// attempt. Each attempt inserts under a savepoint; a clash on `receipt_number`
/// rolls back just that insert and tries the next number. The counter keeps its
/// increments, so a clashing number is never offered again.
///
/// # Errors
/// Returns `Error::SequencingUnavailable` when the counter fails or every attempt
/// clashes, and `Error::Database` for any other insert failure.
#[instrument(skip(txn, draft))]
pub async fn insert_sequenced_receipt(
    txn: &DatabaseTransaction,
    year: i32,
    draft: payment_receipt::ActiveModel,
) -> Result<payment_receipt::Model> {
    for attempt in 1..=MAX_SEQUENCING_ATTEMPTS {
        let number = next_sequence(txn, year).await?;

        let mut receipt = draft.clone();
        receipt.receipt_number = Set(number.to_string());
        receipt.year = Set(number.year);
        receipt.sequence = Set(number.sequence);

        let savepoint = txn.begin().await?;
        match receipt.insert(&savepoint).await {
            Ok(model) => {
                savepoint.commit().await?;
                return Ok(model);
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                warn!(
                    receipt_number = %number,
                    attempt,
                    "Receipt number already taken, advancing counter"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::SequencingUnavailable {
        year,
        reason: format!("no free receipt number after {MAX_SEQUENCING_ATTEMPTS} attempts"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{insert_raw_receipt, setup_test_db};
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_receipt_number_format() {
        assert_eq!(ReceiptNumber::new(2026, 1).to_string(), "RCPT-2026-0001");
        assert_eq!(ReceiptNumber::new(2026, 42).to_string(), "RCPT-2026-0042");
        assert_eq!(ReceiptNumber::new(2026, 9999).to_string(), "RCPT-2026-9999");
        assert_eq!(ReceiptNumber::new(2026, 10000).to_string(), "RCPT-2026-10000");
    }

    #[test]
    fn test_receipt_number_parse() {
        let parsed: ReceiptNumber = "RCPT-2025-0007".parse().unwrap();
        assert_eq!(parsed, ReceiptNumber::new(2025, 7));

        let wide: ReceiptNumber = "RCPT-2026-10000".parse().unwrap();
        assert_eq!(wide.sequence, 10000);

        for bad in [
            "",
            "RCPT-2026",
            "RCPT-2026-1",
            "RCPT-26-0001",
            "RCT-2026-0001",
            "RCPT-2026-0000",
            "RCPT-2026-00001",
            "RCPT-2026-00a1",
            "RCPT-2026-0001-x",
        ] {
            assert!(
                matches!(
                    bad.parse::<ReceiptNumber>(),
                    Err(Error::InvalidReceiptNumber { .. })
                ),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_receipt_year_is_utc() {
        let new_year = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(receipt_year(new_year), 2026);
        let eve = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(receipt_year(eve), 2025);
    }

    #[tokio::test]
    async fn test_first_receipt_of_year() -> Result<()> {
        let db = setup_test_db().await?;
        let number = next_sequence(&db, 2026).await?;
        assert_eq!(number.to_string(), "RCPT-2026-0001");
        Ok(())
    }

    #[tokio::test]
    async fn test_sequences_are_per_year() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(next_sequence(&db, 2026).await?.sequence, 1);
        assert_eq!(next_sequence(&db, 2026).await?.sequence, 2);
        assert_eq!(next_sequence(&db, 2027).await?.sequence, 1);
        assert_eq!(next_sequence(&db, 2026).await?.sequence, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_ten_thousandth_receipt_widens() -> Result<()> {
        let db = setup_test_db().await?;
        receipt_counter::ActiveModel {
            year: Set(2026),
            last_sequence: Set(9999),
        }
        .insert(&db)
        .await?;

        let number = next_sequence(&db, 2026).await?;
        assert_eq!(number.to_string(), "RCPT-2026-10000");
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_seeded_from_existing_receipts() -> Result<()> {
        let db = setup_test_db().await?;
        insert_raw_receipt(&db, ReceiptNumber::new(2025, 1)).await?;
        insert_raw_receipt(&db, ReceiptNumber::new(2025, 2)).await?;
        insert_raw_receipt(&db, ReceiptNumber::new(2024, 1)).await?;

        assert_eq!(count_receipts_for_year(&db, 2025).await?, 2);
        let number = next_sequence(&db, 2025).await?;
        assert_eq!(number.to_string(), "RCPT-2025-0003");
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_skips_taken_numbers() -> Result<()> {
        let db = setup_test_db().await?;
        // One legacy receipt holding number 2: the count seeds the counter at 2
        insert_raw_receipt(&db, ReceiptNumber::new(2026, 2)).await?;

        let txn = db.begin().await?;
        let receipt =
            insert_sequenced_receipt(&txn, 2026, crate::test_utils::receipt_draft("T1")).await?;
        txn.commit().await?;

        assert_eq!(receipt.receipt_number, "RCPT-2026-0003");
        assert_eq!(count_receipts_for_year(&db, 2026).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_gives_up_after_max_attempts() -> Result<()> {
        let db = setup_test_db().await?;
        for sequence in 1..=i64::from(MAX_SEQUENCING_ATTEMPTS) {
            insert_raw_receipt(&db, ReceiptNumber::new(2026, sequence)).await?;
        }
        // Counter far behind the stored receipts
        receipt_counter::ActiveModel {
            year: Set(2026),
            last_sequence: Set(0),
        }
        .insert(&db)
        .await?;

        let txn = db.begin().await?;
        let result =
            insert_sequenced_receipt(&txn, 2026, crate::test_utils::receipt_draft("T1")).await;
        txn.rollback().await?;

        assert!(matches!(
            result,
            Err(Error::SequencingUnavailable { year: 2026, .. })
        ));
        assert_eq!(
            count_receipts_for_year(&db, 2026).await?,
            u64::from(MAX_SEQUENCING_ATTEMPTS)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_counter_leaves_sequence_alone() -> Result<()> {
        let db = setup_test_db().await?;
        lock_counter(&db, 2026).await?;
        assert_eq!(next_sequence(&db, 2026).await?.sequence, 1);

        lock_counter(&db, 2026).await?;
        assert_eq!(next_sequence(&db, 2026).await?.sequence, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_failure_is_sequencing_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_errors([DbErr::Custom("database is locked".to_string())])
            .into_connection();

        let result = lock_counter(&db, 2026).await;
        assert!(matches!(
            result,
            Err(Error::SequencingUnavailable { year: 2026, .. })
        ));
    }

    #[tokio::test]
    async fn test_counter_update_failure_is_sequencing_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_errors([DbErr::Custom("disk I/O error".to_string())])
            .into_connection();

        let result = next_sequence(&db, 2026).await;
        assert!(matches!(
            result,
            Err(Error::SequencingUnavailable { year: 2026, .. })
        ));
    }

    #[tokio::test]
    async fn test_count_failure_is_sequencing_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_errors([DbErr::Custom("database is locked".to_string())])
            .into_connection();

        let result = next_sequence(&db, 2026).await;
        assert!(matches!(
            result,
            Err(Error::SequencingUnavailable { year: 2026, .. })
        ));
    }
}
