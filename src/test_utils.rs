//! Shared test utilities for the settlement core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        sale::{self, NewSale},
        sequencer::ReceiptNumber,
        settlement::CommissionRates,
    },
    entities::{payment_receipt, sale_record},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, Set};
use std::sync::Arc;
use tempfile::TempDir;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
///
/// The pool is pinned to one connection: every in-memory connection is its own
/// database, and concurrent tests must all see the same one.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database behind a pool of several connections,
/// for tests that exercise real lock contention. Keep the returned directory alive
/// for as long as the connection is used.
pub async fn setup_pooled_test_db() -> Result<(Arc<DatabaseConnection>, TempDir)> {
    let dir = TempDir::new()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("agronond.sqlite").display()
    );
    let mut options = ConnectOptions::new(url);
    options.max_connections(8).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((Arc::new(db), dir))
}

/// A fixed issuance timestamp inside `year` (15 March, noon UTC).
pub fn issued_in(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 3, 15, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Sale input with sensible defaults.
///
/// # Defaults
/// * `commodity`: "onion"
/// * `quantity_kg`: 100.0
pub fn new_sale(farmer_id: &str, trader_id: &str, base_amount: Decimal) -> NewSale {
    NewSale {
        farmer_id: farmer_id.to_string(),
        trader_id: trader_id.to_string(),
        commodity: "onion".to_string(),
        quantity_kg: 100.0,
        base_amount,
    }
}

/// Records a test sale under the default 4%/9% rates.
pub async fn create_test_sale(
    db: &DatabaseConnection,
    farmer_id: &str,
    trader_id: &str,
    base_amount: Decimal,
) -> Result<sale_record::Model> {
    sale::create_sale(
        db,
        new_sale(farmer_id, trader_id, base_amount),
        &CommissionRates::default(),
    )
    .await
}

/// A receipt with every column set except the number fields.
pub fn receipt_draft(trader_id: &str) -> payment_receipt::ActiveModel {
    payment_receipt::ActiveModel {
        trader_id: Set(trader_id.to_string()),
        amount_paise: Set(10_000),
        mode: Set("cash".to_string()),
        reference_id: Set(None),
        issued_at: Set(Utc::now()),
        ..Default::default()
    }
}

/// Inserts a receipt directly, bypassing the counter. Stands in for receipts
/// written before the counter table existed.
pub async fn insert_raw_receipt(
    db: &DatabaseConnection,
    number: ReceiptNumber,
) -> Result<payment_receipt::Model> {
    let mut receipt = receipt_draft("legacy");
    receipt.receipt_number = Set(number.to_string());
    receipt.year = Set(number.year);
    receipt.sequence = Set(number.sequence);
    receipt.issued_at = Set(issued_in(number.year));
    receipt.insert(db).await.map_err(Into::into)
}
