//! Report generation business logic.
//!
//! This module builds the market committee's daily settlement report and the text
//! lines printed on invoices. Totals are sums of the per-sale figures stored on each
//! record, so the report always matches the invoices already handed out.

use crate::{
    core::{
        money::format_rupees,
        receipt::list_receipts_between,
        sale::{PaymentStatus, list_sales_between},
        settlement::{Settlement, SettlementTotals},
    },
    entities::{payment_receipt, sale_record},
    errors::{Error, Result},
};
use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// The committee's settlement report for one day.
#[derive(Debug, Clone)]
pub struct DailyReport {
    /// Day covered (UTC)
    pub date: NaiveDate,
    /// Field totals over every sale recorded that day
    pub totals: SettlementTotals,
    /// Sales whose farmer side is still unpaid
    pub farmer_pending: usize,
    /// Sales whose trader side is still unpaid
    pub trader_pending: usize,
    /// Receipts issued that day
    pub receipts: Vec<payment_receipt::Model>,
    /// Sum of those receipts
    pub amount_collected: Decimal,
}

/// Generates the settlement report for `date`.
///
/// # Errors
/// Returns an error if `date` cannot be turned into a UTC range or a query fails.
pub async fn generate_daily_report(db: &DatabaseConnection, date: NaiveDate) -> Result<DailyReport> {
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::Validation {
            message: format!("invalid report date {date}"),
        })?
        .and_utc();
    let end = start + TimeDelta::days(1);

    let sales = list_sales_between(db, start, end).await?;
    let receipts = list_receipts_between(db, start, end).await?;

    let mut totals = SettlementTotals::default();
    for sale in &sales {
        totals.add(&Settlement::from(sale));
    }

    let pending = PaymentStatus::Pending.as_str();
    let farmer_pending = sales
        .iter()
        .filter(|s| s.farmer_payment_status == pending)
        .count();
    let trader_pending = sales
        .iter()
        .filter(|s| s.trader_payment_status == pending)
        .count();
    let amount_collected = receipts.iter().map(payment_receipt::Model::amount).sum();

    Ok(DailyReport {
        date,
        totals,
        farmer_pending,
        trader_pending,
        receipts,
        amount_collected,
    })
}

/// One invoice line for a sale.
#[must_use]
pub fn format_settlement_line(sale: &sale_record::Model) -> String {
    format!(
        "#{} {} {:.2} kg | base {} | farmer -{} = {} | trader +{} = {}",
        sale.id,
        sale.commodity,
        sale.quantity_kg,
        format_rupees(sale.base_amount()),
        format_rupees(sale.farmer_commission()),
        format_rupees(sale.farmer_payable()),
        format_rupees(sale.trader_commission()),
        format_rupees(sale.trader_payable()),
    )
}

/// One summary line for a receipt.
#[must_use]
pub fn format_receipt_summary(receipt: &payment_receipt::Model) -> String {
    let reference = receipt
        .reference_id
        .as_deref()
        .map_or_else(String::new, |r| format!(" ({r})"));
    format!(
        "{} | {} | {} | {}{}",
        receipt.receipt_number,
        receipt.trader_id,
        format_rupees(receipt.amount()),
        receipt.mode,
        reference
    )
}

/// Multi-line text version of the daily report.
#[must_use]
pub fn format_daily_report(report: &DailyReport) -> String {
    let t = &report.totals;
    let mut lines = vec![
        format!("Settlement report for {}", report.date),
        format!("Sales: {}", t.records),
        format!("Base amount: {}", format_rupees(t.base_amount)),
        format!(
            "Farmer commission: {} (payable {})",
            format_rupees(t.farmer_commission),
            format_rupees(t.farmer_payable)
        ),
        format!(
            "Trader commission: {} (payable {})",
            format_rupees(t.trader_commission),
            format_rupees(t.trader_payable)
        ),
        format!("Committee income: {}", format_rupees(t.committee_income())),
        format!(
            "Pending: {} farmer, {} trader",
            report.farmer_pending, report.trader_pending
        ),
        format!(
            "Receipts issued: {} totalling {}",
            report.receipts.len(),
            format_rupees(report.amount_collected)
        ),
    ];
    lines.extend(report.receipts.iter().map(format_receipt_summary));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::receipt::{PaymentMode, RecordPayment, record_payment};
    use crate::core::sale::mark_farmer_paid;
    use crate::test_utils::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_daily_report_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_sale(&db, "F1", "T1", dec!(20000)).await?;
        let b = create_test_sale(&db, "F2", "T1", dec!(7200)).await?;
        mark_farmer_paid(&db, a.id).await?;

        let now = Utc::now();
        record_payment(
            &db,
            RecordPayment {
                trader_id: "T1".to_string(),
                sale_ids: vec![b.id],
                mode: PaymentMode::Cash,
                reference_id: None,
            },
            now,
        )
        .await?;

        let report = generate_daily_report(&db, now.date_naive()).await?;
        assert_eq!(report.totals.records, 2);
        assert_eq!(report.totals.base_amount, dec!(27200));
        assert_eq!(report.totals.farmer_commission, dec!(1088));
        assert_eq!(report.totals.farmer_payable, dec!(26112));
        assert_eq!(report.totals.trader_commission, dec!(2448));
        assert_eq!(report.totals.trader_payable, dec!(29648));
        assert_eq!(report.farmer_pending, 1);
        assert_eq!(report.trader_pending, 1);
        assert_eq!(report.receipts.len(), 1);
        assert_eq!(report.amount_collected, dec!(7848));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_matches_per_sale_invoices() -> Result<()> {
        let db = setup_test_db().await?;
        let mut sales = Vec::new();
        for amount in [dec!(12345.675), dec!(0.13), dec!(0.13), dec!(0.13)] {
            sales.push(create_test_sale(&db, "F1", "T1", amount).await?);
        }

        let report = generate_daily_report(&db, Utc::now().date_naive()).await?;
        let invoice_sum: Decimal = sales.iter().map(sale_record::Model::farmer_commission).sum();
        assert_eq!(report.totals.farmer_commission, invoice_sum);
        assert_eq!(
            report.totals.trader_payable,
            sales.iter().map(sale_record::Model::trader_payable).sum::<Decimal>()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_day() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_sale(&db, "F1", "T1", dec!(100)).await?;

        let long_ago = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let report = generate_daily_report(&db, long_ago).await?;
        assert_eq!(report.totals, SettlementTotals::default());
        assert!(report.receipts.is_empty());
        assert_eq!(report.amount_collected, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_format_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let sale = create_test_sale(&db, "F1", "T1", dec!(20000)).await?;
        assert_eq!(
            format_settlement_line(&sale),
            format!(
                "#{} onion 100.00 kg | base ₹20,000.00 | farmer -₹800.00 = ₹19,200.00 | trader +₹1,800.00 = ₹21,800.00",
                sale.id
            )
        );

        let receipt = record_payment(
            &db,
            RecordPayment {
                trader_id: "T1".to_string(),
                sale_ids: vec![sale.id],
                mode: PaymentMode::Upi,
                reference_id: Some("4411".to_string()),
            },
            issued_in(2026),
        )
        .await?;
        assert_eq!(
            format_receipt_summary(&receipt),
            "RCPT-2026-0001 | T1 | ₹21,800.00 | upi (4411)"
        );

        let report = generate_daily_report(&db, Utc::now().date_naive()).await?;
        let text = format_daily_report(&report);
        assert!(text.contains("Sales: 1"));
        assert!(text.contains("Committee income: ₹2,600.00"));
        Ok(())
    }
}
