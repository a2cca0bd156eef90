//! Payment receipt business logic - recording a trader's payment against one or
//! more sales.
//!
//! [`record_payment`] is all-or-nothing: the sale checks, the receipt number, the
//! receipt row, its coverage links and the trader-side status updates are written
//! in one database transaction. If any step fails nothing is persisted and the
//! counter increment is rolled back with the rest.

use crate::{
    core::{
        sale::PaymentStatus,
        sequencer::{ReceiptNumber, insert_sequenced_receipt, lock_counter, receipt_year},
    },
    entities::{PaymentReceipt, ReceiptSale, SaleRecord, payment_receipt, receipt_sale, sale_record},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, JoinType, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::{info, instrument};

/// How the trader paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    /// Cash at the committee counter
    Cash,
    /// UPI transfer; the transaction id goes in the reference
    Upi,
    /// Cheque; the cheque number goes in the reference
    Cheque,
    /// NEFT/RTGS/IMPS transfer
    BankTransfer,
}

impl PaymentMode {
    /// Value stored in `payment_receipts.mode`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Upi => "upi",
            Self::Cheque => "cheque",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "upi" => Ok(Self::Upi),
            "cheque" => Ok(Self::Cheque),
            "bank_transfer" => Ok(Self::BankTransfer),
            other => Err(Error::Validation {
                message: format!("unknown payment mode: {other}"),
            }),
        }
    }
}

/// A payment waiting to be issued a receipt.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    /// Trader making the payment
    pub trader_id: String,
    /// Sales the payment settles; all must belong to `trader_id`
    pub sale_ids: Vec<i64>,
    /// How the money arrived
    pub mode: PaymentMode,
    /// UPI transaction id, cheque number, etc.
    pub reference_id: Option<String>,
}

/// Loads the sales a payment covers and checks they can be settled by it.
async fn load_payable_sales(
    txn: &DatabaseTransaction,
    trader_id: &str,
    sale_ids: &[i64],
) -> Result<Vec<sale_record::Model>> {
    let mut sales = Vec::with_capacity(sale_ids.len());
    for &sale_id in sale_ids {
        let sale = SaleRecord::find_by_id(sale_id)
            .one(txn)
            .await?
            .ok_or(Error::SaleNotFound { id: sale_id })?;

        if sale.trader_id != trader_id {
            return Err(Error::TraderMismatch {
                sale_id,
                expected: trader_id.to_string(),
                actual: sale.trader_id,
            });
        }
        if sale.trader_payment_status != PaymentStatus::Pending.as_str() {
            return Err(Error::AlreadyPaid {
                sale_id,
                side: "trader",
            });
        }
        sales.push(sale);
    }
    Ok(sales)
}

/// Issues a receipt for a trader's payment covering `payment.sale_ids`.
///
/// The receipt amount is the sum of the covered sales' trader payables. The receipt
/// number is scoped to the UTC year of `issued_at`.
///
/// # Errors
/// Returns an error if:
/// - the trader id is empty, or the sale list is empty or repeats an id (`Error::Validation`)
/// - a sale does not exist (`Error::SaleNotFound`)
/// - a sale belongs to another trader (`Error::TraderMismatch`)
/// - a sale's trader side is already paid (`Error::AlreadyPaid`)
/// - numbering fails (`Error::SequencingUnavailable`)
/// - any database operation fails
///
/// In every error case nothing is persisted.
#[instrument(skip(db, payment), fields(trader_id = %payment.trader_id, sales = payment.sale_ids.len()))]
pub async fn record_payment(
    db: &DatabaseConnection,
    payment: RecordPayment,
    issued_at: DateTime<Utc>,
) -> Result<payment_receipt::Model> {
    let trader_id = payment.trader_id.trim().to_string();
    if trader_id.is_empty() {
        return Err(Error::Validation {
            message: "trader_id cannot be empty".to_string(),
        });
    }
    if payment.sale_ids.is_empty() {
        return Err(Error::Validation {
            message: "a receipt must cover at least one sale".to_string(),
        });
    }
    let unique: BTreeSet<i64> = payment.sale_ids.iter().copied().collect();
    if unique.len() != payment.sale_ids.len() {
        return Err(Error::Validation {
            message: "a sale can appear only once on a receipt".to_string(),
        });
    }

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;
    let year = receipt_year(issued_at);
    // Write lock before any read, so concurrent payments queue instead of failing
    lock_counter(&txn, year).await?;

    let sales = load_payable_sales(&txn, &trader_id, &payment.sale_ids).await?;
    let amount_paise = sales
        .iter()
        .try_fold(0_i64, |total, sale| total.checked_add(sale.trader_payable_paise))
        .ok_or_else(|| Error::InvalidAmount {
            amount: "receipt total overflows".to_string(),
        })?;

    let draft = payment_receipt::ActiveModel {
        trader_id: Set(trader_id),
        amount_paise: Set(amount_paise),
        mode: Set(payment.mode.as_str().to_string()),
        reference_id: Set(payment.reference_id),
        issued_at: Set(issued_at),
        ..Default::default()
    };
    let receipt = insert_sequenced_receipt(&txn, year, draft).await?;

    let links = sales.iter().map(|sale| receipt_sale::ActiveModel {
        receipt_id: Set(receipt.id),
        sale_id: Set(sale.id),
        ..Default::default()
    });
    ReceiptSale::insert_many(links).exec(&txn).await?;

    for sale in &sales {
        let updated = SaleRecord::update_many()
            .col_expr(
                sale_record::Column::TraderPaymentStatus,
                Expr::value(PaymentStatus::Paid.as_str()),
            )
            .filter(sale_record::Column::Id.eq(sale.id))
            .filter(sale_record::Column::TraderPaymentStatus.eq(PaymentStatus::Pending.as_str()))
            .exec(&txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(Error::AlreadyPaid {
                sale_id: sale.id,
                side: "trader",
            });
        }
    }

    // Commit the transaction
    txn.commit().await?;

    info!(
        receipt_number = %receipt.receipt_number,
        amount = %receipt.amount(),
        mode = %receipt.mode,
        "Payment recorded"
    );
    Ok(receipt)
}

/// Retrieves a receipt by its unique ID.
pub async fn get_receipt_by_id(
    db: &DatabaseConnection,
    receipt_id: i64,
) -> Result<Option<payment_receipt::Model>> {
    PaymentReceipt::find_by_id(receipt_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks a receipt up by its printed number.
///
/// # Errors
/// Returns `Error::InvalidReceiptNumber` if `number` is not in `RCPT-YYYY-NNNN` form.
pub async fn get_receipt_by_number(
    db: &DatabaseConnection,
    number: &str,
) -> Result<Option<payment_receipt::Model>> {
    let parsed: ReceiptNumber = number.parse()?;
    PaymentReceipt::find()
        .filter(payment_receipt::Column::ReceiptNumber.eq(parsed.to_string()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All receipts issued to a trader, oldest first.
pub async fn list_receipts_for_trader(
    db: &DatabaseConnection,
    trader_id: &str,
) -> Result<Vec<payment_receipt::Model>> {
    PaymentReceipt::find()
        .filter(payment_receipt::Column::TraderId.eq(trader_id))
        .order_by_asc(payment_receipt::Column::IssuedAt)
        .order_by_asc(payment_receipt::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All receipts numbered under `year`, in sequence order.
pub async fn list_receipts_for_year(
    db: &DatabaseConnection,
    year: i32,
) -> Result<Vec<payment_receipt::Model>> {
    PaymentReceipt::find()
        .filter(payment_receipt::Column::Year.eq(year))
        .order_by_asc(payment_receipt::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Receipts issued in `[from, to)`.
pub async fn list_receipts_between(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<payment_receipt::Model>> {
    PaymentReceipt::find()
        .filter(payment_receipt::Column::IssuedAt.gte(from))
        .filter(payment_receipt::Column::IssuedAt.lt(to))
        .order_by_asc(payment_receipt::Column::IssuedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The sales a receipt covers, by sale id.
///
/// # Errors
/// Returns `Error::ReceiptNotFound` if the receipt does not exist.
pub async fn get_covered_sales(
    db: &DatabaseConnection,
    receipt_id: i64,
) -> Result<Vec<sale_record::Model>> {
    if PaymentReceipt::find_by_id(receipt_id).one(db).await?.is_none() {
        return Err(Error::ReceiptNotFound {
            reference: receipt_id.to_string(),
        });
    }

    SaleRecord::find()
        .join(JoinType::InnerJoin, sale_record::Relation::ReceiptSales.def())
        .filter(receipt_sale::Column::ReceiptId.eq(receipt_id))
        .order_by_asc(sale_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
