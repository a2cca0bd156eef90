//! Sale record business logic - produce entry, weight/auction corrections and
//! farmer-side payment tracking.
//!
//! Every sale stores a settlement snapshot computed from the rates active when it
//! was recorded. The trader side is settled through receipts (see
//! [`crate::core::receipt`]); the farmer side is marked paid directly.

use crate::{
    core::{
        money::{round2, to_paise},
        settlement::{CommissionRates, Settlement, calculate_settlement_with},
    },
    entities::{SaleRecord, sale_record},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use std::fmt;
use tracing::{info, instrument};

/// Payment state of one side of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Not settled yet
    Pending,
    /// Settled
    Paid,
}

impl PaymentStatus {
    /// Value stored in the status columns
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for recording a sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    /// Selling farmer
    pub farmer_id: String,
    /// Buying trader
    pub trader_id: String,
    /// Produce name, e.g. "onion"
    pub commodity: String,
    /// Net weight from the weight station
    pub quantity_kg: f64,
    /// Agreed value before commission; rounded to the paisa before use
    pub base_amount: Decimal,
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_quantity(quantity_kg: f64) -> Result<()> {
    if !quantity_kg.is_finite() || quantity_kg < 0.0 {
        return Err(Error::InvalidAmount {
            amount: quantity_kg.to_string(),
        });
    }
    Ok(())
}

/// Settlement for an amount after rounding it to whole paise.
fn settle_in_paise(base_amount: Decimal, rates: &CommissionRates) -> Result<Settlement> {
    calculate_settlement_with(round2(base_amount), rates)
}

/// Records a new sale and its settlement snapshot. Both sides start `pending`.
///
/// # Errors
/// Returns an error if:
/// - `farmer_id`, `trader_id` or `commodity` is empty (`Error::Validation`)
/// - the weight or base amount is negative or not finite (`Error::InvalidAmount`)
/// - the database insert fails
#[instrument(skip(db, sale), fields(trader_id = %sale.trader_id, farmer_id = %sale.farmer_id))]
pub async fn create_sale(
    db: &DatabaseConnection,
    sale: NewSale,
    rates: &CommissionRates,
) -> Result<sale_record::Model> {
    let farmer_id = require_text("farmer_id", &sale.farmer_id)?;
    let trader_id = require_text("trader_id", &sale.trader_id)?;
    let commodity = require_text("commodity", &sale.commodity)?;
    validate_quantity(sale.quantity_kg)?;
    let settlement = settle_in_paise(sale.base_amount, rates)?;

    let record = sale_record::ActiveModel {
        farmer_id: Set(farmer_id),
        trader_id: Set(trader_id),
        commodity: Set(commodity),
        quantity_kg: Set(sale.quantity_kg),
        base_amount_paise: Set(to_paise(settlement.base_amount)?),
        farmer_commission_paise: Set(to_paise(settlement.farmer_commission)?),
        trader_commission_paise: Set(to_paise(settlement.trader_commission)?),
        farmer_payable_paise: Set(to_paise(settlement.farmer_payable)?),
        trader_payable_paise: Set(to_paise(settlement.trader_payable)?),
        farmer_payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        trader_payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        recorded_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = record.insert(db).await?;
    info!(sale_id = result.id, base_amount = %settlement.base_amount, "Sale recorded");
    Ok(result)
}

/// Retrieves a specific sale by its unique ID.
pub async fn get_sale_by_id(
    db: &DatabaseConnection,
    sale_id: i64,
) -> Result<Option<sale_record::Model>> {
    SaleRecord::find_by_id(sale_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All sales of a farmer, oldest first.
pub async fn list_sales_for_farmer(
    db: &DatabaseConnection,
    farmer_id: &str,
) -> Result<Vec<sale_record::Model>> {
    SaleRecord::find()
        .filter(sale_record::Column::FarmerId.eq(farmer_id))
        .order_by_asc(sale_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All purchases of a trader, oldest first.
pub async fn list_sales_for_trader(
    db: &DatabaseConnection,
    trader_id: &str,
) -> Result<Vec<sale_record::Model>> {
    SaleRecord::find()
        .filter(sale_record::Column::TraderId.eq(trader_id))
        .order_by_asc(sale_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Purchases the trader has not yet paid for. This is what the payment screen offers.
pub async fn list_pending_sales_for_trader(
    db: &DatabaseConnection,
    trader_id: &str,
) -> Result<Vec<sale_record::Model>> {
    SaleRecord::find()
        .filter(sale_record::Column::TraderId.eq(trader_id))
        .filter(sale_record::Column::TraderPaymentStatus.eq(PaymentStatus::Pending.as_str()))
        .order_by_asc(sale_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sales recorded in `[from, to)`, oldest first.
pub async fn list_sales_between(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<sale_record::Model>> {
    SaleRecord::find()
        .filter(sale_record::Column::RecordedAt.gte(from))
        .filter(sale_record::Column::RecordedAt.lt(to))
        .order_by_asc(sale_record::Column::RecordedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a weight update or auction re-entry to an unpaid sale and recomputes
/// its settlement under `rates`.
///
/// The write is conditional on both sides still being pending, so a payment that
/// lands first always wins.
///
/// # Errors
/// Returns `Error::SaleNotFound`, `Error::InvalidAmount` for bad figures, or
/// `Error::SaleLocked` once either side has been paid.
#[instrument(skip(db, rates))]
pub async fn update_sale_amount(
    db: &DatabaseConnection,
    sale_id: i64,
    quantity_kg: f64,
    base_amount: Decimal,
    rates: &CommissionRates,
) -> Result<sale_record::Model> {
    validate_quantity(quantity_kg)?;
    let settlement = settle_in_paise(base_amount, rates)?;

    let pending = PaymentStatus::Pending.as_str();
    let updated = SaleRecord::update_many()
        .col_expr(sale_record::Column::QuantityKg, Expr::value(quantity_kg))
        .col_expr(
            sale_record::Column::BaseAmountPaise,
            Expr::value(to_paise(settlement.base_amount)?),
        )
        .col_expr(
            sale_record::Column::FarmerCommissionPaise,
            Expr::value(to_paise(settlement.farmer_commission)?),
        )
        .col_expr(
            sale_record::Column::TraderCommissionPaise,
            Expr::value(to_paise(settlement.trader_commission)?),
        )
        .col_expr(
            sale_record::Column::FarmerPayablePaise,
            Expr::value(to_paise(settlement.farmer_payable)?),
        )
        .col_expr(
            sale_record::Column::TraderPayablePaise,
            Expr::value(to_paise(settlement.trader_payable)?),
        )
        .filter(sale_record::Column::Id.eq(sale_id))
        .filter(sale_record::Column::FarmerPaymentStatus.eq(pending))
        .filter(sale_record::Column::TraderPaymentStatus.eq(pending))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(match get_sale_by_id(db, sale_id).await? {
            Some(_) => Error::SaleLocked { sale_id },
            None => Error::SaleNotFound { id: sale_id },
        });
    }

    info!(sale_id, base_amount = %settlement.base_amount, "Sale amount corrected");
    get_sale_by_id(db, sale_id)
        .await?
        .ok_or(Error::SaleNotFound { id: sale_id })
}

/// Marks the farmer side of a sale as paid.
///
/// # Errors
/// Returns `Error::SaleNotFound`, or `Error::AlreadyPaid` if it was already paid.
#[instrument(skip(db))]
pub async fn mark_farmer_paid(db: &DatabaseConnection, sale_id: i64) -> Result<sale_record::Model> {
    let updated = SaleRecord::update_many()
        .col_expr(
            sale_record::Column::FarmerPaymentStatus,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .filter(sale_record::Column::Id.eq(sale_id))
        .filter(sale_record::Column::FarmerPaymentStatus.eq(PaymentStatus::Pending.as_str()))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(match get_sale_by_id(db, sale_id).await? {
            Some(_) => Error::AlreadyPaid {
                sale_id,
                side: "farmer",
            },
            None => Error::SaleNotFound { id: sale_id },
        });
    }

    info!(sale_id, "Farmer payment recorded");
    get_sale_by_id(db, sale_id)
        .await?
        .ok_or(Error::SaleNotFound { id: sale_id })
}
