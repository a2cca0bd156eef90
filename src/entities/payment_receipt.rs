//! Payment receipt entity - one payment event from a trader covering one or more sales.
//!
//! Receipts are written once and never updated. `receipt_number` carries a unique
//! index, which is the last line of defence against duplicate numbering.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::money::from_paise;

/// Payment receipt database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_receipts")]
pub struct Model {
    /// Unique identifier for the receipt
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display number, `RCPT-<YYYY>-<NNNN>`
    #[sea_orm(unique)]
    pub receipt_number: String,
    /// Calendar year the number is scoped to
    pub year: i32,
    /// Position within the year, starting at 1
    pub sequence: i64,
    /// Trader who paid
    pub trader_id: String,
    /// Total paid, in paise
    pub amount_paise: i64,
    /// Payment mode: `"cash"`, `"upi"`, `"cheque"` or `"bank_transfer"`
    pub mode: String,
    /// UPI/cheque/bank reference, if any
    pub reference_id: Option<String>,
    /// When the receipt was issued
    pub issued_at: DateTimeUtc,
}

impl Model {
    /// Total paid in rupees
    #[must_use]
    pub fn amount(&self) -> Decimal {
        from_paise(self.amount_paise)
    }
}

/// Defines relationships between `PaymentReceipt` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One receipt covers many sales
    #[sea_orm(has_many = "super::receipt_sale::Entity")]
    ReceiptSales,
}

impl Related<super::receipt_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptSales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
