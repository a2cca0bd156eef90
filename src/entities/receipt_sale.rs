//! Receipt/sale link entity - which sale records a receipt covers.
//! `sale_id` is unique so a sale can never be settled by two receipts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receipt coverage database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_sales")]
pub struct Model {
    /// Unique identifier for the link row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Receipt doing the covering
    pub receipt_id: i64,
    /// Sale being covered
    #[sea_orm(unique)]
    pub sale_id: i64,
}

/// Defines relationships between `ReceiptSale` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one receipt
    #[sea_orm(
        belongs_to = "super::payment_receipt::Entity",
        from = "Column::ReceiptId",
        to = "super::payment_receipt::Column::Id"
    )]
    PaymentReceipt,
    /// Each link points at one sale
    #[sea_orm(
        belongs_to = "super::sale_record::Entity",
        from = "Column::SaleId",
        to = "super::sale_record::Column::Id"
    )]
    SaleRecord,
}

impl Related<super::payment_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentReceipt.def()
    }
}

impl Related<super::sale_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
