//! Sale record entity - one produce sale between a farmer and a trader.
//!
//! Amounts are stored as integer paise. The commission and payable columns are a
//! snapshot of the settlement computed when the sale was recorded or last corrected,
//! so invoices printed earlier keep reconciling if the active rates change later.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::money::from_paise;

/// Sale record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_records")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Farmer who sold the produce
    pub farmer_id: String,
    /// Trader who bought it
    pub trader_id: String,
    /// Produce name (e.g., "onion", "soybean")
    pub commodity: String,
    /// Net weight in kilograms after the weight-station update
    pub quantity_kg: f64,
    /// Agreed sale value before commission, in paise
    pub base_amount_paise: i64,
    /// Commission deducted from the farmer, in paise
    pub farmer_commission_paise: i64,
    /// Commission added to the trader, in paise
    pub trader_commission_paise: i64,
    /// Amount owed to the farmer, in paise
    pub farmer_payable_paise: i64,
    /// Amount owed by the trader, in paise
    pub trader_payable_paise: i64,
    /// `"pending"` or `"paid"`
    pub farmer_payment_status: String,
    /// `"pending"` or `"paid"`
    pub trader_payment_status: String,
    /// When the sale was entered
    pub recorded_at: DateTimeUtc,
}

impl Model {
    /// Agreed sale value in rupees
    #[must_use]
    pub fn base_amount(&self) -> Decimal {
        from_paise(self.base_amount_paise)
    }

    /// Commission deducted from the farmer, in rupees
    #[must_use]
    pub fn farmer_commission(&self) -> Decimal {
        from_paise(self.farmer_commission_paise)
    }

    /// Commission added to the trader, in rupees
    #[must_use]
    pub fn trader_commission(&self) -> Decimal {
        from_paise(self.trader_commission_paise)
    }

    /// What the farmer receives, in rupees
    #[must_use]
    pub fn farmer_payable(&self) -> Decimal {
        from_paise(self.farmer_payable_paise)
    }

    /// What the trader owes, in rupees
    #[must_use]
    pub fn trader_payable(&self) -> Decimal {
        from_paise(self.trader_payable_paise)
    }
}

/// Defines relationships between `SaleRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A sale appears on at most one receipt
    #[sea_orm(has_many = "super::receipt_sale::Entity")]
    ReceiptSales,
}

impl Related<super::receipt_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptSales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
