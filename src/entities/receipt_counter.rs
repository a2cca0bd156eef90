//! Receipt counter entity - the last sequence handed out per calendar year.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-year receipt counter
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_counters")]
pub struct Model {
    /// Calendar year
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    /// Highest sequence issued so far in that year
    pub last_sequence: i64,
}

/// `ReceiptCounter` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
