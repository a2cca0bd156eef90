//! System setting entity - Stores key-value pairs for system configuration.
//! Used for feature flags (e.g. auction-login mode) and commission rate overrides.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System setting database model - stores key-value configuration pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Configuration key (e.g., `"commission.farmer_rate"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Configuration value stored as string
    pub value: String,
    /// What the setting controls
    pub description: Option<String>,
    /// Who last changed it
    pub updated_by: Option<String>,
    /// When this configuration was last modified
    pub updated_at: DateTimeUtc,
}

/// `SystemSetting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
