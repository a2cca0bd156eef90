//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Issued receipts
pub mod payment_receipt;
/// Per-year receipt counters
pub mod receipt_counter;
/// Receipt to sale coverage links
pub mod receipt_sale;
/// Sales and their settlement snapshots
pub mod sale_record;
/// Key/value system settings
pub mod system_setting;

// Re-export specific types to avoid conflicts
pub use payment_receipt::{
    Column as PaymentReceiptColumn, Entity as PaymentReceipt, Model as PaymentReceiptModel,
};
pub use receipt_counter::{
    Column as ReceiptCounterColumn, Entity as ReceiptCounter, Model as ReceiptCounterModel,
};
pub use receipt_sale::{Column as ReceiptSaleColumn, Entity as ReceiptSale, Model as ReceiptSaleModel};
pub use sale_record::{Column as SaleRecordColumn, Entity as SaleRecord, Model as SaleRecordModel};
pub use system_setting::{
    Column as SystemSettingColumn, Entity as SystemSetting, Model as SystemSettingModel,
};
