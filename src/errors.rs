//! Unified error type for the settlement core.

use thiserror::Error;

/// Every failure the settlement core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Base amount or weight was negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected input, rendered as text
        amount: String,
    },

    /// Receipt numbering could not be completed; nothing was persisted
    #[error("Receipt sequencing unavailable for {year}: {reason}")]
    SequencingUnavailable {
        /// Calendar year being sequenced
        year: i32,
        /// What went wrong
        reason: String,
    },

    /// Commission rate outside `[0, 1)`
    #[error("Invalid commission rate: {rate}")]
    InvalidRate {
        /// The rejected rate
        rate: String,
    },

    /// String did not match `RCPT-<YYYY>-<NNNN>`
    #[error("Invalid receipt number: {value}")]
    InvalidReceiptNumber {
        /// The rejected string
        value: String,
    },

    /// Request failed input validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the problem
        message: String,
    },

    /// No sale with that id
    #[error("Sale record not found: {id}")]
    SaleNotFound {
        /// Missing sale id
        id: i64,
    },

    /// No receipt with that id or number
    #[error("Receipt not found: {reference}")]
    ReceiptNotFound {
        /// Receipt id or number that was looked up
        reference: String,
    },

    /// Sale belongs to a different trader than the receipt
    #[error("Sale {sale_id} belongs to trader {actual}, not {expected}")]
    TraderMismatch {
        /// Sale being paid
        sale_id: i64,
        /// Trader named on the payment
        expected: String,
        /// Trader recorded on the sale
        actual: String,
    },

    /// That side of the sale has already been settled
    #[error("Sale {sale_id} is already paid on the {side} side")]
    AlreadyPaid {
        /// Sale being paid
        sale_id: i64,
        /// `"farmer"` or `"trader"`
        side: &'static str,
    },

    /// Sale amounts cannot change once any payment exists
    #[error("Sale {sale_id} has payments recorded and can no longer be changed")]
    SaleLocked {
        /// Locked sale
        sale_id: i64,
    },

    /// Bad `config.toml` or settings value
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure, e.g. creating the data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `DATABASE_URL` unreadable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Stored value out of range for its Rust type
    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
