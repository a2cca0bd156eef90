/// Currency rounding, paise conversion and formatting
pub mod money;
/// Payment recording and receipt lookups
pub mod receipt;
/// Daily settlement report and invoice text
pub mod report;
/// Sale records and farmer-side payment tracking
pub mod sale;
/// Year-scoped receipt numbering
pub mod sequencer;
/// Key/value system settings and commission rate overrides
pub mod settings;
/// Commission and payable calculation
pub mod settlement;
