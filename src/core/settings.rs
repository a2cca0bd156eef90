//! System settings business logic
//!
//! Generic key/value settings with a description and the user who last changed them.
//! Feature flags such as the auction-login mode live here, and two keys can override
//! the configured commission rates without a restart.

use crate::{
    core::settlement::CommissionRates,
    entities::{SystemSetting, system_setting},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::str::FromStr;
use tracing::{info, instrument};

/// Overrides the farmer commission rate, e.g. `"0.04"`
pub const FARMER_RATE_KEY: &str = "commission.farmer_rate";
/// Overrides the trader commission rate, e.g. `"0.09"`
pub const TRADER_RATE_KEY: &str = "commission.trader_rate";

/// Retrieves a setting by key.
pub async fn get_setting(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<system_setting::Model>> {
    SystemSetting::find()
        .filter(system_setting::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All settings ordered by key.
pub async fn list_settings(db: &DatabaseConnection) -> Result<Vec<system_setting::Model>> {
    SystemSetting::find()
        .order_by_asc(system_setting::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sets or updates a setting (upsert on `key`).
///
/// A `None` description keeps the one already stored.
///
/// # Errors
/// Returns `Error::Validation` for an empty key, or a database error.
#[instrument(skip(db, description))]
pub async fn set_setting(
    db: &DatabaseConnection,
    key: &str,
    value: &str,
    description: Option<String>,
    updated_by: Option<String>,
) -> Result<system_setting::Model> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Validation {
            message: "setting key cannot be empty".to_string(),
        });
    }
    let now = Utc::now();

    let saved = if let Some(existing) = get_setting(db, key).await? {
        let mut active: system_setting::ActiveModel = existing.into();
        active.value = Set(value.to_string());
        if description.is_some() {
            active.description = Set(description);
        }
        active.updated_by = Set(updated_by);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        system_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            description: Set(description),
            updated_by: Set(updated_by),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    info!("Set system setting: {} = {}", saved.key, saved.value);
    Ok(saved)
}

/// Deletes a setting. Returns whether it existed.
pub async fn delete_setting(db: &DatabaseConnection, key: &str) -> Result<bool> {
    let result = SystemSetting::delete_many()
        .filter(system_setting::Column::Key.eq(key))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Whether a boolean feature flag is switched on. Missing keys are off.
pub async fn is_enabled(db: &DatabaseConnection, key: &str) -> Result<bool> {
    Ok(get_setting(db, key)
        .await?
        .is_some_and(|s| matches!(s.value.trim(), "true" | "1" | "on" | "yes")))
}

fn parse_rate(setting: &system_setting::Model) -> Result<Decimal> {
    Decimal::from_str(setting.value.trim()).map_err(|e| Error::Config {
        message: format!("Setting {} is not a decimal rate: {e}", setting.key),
    })
}

/// The commission rates in force: each override key that is present replaces the
/// corresponding rate in `defaults`.
///
/// # Errors
/// Returns `Error::Config` for an unparseable override and `Error::InvalidRate` for
/// one outside `[0, 1)`.
pub async fn active_commission_rates(
    db: &DatabaseConnection,
    defaults: &CommissionRates,
) -> Result<CommissionRates> {
    let farmer = match get_setting(db, FARMER_RATE_KEY).await? {
        Some(setting) => parse_rate(&setting)?,
        None => defaults.farmer(),
    };
    let trader = match get_setting(db, TRADER_RATE_KEY).await? {
        Some(setting) => parse_rate(&setting)?,
        None => defaults.trader(),
    };
    CommissionRates::new(farmer, trader)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        let db = setup_test_db().await?;

        let saved = set_setting(
            &db,
            "auction_login_enabled",
            "true",
            Some("Lets auction staff log in with a shared code".to_string()),
            Some("admin".to_string()),
        )
        .await?;
        assert_eq!(saved.value, "true");

        let loaded = get_setting(&db, "auction_login_enabled").await?.unwrap();
        assert_eq!(loaded, saved);
        assert!(is_enabled(&db, "auction_login_enabled").await?);
        assert!(!is_enabled(&db, "missing_flag").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_existing_key() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, "k", "1", Some("first".to_string()), Some("a".to_string())).await?;
        let updated = set_setting(&db, "k", "2", None, Some("b".to_string())).await?;

        assert_eq!(updated.value, "2");
        assert_eq!(updated.description.as_deref(), Some("first"));
        assert_eq!(updated.updated_by.as_deref(), Some("b"));
        assert_eq!(list_settings(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_key_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_setting(&db, " ", "x", None, None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_setting() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, "k", "v", None, None).await?;
        assert!(delete_setting(&db, "k").await?);
        assert!(!delete_setting(&db, "k").await?);
        assert!(get_setting(&db, "k").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rates_default_without_overrides() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = active_commission_rates(&db, &CommissionRates::default()).await?;
        assert_eq!(rates, CommissionRates::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_rate_override() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, TRADER_RATE_KEY, "0.08", None, Some("admin".to_string())).await?;

        let rates = active_commission_rates(&db, &CommissionRates::default()).await?;
        assert_eq!(rates.farmer(), dec!(0.04));
        assert_eq!(rates.trader(), dec!(0.08));
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_rate_override() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, FARMER_RATE_KEY, "four percent", None, None).await?;
        let result = active_commission_rates(&db, &CommissionRates::default()).await;
        assert!(matches!(result, Err(Error::Config { .. })));

        set_setting(&db, FARMER_RATE_KEY, "1.2", None, None).await?;
        let result = active_commission_rates(&db, &CommissionRates::default()).await;
        assert!(matches!(result, Err(Error::InvalidRate { .. })));
        Ok(())
    }
}
