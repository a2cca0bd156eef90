//! Settlement calculation - commission and payable figures for a sale.
//!
//! The market committee deducts a commission from the farmer and adds one to the
//! trader, both as a percentage of the agreed base amount. Each commission is
//! rounded half-up to two places once, straight from the base amount. The payables
//! are the base minus or plus that invoiced commission, so `payable ± commission`
//! always reproduces the base; they only need rounding of their own when the base
//! carries fractions of a paisa. Batches are totalled by
//! adding the already-rounded per-sale figures, which keeps every printed invoice
//! reconcilable against the committee's daily report.
//!
//! Everything here is pure and synchronous.

use crate::{
    core::money::round2,
    entities::sale_record,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Commission fractions applied to every sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    farmer: Decimal,
    trader: Decimal,
}

impl CommissionRates {
    /// 4%, deducted from the farmer
    pub const DEFAULT_FARMER_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 2);
    /// 9%, added to the trader
    pub const DEFAULT_TRADER_RATE: Decimal = Decimal::from_parts(9, 0, 0, false, 2);

    /// Builds a rate table, rejecting rates outside `[0, 1)`.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` naming the first offending rate.
    pub fn new(farmer: Decimal, trader: Decimal) -> Result<Self> {
        for rate in [farmer, trader] {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(Error::InvalidRate {
                    rate: rate.to_string(),
                });
            }
        }
        Ok(Self { farmer, trader })
    }

    /// Fraction deducted from the farmer's side
    #[must_use]
    pub const fn farmer(&self) -> Decimal {
        self.farmer
    }

    /// Fraction added to the trader's side
    #[must_use]
    pub const fn trader(&self) -> Decimal {
        self.trader
    }
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            farmer: Self::DEFAULT_FARMER_RATE,
            trader: Self::DEFAULT_TRADER_RATE,
        }
    }
}

/// Settlement figures for a single sale, all in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Agreed sale value before commission
    pub base_amount: Decimal,
    /// Deducted from the farmer
    pub farmer_commission: Decimal,
    /// Added to the trader
    pub trader_commission: Decimal,
    /// What the farmer receives
    pub farmer_payable: Decimal,
    /// What the trader owes
    pub trader_payable: Decimal,
}

impl From<&sale_record::Model> for Settlement {
    fn from(sale: &sale_record::Model) -> Self {
        Self {
            base_amount: sale.base_amount(),
            farmer_commission: sale.farmer_commission(),
            trader_commission: sale.trader_commission(),
            farmer_payable: sale.farmer_payable(),
            trader_payable: sale.trader_payable(),
        }
    }
}

/// Calculates the settlement for a base amount using the default 4%/9% rates.
///
/// # Errors
/// Returns `Error::InvalidAmount` if `base_amount` is negative.
pub fn calculate_settlement(base_amount: Decimal) -> Result<Settlement> {
    calculate_settlement_with(base_amount, &CommissionRates::default())
}

/// Calculates the settlement for a base amount under the given rates.
///
/// # Errors
/// Returns `Error::InvalidAmount` if `base_amount` is negative, or so large that a
/// derived figure no longer fits in a `Decimal`.
pub fn calculate_settlement_with(
    base_amount: Decimal,
    rates: &CommissionRates,
) -> Result<Settlement> {
    let invalid = || Error::InvalidAmount {
        amount: base_amount.to_string(),
    };
    if base_amount.is_sign_negative() && !base_amount.is_zero() {
        return Err(invalid());
    }

    let farmer_commission = round2(base_amount.checked_mul(rates.farmer()).ok_or_else(invalid)?);
    let trader_commission = round2(base_amount.checked_mul(rates.trader()).ok_or_else(invalid)?);
    let farmer_payable = base_amount
        .checked_sub(farmer_commission)
        .ok_or_else(invalid)?;
    let trader_payable = base_amount
        .checked_add(trader_commission)
        .ok_or_else(invalid)?;

    Ok(Settlement {
        base_amount,
        farmer_commission,
        trader_commission,
        farmer_payable: round2(farmer_payable),
        trader_payable: round2(trader_payable),
    })
}

/// Calculates a settlement from a floating-point amount, as typed into a form.
///
/// The float is converted through its shortest decimal rendering, so `7200.1`
/// becomes exactly `7200.1` rather than its binary approximation.
///
/// # Errors
/// Returns `Error::InvalidAmount` if `base_amount` is negative, NaN, infinite, or
/// too large to represent as a decimal.
pub fn calculate_settlement_f64(base_amount: f64, rates: &CommissionRates) -> Result<Settlement> {
    if !base_amount.is_finite() || base_amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: base_amount.to_string(),
        });
    }

    let decimal = Decimal::from_str(&base_amount.to_string()).map_err(|_| Error::InvalidAmount {
        amount: base_amount.to_string(),
    })?;
    calculate_settlement_with(decimal, rates)
}

/// Field-by-field totals over a batch of settlements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTotals {
    /// Number of settlements added
    pub records: u64,
    /// Sum of base amounts
    pub base_amount: Decimal,
    /// Sum of farmer commissions
    pub farmer_commission: Decimal,
    /// Sum of trader commissions
    pub trader_commission: Decimal,
    /// Sum of farmer payables
    pub farmer_payable: Decimal,
    /// Sum of trader payables
    pub trader_payable: Decimal,
}

impl SettlementTotals {
    /// Adds one settlement's already-rounded figures to the running totals.
    pub fn add(&mut self, settlement: &Settlement) {
        self.records += 1;
        self.base_amount += settlement.base_amount;
        self.farmer_commission += settlement.farmer_commission;
        self.trader_commission += settlement.trader_commission;
        self.farmer_payable += settlement.farmer_payable;
        self.trader_payable += settlement.trader_payable;
    }

    /// Total commission the committee earns on the batch
    #[must_use]
    pub fn committee_income(&self) -> Decimal {
        self.farmer_commission + self.trader_commission
    }
}

/// Sums each field of the settlements independently (sum of rounded values).
#[must_use]
pub fn aggregate_settlements<'a, I>(settlements: I) -> SettlementTotals
where
    I: IntoIterator<Item = &'a Settlement>,
{
    let mut totals = SettlementTotals::default();
    for settlement in settlements {
        totals.add(settlement);
    }
    totals
}
