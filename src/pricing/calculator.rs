use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::warn;

use super::rates::{FuelType, RateTable};
use super::PricingError;

/// What to do with a state or fuel type the rate table doesn't know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownInputPolicy {
    /// Use the default state / Petrol rates and flag the breakup
    #[default]
    Fallback,
    /// Fail with `UnknownState` / `UnknownFuelType`
    Reject,
}

/// A value per fuel type
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FuelRates {
    pub petrol: f64,
    pub diesel: f64,
    pub cng: f64,
    pub electric: f64,
}

impl FuelRates {
    pub fn uniform(value: f64) -> Self {
        Self {
            petrol: value,
            diesel: value,
            cng: value,
            electric: value,
        }
    }

    pub fn get(&self, fuel: FuelType) -> f64 {
        match fuel {
            FuelType::Petrol => self.petrol,
            FuelType::Diesel => self.diesel,
            FuelType::Cng => self.cng,
            FuelType::Electric => self.electric,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.petrol, self.diesel, self.cng, self.electric]
    }
}

/// Charges applied on top of the RTO tax
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSchedule {
    /// Percent of the RTO charges
    pub road_safety_cess_percent: f64,
    /// Percent of the ex-showroom price
    pub insurance_percent: FuelRates,
    /// TCS applies strictly above this price
    pub tcs_threshold: f64,
    pub tcs_percent: f64,
    pub other_charges: f64,
    pub hypothecation_fee: f64,
    pub fastag_fee: f64,
}

impl Default for ChargeSchedule {
    fn default() -> Self {
        Self {
            road_safety_cess_percent: 2.0,
            insurance_percent: FuelRates::uniform(4.6),
            tcs_threshold: 999_000.0,
            tcs_percent: 1.0,
            other_charges: 2000.0,
            hypothecation_fee: 1500.0,
            fastag_fee: 500.0,
        }
    }
}

impl ChargeSchedule {
    pub fn validate(&self) -> Result<(), PricingError> {
        let mut values = vec![
            ("road_safety_cess_percent", self.road_safety_cess_percent),
            ("tcs_threshold", self.tcs_threshold),
            ("tcs_percent", self.tcs_percent),
            ("other_charges", self.other_charges),
            ("hypothecation_fee", self.hypothecation_fee),
            ("fastag_fee", self.fastag_fee),
        ];
        values.extend(
            self.insurance_percent
                .values()
                .into_iter()
                .map(|v| ("insurance_percent", v)),
        );

        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(PricingError::InvalidRateTable(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Optional fees the buyer can decline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOptions {
    pub hypothecation: bool,
    pub fastag: bool,
}

impl Default for PriceOptions {
    fn default() -> Self {
        Self {
            hypothecation: true,
            fastag: true,
        }
    }
}

/// Itemized on-road price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakup {
    pub ex_showroom_price: f64,
    pub rto_charges: f64,
    pub road_safety_tax: f64,
    pub insurance: f64,
    pub tcs: f64,
    pub other_charges: f64,
    pub hypothecation: f64,
    #[serde(rename = "fasTag")]
    pub fastag: f64,
    pub total_on_road_price: f64,
    /// Rate-table state actually applied
    pub state: String,
    pub fuel_type: FuelType,
    pub state_fallback: bool,
    pub fuel_type_fallback: bool,
}

impl PriceBreakup {
    /// Sum of every component plus the ex-showroom price
    pub fn calculate_total(&mut self) {
        self.total_on_road_price = self.ex_showroom_price
            + self.rto_charges
            + self.road_safety_tax
            + self.insurance
            + self.tcs
            + self.other_charges
            + self.hypothecation
            + self.fastag;
    }

    pub fn used_fallback(&self) -> bool {
        self.state_fallback || self.fuel_type_fallback
    }
}

/// Price calculator bound to one rate table and charge schedule
#[derive(Debug, Clone)]
pub struct OnRoadPriceCalculator {
    table: RateTable,
    schedule: ChargeSchedule,
    policy: UnknownInputPolicy,
}

impl OnRoadPriceCalculator {
    pub fn new(
        table: RateTable,
        schedule: ChargeSchedule,
        policy: UnknownInputPolicy,
    ) -> Result<Self, PricingError> {
        schedule.validate()?;
        Ok(Self {
            table,
            schedule,
            policy,
        })
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn schedule(&self) -> &ChargeSchedule {
        &self.schedule
    }

    pub fn calculate(
        &self,
        ex_showroom_price: f64,
        state: &str,
        fuel_type: &str,
        options: PriceOptions,
    ) -> Result<PriceBreakup, PricingError> {
        if !ex_showroom_price.is_finite() || ex_showroom_price <= 0.0 {
            return Err(PricingError::InvalidPrice(ex_showroom_price));
        }

        let (state_name, state_rates, state_fallback) = match self.table.lookup(state) {
            Some((name, rates)) => (name, rates, false),
            None => match self.policy {
                UnknownInputPolicy::Reject => {
                    return Err(PricingError::UnknownState(state.to_string()))
                }
                UnknownInputPolicy::Fallback => {
                    let (name, rates) = self.table.default_state();
                    warn!(state = %state, fallback = %name, "Unknown state, using default rates");
                    (name, rates, true)
                }
            },
        };

        let (fuel, fuel_type_fallback) = match FuelType::parse(fuel_type) {
            Some(fuel) => (fuel, false),
            None => match self.policy {
                UnknownInputPolicy::Reject => {
                    return Err(PricingError::UnknownFuelType(fuel_type.to_string()))
                }
                UnknownInputPolicy::Fallback => {
                    warn!(fuel_type = %fuel_type, "Unknown fuel type, using Petrol rates");
                    (FuelType::Petrol, true)
                }
            },
        };

        let bracket = self.table.bracket_index(ex_showroom_price);
        let schedule = &self.schedule;

        let rto_charges = state_rates.row(fuel)[bracket].apply(ex_showroom_price);
        let road_safety_tax = rto_charges * schedule.road_safety_cess_percent / 100.0;
        let insurance = ex_showroom_price * schedule.insurance_percent.get(fuel) / 100.0;
        let tcs = if ex_showroom_price > schedule.tcs_threshold {
            ex_showroom_price * schedule.tcs_percent / 100.0
        } else {
            0.0
        };

        let mut breakup = PriceBreakup {
            ex_showroom_price,
            rto_charges,
            road_safety_tax,
            insurance,
            tcs,
            other_charges: schedule.other_charges,
            hypothecation: if options.hypothecation {
                schedule.hypothecation_fee
            } else {
                0.0
            },
            fastag: if options.fastag { schedule.fastag_fee } else { 0.0 },
            total_on_road_price: 0.0,
            state: state_name.to_string(),
            fuel_type: fuel,
            state_fallback,
            fuel_type_fallback,
        };
        breakup.calculate_total();

        Ok(breakup)
    }
}

impl Default for OnRoadPriceCalculator {
    fn default() -> Self {
        Self {
            table: RateTable::builtin(),
            schedule: ChargeSchedule::default(),
            policy: UnknownInputPolicy::Fallback,
        }
    }
}

/// Price breakup with the built-in rate table and default charges
pub fn calculate_on_road_price(
    ex_showroom_price: f64,
    state: &str,
    fuel_type: &str,
) -> Result<PriceBreakup, PricingError> {
    static DEFAULT: OnceLock<OnRoadPriceCalculator> = OnceLock::new();
    DEFAULT
        .get_or_init(OnRoadPriceCalculator::default)
        .calculate(ex_showroom_price, state, fuel_type, PriceOptions::default())
}
