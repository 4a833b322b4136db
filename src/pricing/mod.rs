//! On-road price calculation
//!
//! Turns an ex-showroom price into the full on-road breakup: RTO road tax,
//! road-safety cess, insurance, TCS and the fixed statutory fees. Everything
//! here is pure; the calculator holds only immutable tables.

pub mod calculator;
pub mod format;
pub mod rates;

pub use calculator::{
    calculate_on_road_price, ChargeSchedule, FuelRates, OnRoadPriceCalculator, PriceBreakup,
    PriceOptions, UnknownInputPolicy,
};
pub use format::{format_indian_price, format_lakh};
pub use rates::{FuelType, RateTable, RtoRate, StateRates};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("ex-showroom price must be a positive number, got {0}")]
    InvalidPrice(f64),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("unknown fuel type '{0}'")]
    UnknownFuelType(String),

    #[error("invalid rate table: {0}")]
    InvalidRateTable(String),
}
