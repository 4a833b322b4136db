//! RTO rate table
//!
//! Road tax is levied per state, per fuel type and per ex-showroom price bracket.
//! A rate is either a percentage of the ex-showroom price or a fixed rupee amount.
//!
//! Brackets (inclusive upper bounds): `0-5L, 5-10L, 10-20L, 20-30L, 30-40L, 40L+`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::PricingError;

/// Upper bounds of the built-in price brackets; prices above the last bound
/// fall into the final, open-ended bracket.
pub const BUILTIN_BRACKET_UPPER_BOUNDS: [f64; 5] =
    [500_000.0, 1_000_000.0, 2_000_000.0, 3_000_000.0, 4_000_000.0];

/// State used when nothing else is configured
pub const BUILTIN_DEFAULT_STATE: &str = "MAHARASHTRA";

/// A single road-tax rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RtoRate {
    /// Percentage of the ex-showroom price
    Percent(f64),
    /// Fixed amount in rupees
    Fixed(f64),
}

impl RtoRate {
    /// RTO charges for the given ex-showroom price
    pub fn apply(&self, ex_showroom_price: f64) -> f64 {
        match self {
            Self::Percent(pct) => ex_showroom_price * pct / 100.0,
            Self::Fixed(amount) => *amount,
        }
    }

    fn value(&self) -> f64 {
        match self {
            Self::Percent(v) | Self::Fixed(v) => *v,
        }
    }
}

/// Fuel categories the rate table distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    #[serde(rename = "CNG")]
    Cng,
    Electric,
}

impl FuelType {
    /// Parse free-form fuel labels ("Petrol", "diesel", "CNG", "EV", "Petrol + CNG" ...).
    ///
    /// Matching is by substring in a fixed order, so "Petrol + CNG" is Petrol.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.contains("petrol") || label.contains("gasoline") {
            Some(Self::Petrol)
        } else if label.contains("diesel") {
            Some(Self::Diesel)
        } else if label.contains("cng") || label.contains("gas") {
            Some(Self::Cng)
        } else if label.contains("electric") || label.contains("ev") {
            Some(Self::Electric)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Cng => "CNG",
            Self::Electric => "Electric",
        }
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-fuel rate rows of one state (one entry per price bracket)
#[derive(Debug, Clone)]
pub struct StateRates {
    pub petrol: Vec<RtoRate>,
    pub diesel: Vec<RtoRate>,
    pub cng: Vec<RtoRate>,
    pub electric: Vec<RtoRate>,
}

impl StateRates {
    pub fn row(&self, fuel: FuelType) -> &[RtoRate] {
        match fuel {
            FuelType::Petrol => &self.petrol,
            FuelType::Diesel => &self.diesel,
            FuelType::Cng => &self.cng,
            FuelType::Electric => &self.electric,
        }
    }

    fn rows(&self) -> [(FuelType, &[RtoRate]); 4] {
        [
            (FuelType::Petrol, &self.petrol),
            (FuelType::Diesel, &self.diesel),
            (FuelType::Cng, &self.cng),
            (FuelType::Electric, &self.electric),
        ]
    }
}

/// Immutable state -> fuel -> bracket rate table
#[derive(Debug, Clone)]
pub struct RateTable {
    bracket_upper_bounds: Vec<f64>,
    states: HashMap<String, StateRates>,
    default_state: String,
}

impl RateTable {
    /// Build and validate a table.
    ///
    /// Every row must have exactly `bracket_upper_bounds.len() + 1` entries,
    /// bounds must be strictly ascending and all rates non-negative.
    pub fn new(
        bracket_upper_bounds: Vec<f64>,
        states: HashMap<String, StateRates>,
        default_state: &str,
    ) -> Result<Self, PricingError> {
        if bracket_upper_bounds.windows(2).any(|w| w[0] >= w[1])
            || bracket_upper_bounds.iter().any(|b| !b.is_finite() || *b <= 0.0)
        {
            return Err(PricingError::InvalidRateTable(
                "bracket upper bounds must be positive and strictly ascending".to_string(),
            ));
        }

        let expected = bracket_upper_bounds.len() + 1;
        let mut normalized = HashMap::with_capacity(states.len());
        for (name, rates) in states {
            for (fuel, row) in rates.rows() {
                if row.len() != expected {
                    return Err(PricingError::InvalidRateTable(format!(
                        "{} {} has {} rates, expected {}",
                        name,
                        fuel,
                        row.len(),
                        expected
                    )));
                }
                if row.iter().any(|r| !r.value().is_finite() || r.value() < 0.0) {
                    return Err(PricingError::InvalidRateTable(format!(
                        "{} {} contains a negative or non-finite rate",
                        name, fuel
                    )));
                }
            }
            let key = resolve_alias(normalize_state_key(&name));
            if normalized.contains_key(&key) {
                return Err(PricingError::InvalidRateTable(format!(
                    "{} duplicates another entry for state {}",
                    name, key
                )));
            }
            normalized.insert(key, rates);
        }

        let default_key = resolve_alias(normalize_state_key(default_state));
        if !normalized.contains_key(&default_key) {
            return Err(PricingError::InvalidRateTable(format!(
                "default state '{}' is not in the rate table",
                default_state
            )));
        }

        Ok(Self {
            bracket_upper_bounds,
            states: normalized,
            default_state: default_key,
        })
    }

    /// The built-in table (RTO sheet dated 2024-11-28)
    pub fn builtin() -> Self {
        let states = BUILTIN_RATES
            .iter()
            .map(|(name, petrol, diesel, cng, electric)| {
                (
                    resolve_alias(normalize_state_key(name)),
                    StateRates {
                        petrol: petrol.to_vec(),
                        diesel: diesel.to_vec(),
                        cng: cng.to_vec(),
                        electric: electric.to_vec(),
                    },
                )
            })
            .collect();

        Self {
            bracket_upper_bounds: BUILTIN_BRACKET_UPPER_BOUNDS.to_vec(),
            states,
            default_state: BUILTIN_DEFAULT_STATE.to_string(),
        }
    }

    /// Load a table from a TOML file.
    ///
    /// ```toml
    /// bracket_upper_bounds = [500000, 1000000, 2000000, 3000000, 4000000]
    ///
    /// [states.MAHARASHTRA]
    /// petrol = [12.22, 11.76, 12.66, 13.83, 13.55, 13.31]
    /// diesel = [13, 13, 14, 15, 15, 15]
    /// cng = [7, 7, 8, 9, 9, 9]
    /// electric = ["3060", "3060", "5100", "12240", "25500", "25500"]
    /// ```
    ///
    /// Numbers are percentages, strings are fixed rupee amounts.
    pub fn from_toml_file(path: &Path, default_state: &str) -> Result<Self, PricingError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PricingError::InvalidRateTable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content, default_state)
    }

    pub fn from_toml_str(content: &str, default_state: &str) -> Result<Self, PricingError> {
        let file: RateTableFile = toml::from_str(content)
            .map_err(|e| PricingError::InvalidRateTable(format!("Failed to parse rate table: {}", e)))?;

        let mut states = HashMap::with_capacity(file.states.len());
        for (name, rows) in file.states {
            states.insert(
                name.clone(),
                StateRates {
                    petrol: convert_row(&name, rows.petrol)?,
                    diesel: convert_row(&name, rows.diesel)?,
                    cng: convert_row(&name, rows.cng)?,
                    electric: convert_row(&name, rows.electric)?,
                },
            );
        }

        Self::new(file.bracket_upper_bounds, states, default_state)
    }

    /// Replace the fallback state
    pub fn with_default_state(mut self, state: &str) -> Result<Self, PricingError> {
        let key = resolve_alias(normalize_state_key(state));
        if !self.states.contains_key(&key) {
            return Err(PricingError::UnknownState(state.to_string()));
        }
        self.default_state = key;
        Ok(self)
    }

    /// Find a state's rates by any accepted spelling.
    pub fn lookup(&self, state: &str) -> Option<(&str, &StateRates)> {
        let key = resolve_alias(normalize_state_key(state));
        self.states
            .get_key_value(&key)
            .map(|(name, rates)| (name.as_str(), rates))
    }

    pub fn default_state(&self) -> (&str, &StateRates) {
        let rates = &self.states[&self.default_state];
        (self.default_state.as_str(), rates)
    }

    /// Index of the bracket containing the price
    pub fn bracket_index(&self, ex_showroom_price: f64) -> usize {
        self.bracket_upper_bounds
            .iter()
            .position(|upper| ex_showroom_price <= *upper)
            .unwrap_or(self.bracket_upper_bounds.len())
    }

    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Deserialize)]
struct RateTableFile {
    bracket_upper_bounds: Vec<f64>,
    states: HashMap<String, StateRatesFile>,
}

#[derive(Deserialize)]
struct StateRatesFile {
    petrol: Vec<RateValue>,
    diesel: Vec<RateValue>,
    cng: Vec<RateValue>,
    electric: Vec<RateValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RateValue {
    Percent(f64),
    Fixed(String),
}

fn convert_row(state: &str, row: Vec<RateValue>) -> Result<Vec<RtoRate>, PricingError> {
    row.into_iter()
        .map(|value| match value {
            RateValue::Percent(pct) => Ok(RtoRate::Percent(pct)),
            RateValue::Fixed(amount) => amount.trim().parse::<f64>().map(RtoRate::Fixed).map_err(|_| {
                PricingError::InvalidRateTable(format!(
                    "{}: fixed amount '{}' is not a number",
                    state, amount
                ))
            }),
        })
        .collect()
}

/// Canonical lookup key for a state name.
///
/// Accepts "City, State" labels, is case-insensitive, treats "AND" as "&"
/// and ignores a trailing "(UT)".
pub fn normalize_state_key(input: &str) -> String {
    let state = match input.rsplit_once(',') {
        Some((_, state)) => state,
        None => input,
    };
    let upper = state.trim().to_uppercase();
    let upper = upper.trim_end_matches("(UT)");

    upper
        .split_whitespace()
        .map(|word| if word == "AND" { "&" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_alias(key: String) -> String {
    let canonical = match key.as_str() {
        "DELHI" | "NEW DELHI" | "NCT OF DELHI" | "NCT DELHI" => "THE GOV OF NCT OF DELHI",
        "ANDAMAN & NICOBAR" | "ANDAMAN & NICOBAR ISLANDS" => "ANDAMAN & NICOBAR ISLAND",
        "ORISSA" => "ODISHA",
        "PONDICHERRY" => "PUDUCHERRY",
        "DADRA & NAGAR HAVELI & DAMAN & DIU" => "DADRA & NAGAR HAVELI",
        "J&K" => "JAMMU & KASHMIR",
        _ => return key,
    };
    canonical.to_string()
}

use RtoRate::{Fixed as F, Percent as P};

type Row = [RtoRate; 6];

#[rustfmt::skip]
const BUILTIN_RATES: &[(&str, Row, Row, Row, Row)] = &[
    // state, petrol, diesel, cng, electric
    ("ANDHRA PRADESH",
        [P(13.0), P(14.0), P(17.0), P(18.0), P(18.0), P(18.0)],
        [P(13.0), P(14.0), P(17.0), P(18.0), P(18.0), P(18.0)],
        [P(14.84), P(14.84), P(17.78), P(17.78), P(17.78), P(17.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("ARUNACHAL PRADESH",
        [P(2.0), P(3.0), P(3.0), P(5.0), P(5.0), P(5.0)],
        [P(2.0), P(3.0), P(3.0), P(5.0), P(5.0), P(5.0)],
        [P(3.84), P(3.84), P(4.78), P(4.78), P(4.78), P(4.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("ASSAM",
        [P(5.0), P(6.0), P(8.0), P(12.0), P(14.0), P(14.0)],
        [P(10.9), P(10.9), P(10.75), P(14.53), P(14.71), P(14.58)],
        [P(10.84), P(10.84), P(10.70), P(10.70), P(10.70), P(10.70)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("BIHAR",
        [P(10.18), P(10.17), P(9.42), P(8.0), P(7.82), P(7.95)],
        [P(9.0), P(9.0), P(12.0), P(12.0), P(12.0), P(12.0)],
        [P(9.0), P(9.0), P(12.0), P(12.0), P(12.0), P(12.0)],
        [P(9.62), P(9.62), P(12.66), P(12.48), P(12.81), P(12.51)]),
    ("CHHATTISGARH",
        [P(9.0), P(10.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(9.0), P(10.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(9.0), P(10.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(5.20), P(5.20), P(5.0), P(5.40), P(5.81), P(5.51)]),
    ("GOA",
        [P(9.0), P(9.0), P(12.80), P(16.78), P(16.31), P(17.08)],
        [P(9.0), P(9.0), P(12.83), P(16.78), P(16.3), P(17.0)],
        [P(9.0), P(9.0), P(12.83), P(16.78), P(16.31), P(17.0)],
        [F(5000.0), F(5000.0), F(27000.0), F(62000.0), F(75000.0), F(75000.0)]),
    ("GUJARAT",
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [P(6.34), P(6.34), P(6.38), P(6.19), P(6.53), P(6.22)]),
    ("HARYANA",
        [P(5.0), P(8.0), P(8.0), P(10.0), P(10.0), P(10.0)],
        [P(5.0), P(8.0), P(8.0), P(10.0), P(10.0), P(10.0)],
        [P(4.0), P(6.40), P(6.40), P(8.0), P(8.0), P(8.0)],
        [P(2.69), P(2.69), P(2.21), P(10.48), P(10.88), P(10.51)]),
    ("HIMACHAL PRADESH",
        [P(6.6), P(6.6), P(6.5), P(7.5), P(7.5), P(7.5)],
        [P(6.6), P(6.6), P(7.7), P(7.7), P(7.7), P(7.7)],
        [P(6.60), P(6.60), P(7.70), P(7.70), P(7.70), P(7.70)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("JHARKHAND",
        [P(8.0), P(7.65), P(9.81), P(9.19), P(9.09), P(9.56)],
        [P(9.0), P(9.0), P(9.0), P(9.12), P(9.71), P(9.19)],
        [P(7.85), P(7.85), P(9.40), P(9.40), P(9.40), P(9.40)],
        [P(9.61), P(9.61), P(9.16), P(9.48), P(9.81), P(9.51)]),
    ("KARNATAKA",
        [P(15.33), P(16.13), P(16.05), P(19.13), P(18.81), P(21.09)],
        [P(14.60), P(15.66), P(18.92), P(20.0), P(20.0), P(20.0)],
        [P(15.01), P(15.01), P(17.85), P(17.85), P(17.85), P(17.85)],
        [F(6000.0), F(6000.0), F(13000.0), F(13000.0), F(11850.0), F(11530.0)]),
    ("KERALA",
        [P(10.50), P(13.33), P(13.28), P(15.70), P(22.70), P(22.50)],
        [P(13.2), P(13.2), P(15.0), P(22.5), P(22.0), P(22.5)],
        [P(13.84), P(13.84), P(17.14), P(17.14), P(17.14), P(17.14)],
        [P(5.0), P(5.0), P(5.66), P(5.48), P(5.81), P(5.51)]),
    ("MADHYA PRADESH",
        [P(8.60), P(8.0), P(10.61), P(14.56), P(14.78), P(14.56)],
        [P(10.0), P(10.0), P(12.0), P(16.0), P(16.0), P(16.0)],
        [P(8.0), P(8.0), P(10.0), P(14.0), P(14.0), P(14.0)],
        [P(4.62), P(4.62), P(4.66), P(4.48), P(4.81), P(4.51)]),
    ("MAHARASHTRA",
        [P(12.22), P(11.76), P(12.66), P(13.83), P(13.55), P(13.31)],
        [P(13.0), P(13.0), P(14.0), P(15.0), P(15.0), P(15.0)],
        [P(7.0), P(7.0), P(8.0), P(9.0), P(9.0), P(9.0)],
        [F(3060.0), F(3060.0), F(5100.0), F(12240.0), F(25500.0), F(25500.0)]),
    ("MANIPUR",
        [P(5.80), P(6.66), P(7.61), P(8.56), P(8.41), P(8.56)],
        [P(5.0), P(6.0), P(7.0), P(8.0), P(8.0), P(8.0)],
        [P(5.0), P(6.0), P(8.0), P(8.0), P(8.0), P(8.0)],
        [P(5.42), P(5.42), P(7.06), P(6.88), P(7.21), P(7.0)]),
    ("MEGHALAYA",
        [P(6.82), P(6.66), P(6.60), P(10.49), P(10.78), P(10.56)],
        [P(6.0), P(6.0), P(6.0), P(11.0), P(11.0), P(11.0)],
        [P(6.84), P(6.84), P(8.78), P(8.78), P(8.78), P(8.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("MIZORAM",
        [P(6.82), P(6.77), P(6.66), P(6.49), P(6.78), P(6.56)],
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(12000.0), F(12000.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("NAGALAND",
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [P(6.0), P(6.0), P(6.0), P(6.0), P(6.0), P(6.0)],
        [P(6.84), P(6.84), P(6.78), P(6.78), P(6.78), P(6.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("ODISHA",
        [P(6.50), P(8.30), P(10.0), P(10.0), P(10.0), P(10.50)],
        [P(8.4), P(8.4), P(10.2), P(10.5), P(10.0), P(10.0)],
        [P(8.84), P(8.84), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(1.64), P(1.64), P(1.64), P(12.0), P(25.0), P(25.0)]),
    ("PUNJAB",
        [P(8.90), P(8.75), P(8.36), P(8.49), P(8.69), P(8.56)],
        [P(10.5), P(10.5), P(10.5), P(13.0), P(14.0), P(14.0)],
        [P(10.5), P(10.5), P(13.0), P(14.0), P(14.0), P(14.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("RAJASTHAN",
        [P(9.82), P(9.77), P(9.61), P(10.49), P(12.69), P(10.56)],
        [P(10.0), P(10.12), P(10.12), P(10.12), P(10.12), P(10.12)],
        [P(5.60), P(5.60), P(5.60), P(5.60), P(5.60), P(5.60)],
        [F(2200.0), F(2200.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("SIKKIM",
        [F(16000.0), F(16000.0), F(16000.0), F(16000.0), F(16000.0), F(16000.0)],
        [F(16000.0), F(16000.0), F(16000.0), F(16000.0), F(16000.0), F(16000.0)],
        [F(1600.0), F(1600.0), F(1600.0), F(1600.0), F(1600.0), F(1600.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("TAMIL NADU",
        [P(12.0), P(13.0), P(18.0), P(20.0), P(20.0), P(20.0)],
        [P(12.0), P(13.0), P(18.0), P(20.0), P(20.0), P(20.0)],
        [P(12.0), P(13.0), P(18.0), P(20.0), P(20.0), P(20.0)],
        [F(6500.0), F(6500.0), F(13500.0), F(13500.0), F(26500.0), F(26500.0)]),
    ("TELANGANA",
        [P(13.82), P(14.70), P(17.61), P(18.50), P(18.69), P(18.56)],
        [P(13.4), P(14.2), P(17.0), P(18.5), P(18.0), P(18.0)],
        [P(14.84), P(14.84), P(17.78), P(17.78), P(17.78), P(17.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("TRIPURA",
        [P(3.0), P(3.5), P(4.0), P(4.0), P(4.0), P(4.0)],
        [P(3.0), P(3.5), P(4.0), P(4.0), P(4.0), P(4.0)],
        [P(3.0), P(1.50), P(4.0), P(4.0), P(4.0), P(4.0)],
        [P(3.20), P(3.20), P(3.66), P(3.48), P(3.81), P(3.51)]),
    ("UTTARAKHAND",
        [P(8.0), P(9.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(8.0), P(9.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(8.0), P(9.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("UTTAR PRADESH",
        [P(8.0), P(8.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(7.0), P(7.0), P(7.0), P(7.0), P(7.0), P(7.0)],
        [P(8.0), P(8.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("WEST BENGAL",
        [P(15.7), P(10.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(13.7), P(10.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(12.78), P(9.30), P(9.30), P(9.30), P(9.30), P(9.60)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("ANDAMAN & NICOBAR ISLAND",
        [P(10.5), P(10.5), P(10.5), P(10.5), P(10.5), P(10.5)],
        [P(10.5), P(10.5), P(10.5), P(10.5), P(10.5), P(10.5)],
        [P(1.25), P(1.25), P(1.0), P(1.0), P(1.0), P(1.0)],
        [F(9500.0), F(9500.0), F(16500.0), F(16500.0), F(29500.0), F(29500.0)]),
    ("CHANDIGARH (UT)",
        [P(8.41), P(8.18), P(7.96), P(8.49), P(8.41), P(9.64)],
        [P(7.91), P(7.91), P(7.42), P(8.23), P(8.18), P(8.07)],
        [P(8.60), P(8.60), P(7.08), P(7.08), P(7.08), P(7.08)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(27150.0)]),
    ("DADRA & NAGAR HAVELI (UT)",
        [P(10.5), P(10.5), P(10.5), P(10.5), P(10.5), P(10.5)],
        [P(3.40), P(3.40), P(3.75), P(3.50), P(3.71), P(3.58)],
        [P(3.34), P(3.34), P(3.78), P(3.78), P(3.78), P(3.78)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("THE GOV OF NCT OF DELHI (UT)",
        [P(4.0), P(7.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [P(5.0), P(8.7), P(12.5), P(12.5), P(12.5), P(12.5)],
        [P(4.0), P(7.0), P(10.0), P(10.0), P(10.0), P(10.0)],
        [F(9000.0), F(9000.0), F(10000.0), F(16000.0), F(29000.0), F(29000.0)]),
    ("JAMMU & KASHMIR (UT)",
        [F(1200.0), F(1200.0), F(1200.0), F(1200.0), F(1200.0), F(1200.0)],
        [F(1200.0), F(1200.0), F(1200.0), F(1200.0), F(1200.0), F(1200.0)],
        [P(9.84), P(9.84), P(9.78), P(9.78), P(9.78), P(9.78)],
        [F(1550.0), F(1550.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
    ("LAKSHADWEEP (UT)",
        [P(10.8), P(13.0), P(15.0), P(22.5), P(22.5), P(22.5)],
        [P(13.2), P(13.2), P(15.0), P(22.5), P(22.0), P(22.5)],
        [P(13.84), P(13.84), P(17.14), P(17.14), P(17.14), P(17.14)],
        [P(5.0), P(5.0), P(5.66), P(5.48), P(5.81), P(5.51)]),
    ("PUDUCHERRY (UT)",
        [P(13.17), P(4.77), P(7.61), P(7.49), P(7.78), P(7.56)],
        [P(4.0), P(4.0), P(7.0), P(7.0), P(7.0), P(7.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(12000.0), F(12000.0)],
        [F(5000.0), F(5000.0), F(12000.0), F(12000.0), F(25000.0), F(25000.0)]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let builtin = RateTable::builtin();
        let states: HashMap<String, StateRates> = builtin
            .states
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let rebuilt = RateTable::new(BUILTIN_BRACKET_UPPER_BOUNDS.to_vec(), states, BUILTIN_DEFAULT_STATE);
        assert!(rebuilt.is_ok());
        assert_eq!(builtin.state_names().len(), BUILTIN_RATES.len());
    }

    #[test]
    fn test_bracket_index_uses_inclusive_upper_bounds() {
        let table = RateTable::builtin();
        assert_eq!(table.bracket_index(1.0), 0);
        assert_eq!(table.bracket_index(500_000.0), 0);
        assert_eq!(table.bracket_index(500_001.0), 1);
        assert_eq!(table.bracket_index(1_000_000.0), 1);
        assert_eq!(table.bracket_index(1_200_000.0), 2);
        assert_eq!(table.bracket_index(4_000_000.0), 4);
        assert_eq!(table.bracket_index(9_000_000.0), 5);
    }

    #[test]
    fn test_state_lookup_spellings() {
        let table = RateTable::builtin();

        assert_eq!(table.lookup("Maharashtra").map(|(k, _)| k), Some("MAHARASHTRA"));
        assert_eq!(table.lookup("  tamil   nadu ").map(|(k, _)| k), Some("TAMIL NADU"));
        assert_eq!(table.lookup("Mumbai, Maharashtra").map(|(k, _)| k), Some("MAHARASHTRA"));
        assert_eq!(table.lookup("Delhi").map(|(k, _)| k), Some("THE GOV OF NCT OF DELHI"));
        assert_eq!(table.lookup("Jammu and Kashmir").map(|(k, _)| k), Some("JAMMU & KASHMIR"));
        assert_eq!(table.lookup("Chandigarh").map(|(k, _)| k), Some("CHANDIGARH"));
        assert!(table.lookup("Atlantis").is_none());
    }

    #[test]
    fn test_fuel_type_parse() {
        assert_eq!(FuelType::parse("Petrol"), Some(FuelType::Petrol));
        assert_eq!(FuelType::parse("DIESEL"), Some(FuelType::Diesel));
        assert_eq!(FuelType::parse("cng"), Some(FuelType::Cng));
        assert_eq!(FuelType::parse("EV"), Some(FuelType::Electric));
        assert_eq!(FuelType::parse("Electric"), Some(FuelType::Electric));
        assert_eq!(FuelType::parse("Petrol + CNG"), Some(FuelType::Petrol));
        assert_eq!(FuelType::parse("Hybrid"), None);
        assert_eq!(FuelType::parse(""), None);
    }

    #[test]
    fn test_rate_apply() {
        assert_eq!(RtoRate::Percent(10.0).apply(1_000_000.0), 100_000.0);
        assert_eq!(RtoRate::Fixed(5000.0).apply(1_000_000.0), 5000.0);
    }

    #[test]
    fn test_from_toml_str() {
        let content = r#"
            bracket_upper_bounds = [1000000]

            [states."Test State"]
            petrol = [10, 12.5]
            diesel = [11, 13]
            cng = [5, 6]
            electric = ["2500", "5000"]
        "#;

        let table = RateTable::from_toml_str(content, "test state").unwrap();
        let (name, rates) = table.lookup("TEST STATE").unwrap();
        assert_eq!(name, "TEST STATE");
        assert_eq!(rates.petrol, vec![RtoRate::Percent(10.0), RtoRate::Percent(12.5)]);
        assert_eq!(rates.electric[1], RtoRate::Fixed(5000.0));
        assert_eq!(table.bracket_index(2_000_000.0), 1);
    }

    #[test]
    fn test_from_toml_rejects_wrong_row_length() {
        let content = r#"
            bracket_upper_bounds = [1000000]

            [states.GOA]
            petrol = [10]
            diesel = [11, 13]
            cng = [5, 6]
            electric = [1, 2]
        "#;

        let err = RateTable::from_toml_str(content, "GOA").unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_file_keys_accept_alias_spellings() {
        let content = r#"
            bracket_upper_bounds = []

            [states.Delhi]
            petrol = [4]
            diesel = [5]
            cng = [4]
            electric = ["9000"]

            [states.Orissa]
            petrol = [6.5]
            diesel = [8.4]
            cng = [8.84]
            electric = [1.64]
        "#;

        let table = RateTable::from_toml_str(content, "Delhi").unwrap();
        assert_eq!(table.state_names(), vec!["ODISHA", "THE GOV OF NCT OF DELHI"]);
        assert_eq!(table.default_state().0, "THE GOV OF NCT OF DELHI");

        let (name, rates) = table.lookup("New Delhi").unwrap();
        assert_eq!(name, "THE GOV OF NCT OF DELHI");
        assert_eq!(rates.petrol, vec![RtoRate::Percent(4.0)]);
        assert_eq!(table.lookup("odisha").map(|(k, _)| k), Some("ODISHA"));
    }

    #[test]
    fn test_file_keys_naming_the_same_state_rejected() {
        let content = r#"
            bracket_upper_bounds = []

            [states.Pondicherry]
            petrol = [13]
            diesel = [4]
            cng = [4]
            electric = [5]

            [states."Puducherry (UT)"]
            petrol = [13]
            diesel = [4]
            cng = [4]
            electric = [5]
        "#;

        let err = RateTable::from_toml_str(content, "Puducherry").unwrap_err();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn test_unknown_default_state_rejected() {
        let content = r#"
            bracket_upper_bounds = []

            [states.GOA]
            petrol = [10]
            diesel = [11]
            cng = [5]
            electric = [1]
        "#;

        assert!(RateTable::from_toml_str(content, "Kerala").is_err());
        assert!(RateTable::builtin().with_default_state("Atlantis").is_err());
    }
}
