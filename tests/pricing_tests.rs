/// Integration tests for the on-road price calculator
use car_catalog::config::PricingConfig;
use car_catalog::pricing::{
    calculate_on_road_price, format_indian_price, FuelType, OnRoadPriceCalculator, PriceOptions,
    PricingError, UnknownInputPolicy,
};

fn component_sum(b: &car_catalog::pricing::PriceBreakup) -> f64 {
    b.ex_showroom_price
        + b.rto_charges
        + b.road_safety_tax
        + b.insurance
        + b.tcs
        + b.other_charges
        + b.hypothecation
        + b.fastag
}

#[test]
fn test_maharashtra_petrol_reference_quote() {
    let breakup = calculate_on_road_price(1_200_000.0, "Maharashtra", "Petrol").unwrap();

    assert_eq!(breakup.ex_showroom_price, 1_200_000.0);
    assert!(breakup.total_on_road_price > 1_200_000.0);
    assert_eq!(format_indian_price(breakup.total_on_road_price), "14,26,158");
}

#[test]
fn test_total_is_exact_sum_and_never_below_price() {
    let states = ["Maharashtra", "Karnataka", "Delhi", "Tamil Nadu", "Goa", "Kerala"];
    let fuels = ["Petrol", "Diesel", "CNG", "Electric"];
    let prices = [1.0, 99_999.0, 450_000.0, 999_000.0, 999_001.0, 1_800_000.0, 7_500_000.0];

    for state in states {
        for fuel in fuels {
            for price in prices {
                let b = calculate_on_road_price(price, state, fuel).unwrap();
                assert_eq!(b.total_on_road_price, component_sum(&b), "{} {} {}", state, fuel, price);
                assert!(b.total_on_road_price >= price, "{} {} {}", state, fuel, price);
                assert!(!b.used_fallback());
            }
        }
    }
}

#[test]
fn test_tcs_only_above_threshold() {
    let at = calculate_on_road_price(999_000.0, "Karnataka", "Diesel").unwrap();
    let above = calculate_on_road_price(999_001.0, "Karnataka", "Diesel").unwrap();

    assert_eq!(at.tcs, 0.0);
    assert!(above.tcs > 0.0);
}

#[test]
fn test_identical_inputs_identical_outputs() {
    let a = calculate_on_road_price(845_000.0, "Pune, Maharashtra", "cng").unwrap();
    let b = calculate_on_road_price(845_000.0, "Pune, Maharashtra", "cng").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fuel_type, FuelType::Cng);
}

#[test]
fn test_non_positive_price_is_rejected() {
    for price in [0.0, -10.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            calculate_on_road_price(price, "Maharashtra", "Petrol"),
            Err(PricingError::InvalidPrice(_))
        ));
    }
}

#[test]
fn test_reject_policy_from_config() {
    let config = PricingConfig {
        unknown_input: UnknownInputPolicy::Reject,
        ..PricingConfig::default()
    };
    let calculator: OnRoadPriceCalculator = config.build_calculator().unwrap();

    assert!(matches!(
        calculator.calculate(700_000.0, "Atlantis", "Petrol", PriceOptions::default()),
        Err(PricingError::UnknownState(_))
    ));
    assert!(matches!(
        calculator.calculate(700_000.0, "Goa", "Hydrogen", PriceOptions::default()),
        Err(PricingError::UnknownFuelType(_))
    ));
}

#[test]
fn test_configured_charges_flow_into_breakup() {
    let config = PricingConfig {
        other_charges: 3_000.0,
        fastag_fee: 600.0,
        ..PricingConfig::default()
    };
    let calculator = config.build_calculator().unwrap();
    let breakup = calculator
        .calculate(
            500_000.0,
            "Goa",
            "Petrol",
            PriceOptions {
                hypothecation: false,
                fastag: true,
            },
        )
        .unwrap();

    assert_eq!(breakup.other_charges, 3_000.0);
    assert_eq!(breakup.fastag, 600.0);
    assert_eq!(breakup.hypothecation, 0.0);
    assert_eq!(breakup.total_on_road_price, component_sum(&breakup));
}
