//! Discount rule table.
//!
//! Each rule is a pure function of the request and the collected signals
//! returning the amount it grants, in cents. Every rate applies to the
//! pre-discount value, so the order of the table never changes the result.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{CustomerType, DiscountRequest, IncidentsInfo, Weather};

/// Business customers qualify at or above this value (cents).
pub const BUSINESS_HIGH_VALUE_THRESHOLD: i64 = 5_000;
pub const BUSINESS_HIGH_VALUE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Individual customers get a percent per kg strictly above this weight.
pub const WEIGHT_THRESHOLD_KG: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
pub const WEIGHT_RATE_PER_KG: Decimal = Decimal::ONE;

/// Degrees Celsius, inclusive.
pub const COLD_THRESHOLD_CELSIUS: f64 = 5.0;
pub const COLD_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

pub const INCIDENT_PROXIMITY_KM: f64 = 10.0;
pub const INCIDENTS_LOW_TIER: u32 = 3;
pub const INCIDENTS_HIGH_TIER: u32 = 5;
pub const INCIDENTS_LOW_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
pub const INCIDENTS_HIGH_RATE: Decimal = Decimal::TEN;

pub const MAX_DISCOUNT_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Signals gathered from the providers for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub weather: Option<Weather>,
    pub incidents: Option<IncidentsInfo>,
}

pub type RuleFn = fn(&DiscountRequest, &Signals) -> Option<i64>;

#[derive(Clone, Copy)]
pub struct DiscountRule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for DiscountRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountRule").field("name", &self.name).finish()
    }
}

pub const DEFAULT_RULES: &[DiscountRule] = &[
    DiscountRule {
        name: "business_high_value",
        apply: business_high_value,
    },
    DiscountRule {
        name: "individual_weight",
        apply: individual_weight,
    },
    DiscountRule {
        name: "individual_cold",
        apply: individual_cold,
    },
    DiscountRule {
        name: "individual_incidents",
        apply: individual_incidents,
    },
];

/// `rate` percent of `value`, rounded half away from zero to whole cents.
pub fn percent_of(value: i64, rate: Decimal) -> i64 {
    (Decimal::from(value) * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Upper bound for the summed discount of a reservation worth `value`.
pub fn discount_cap(value: i64) -> i64 {
    percent_of(value, MAX_DISCOUNT_RATE)
}

fn is_individual(request: &DiscountRequest) -> bool {
    request.customer.customer_type == CustomerType::Individual
}

pub fn business_high_value(request: &DiscountRequest, _: &Signals) -> Option<i64> {
    if request.customer.customer_type != CustomerType::Business
        || request.reservation_value < BUSINESS_HIGH_VALUE_THRESHOLD
    {
        return None;
    }
    Some(percent_of(request.reservation_value, BUSINESS_HIGH_VALUE_RATE))
}

pub fn individual_weight(request: &DiscountRequest, _: &Signals) -> Option<i64> {
    if !is_individual(request) {
        return None;
    }
    let weight = Decimal::try_from(request.bike.weight_kg).ok()?;
    if weight <= WEIGHT_THRESHOLD_KG {
        return None;
    }
    let rate = (weight - WEIGHT_THRESHOLD_KG) * WEIGHT_RATE_PER_KG;
    Some(percent_of(request.reservation_value, rate))
}

pub fn individual_cold(request: &DiscountRequest, signals: &Signals) -> Option<i64> {
    let weather = signals.weather?;
    if !is_individual(request) || weather.temperature > COLD_THRESHOLD_CELSIUS {
        return None;
    }
    Some(percent_of(request.reservation_value, COLD_RATE))
}

pub fn individual_incidents(request: &DiscountRequest, signals: &Signals) -> Option<i64> {
    let incidents = signals.incidents?;
    if !is_individual(request) {
        return None;
    }
    let rate = match incidents.number_of_incidents {
        n if n >= INCIDENTS_HIGH_TIER => INCIDENTS_HIGH_RATE,
        n if n >= INCIDENTS_LOW_TIER => INCIDENTS_LOW_RATE,
        _ => return None,
    };
    Some(percent_of(request.reservation_value, rate))
}

/// Sum every rule that fires and clamp to the cap.
pub fn apply_rules(rules: &[DiscountRule], request: &DiscountRequest, signals: &Signals) -> i64 {
    let total: i64 = rules
        .iter()
        .filter_map(|rule| (rule.apply)(request, signals))
        .sum();
    total.min(discount_cap(request.reservation_value))
}
