//! Comfort predicate
//!
//! Decides whether a single hour (or a single day's aggregate) satisfies a
//! comfort policy. Every other stage builds on this contract.

use crate::types::{ComfortPolicy, DailySample, HourlySample, PRECIPITATION_THRESHOLD_PERCENT};

/// Evaluator for the comfort policy
pub struct PredicateEvaluator;

impl PredicateEvaluator {
    /// True iff the hour satisfies every threshold of the policy.
    ///
    /// All comparisons are inclusive except precipitation, which must be
    /// strictly below 20% unless the policy allows precipitation.
    pub fn passes(policy: &ComfortPolicy, sample: &HourlySample) -> bool {
        temperature_ok(policy, sample.temperature_c)
            && sample.humidity_percent <= policy.max_humidity_percent
            && sample.uv_index <= policy.max_uv_index
            && sample.cloud_cover_percent <= policy.max_cloud_cover_percent
            && precipitation_ok(policy, sample.precipitation_probability_percent)
    }

    /// Single-value check of a day's aggregate numbers.
    ///
    /// Uses the mean of the daily max and min as the day's temperature.
    /// Cloud cover is not considered; daily aggregates carry none.
    pub fn is_good_day(policy: &ComfortPolicy, day: &DailySample) -> bool {
        let average = (day.temperature_max_c + day.temperature_min_c) / 2.0;

        temperature_ok(policy, average)
            && day.humidity_percent <= policy.max_humidity_percent
            && day.uv_index_max <= policy.max_uv_index
            && precipitation_ok(policy, day.precipitation_probability_percent)
    }
}

fn temperature_ok(policy: &ComfortPolicy, temperature_c: f64) -> bool {
    temperature_c >= policy.min_temperature_c && temperature_c <= policy.max_temperature_c
}

fn precipitation_ok(policy: &ComfortPolicy, probability_percent: f64) -> bool {
    policy.allow_precipitation || probability_percent < PRECIPITATION_THRESHOLD_PERCENT
}
