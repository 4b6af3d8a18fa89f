//! Daily classification
//!
//! Day-level "good day" flags for quick scanning. Independent of windows; it
//! applies the comfort policy once to each day's aggregate numbers.

use chrono::{NaiveDate, TimeZone};
use std::collections::BTreeMap;

use crate::predicate::PredicateEvaluator;
use crate::types::{ComfortPolicy, DailyForecast, DailySample, HourlySample};

/// Classify each day against the policy, preserving input order
pub fn classify_days(days: &[DailySample], policy: &ComfortPolicy) -> Vec<DailyForecast> {
    days.iter()
        .map(|day| DailyForecast {
            date: day.date,
            temperature_max_c: day.temperature_max_c,
            temperature_min_c: day.temperature_min_c,
            average_temperature_c: (day.temperature_max_c + day.temperature_min_c) / 2.0,
            humidity_percent: day.humidity_percent,
            precipitation_probability_percent: day.precipitation_probability_percent,
            uv_index_max: day.uv_index_max,
            is_good_day: PredicateEvaluator::is_good_day(policy, day),
        })
        .collect()
}

/// Running totals for one local day
struct DayAccumulator {
    temperature_max_c: f64,
    temperature_min_c: f64,
    humidity_sum: f64,
    precipitation_max: f64,
    uv_max: f64,
    count: usize,
}

impl DayAccumulator {
    fn new(sample: &HourlySample) -> Self {
        Self {
            temperature_max_c: sample.temperature_c,
            temperature_min_c: sample.temperature_c,
            humidity_sum: 0.0,
            precipitation_max: sample.precipitation_probability_percent,
            uv_max: sample.uv_index,
            count: 0,
        }
    }

    fn add(&mut self, sample: &HourlySample) {
        self.temperature_max_c = self.temperature_max_c.max(sample.temperature_c);
        self.temperature_min_c = self.temperature_min_c.min(sample.temperature_c);
        self.humidity_sum += sample.humidity_percent;
        self.precipitation_max = self
            .precipitation_max
            .max(sample.precipitation_probability_percent);
        self.uv_max = self.uv_max.max(sample.uv_index);
        self.count += 1;
    }

    fn finish(self, date: NaiveDate) -> DailySample {
        DailySample {
            date,
            temperature_max_c: self.temperature_max_c,
            temperature_min_c: self.temperature_min_c,
            humidity_percent: self.humidity_sum / self.count as f64,
            precipitation_probability_percent: self.precipitation_max,
            uv_index_max: self.uv_max,
        }
    }
}

/// Build daily aggregates from hourly samples, grouped by local date in `tz`.
///
/// Max/min temperature, mean humidity, max precipitation probability and max
/// UV per day. Output is ascending by date.
pub fn aggregate_daily<Tz: TimeZone>(samples: &[HourlySample], tz: &Tz) -> Vec<DailySample> {
    let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for sample in samples {
        let date = sample.time.with_timezone(tz).date_naive();
        by_date
            .entry(date)
            .or_insert_with(|| DayAccumulator::new(sample))
            .add(sample);
    }

    by_date
        .into_iter()
        .map(|(date, acc)| acc.finish(date))
        .collect()
}
