//! Window extraction
//!
//! Turns an hourly series into the maximal runs of consecutive hours that
//! satisfy a comfort policy.

use crate::predicate::PredicateEvaluator;
use crate::types::{ComfortPolicy, HourlySample, Window};

/// Extractor for good-weather windows
pub struct WindowExtractor;

impl WindowExtractor {
    /// Extract windows from samples in a single linear scan.
    ///
    /// `samples` must already be sorted ascending by time; the extractor does
    /// not sort, and unsorted input yields meaningless bounds. Output windows
    /// are in time order and never overlap.
    pub fn extract(samples: &[HourlySample], policy: &ComfortPolicy) -> Vec<Window> {
        let mut windows = Vec::new();
        let mut run_start: Option<usize> = None;

        for (index, sample) in samples.iter().enumerate() {
            let passes = PredicateEvaluator::passes(policy, sample);

            match (passes, run_start) {
                (true, None) => run_start = Some(index),
                (false, Some(start)) => {
                    windows.extend(Window::from_run(&samples[start..index]));
                    run_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = run_start {
            windows.extend(Window::from_run(&samples[start..]));
        }

        log::debug!(
            "extracted {} windows from {} samples",
            windows.len(),
            samples.len()
        );

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    /// Sample at `hour` that passes the default policy iff `good`
    fn sample(hour: u32, good: bool, temperature_c: f64) -> HourlySample {
        HourlySample {
            time: at(hour),
            temperature_c,
            humidity_percent: if good { 40.0 } else { 95.0 },
            precipitation_probability_percent: 5.0,
            uv_index: 2.0,
            cloud_cover_percent: 10.0,
        }
    }

    fn series(pattern: &[bool]) -> Vec<HourlySample> {
        pattern
            .iter()
            .enumerate()
            .map(|(hour, &good)| sample(hour as u32, good, 20.0))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let windows = WindowExtractor::extract(&[], &ComfortPolicy::default());
        assert!(windows.is_empty());
    }

    #[test]
    fn test_all_pass_single_window() {
        let samples = series(&[true; 6]);
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].from, samples[0].time);
        assert_eq!(windows[0].to, samples[5].time);
    }

    #[test]
    fn test_none_pass() {
        let samples = series(&[false; 4]);
        assert!(WindowExtractor::extract(&samples, &ComfortPolicy::default()).is_empty());
    }

    #[test]
    fn test_alternating_runs() {
        let samples = series(&[true, true, false, true, true, false]);
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].from, windows[0].to), (at(0), at(1)));
        assert_eq!((windows[1].from, windows[1].to), (at(3), at(4)));
        assert_ne!(windows[0].id, windows[1].id);
    }

    #[test]
    fn test_run_open_at_end_is_closed() {
        let samples = series(&[false, false, true, true]);
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].from, windows[0].to), (at(2), at(3)));
    }

    #[test]
    fn test_single_passing_sample() {
        let samples = vec![sample(0, false, 20.0), sample(1, true, 19.0), sample(2, false, 20.0)];
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].from, windows[0].to);
        assert_eq!(windows[0].min_temperature_c, 19.0);
        assert_eq!(windows[0].max_temperature_c, 19.0);
    }

    #[test]
    fn test_stats_only_cover_the_run() {
        // The failing hour in the middle has extreme humidity that must not leak
        let samples = vec![
            sample(0, true, 16.0),
            sample(1, true, 24.0),
            sample(2, false, 20.0),
            sample(3, true, 18.0),
        ];
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].min_temperature_c, 16.0);
        assert_eq!(windows[0].max_temperature_c, 24.0);
        assert_eq!(windows[0].max_humidity_percent, 40.0);
        assert_eq!(windows[1].min_temperature_c, 18.0);
    }

    #[test]
    fn test_windows_ordered_and_disjoint() {
        let samples = series(&[true, false, true, false, true, true, false, true]);
        let windows = WindowExtractor::extract(&samples, &ComfortPolicy::default());

        assert_eq!(windows.len(), 4);
        for pair in windows.windows(2) {
            assert!(pair[0].from <= pair[0].to);
            assert!(pair[0].to < pair[1].from);
        }
    }
}
