//! Work-hours splitting
//!
//! Partitions windows against a daily work-hours band into before/during/after
//! slices. The band is anchored to the local calendar day of each window's start
//! in an explicitly supplied timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::types::{Window, WorkHours};

/// How far past a DST gap we look for the first valid local time
const MAX_GAP_MINUTES: i64 = 180;
const GAP_STEP_MINUTES: i64 = 15;

/// Splitter for work-hours bands
pub struct WindowSplitter;

impl WindowSplitter {
    /// Split windows against the work-hours band.
    ///
    /// With no band the input is returned unchanged. Windows that do not
    /// intersect their day's band pass through with the same id. Intersecting
    /// windows are replaced by up to three slices (before, during, after), each
    /// with a fresh id and the parent's statistics. The result is sorted by `from`.
    pub fn split<Tz: TimeZone>(
        windows: Vec<Window>,
        band: Option<WorkHours>,
        tz: &Tz,
    ) -> Vec<Window> {
        let Some(band) = band else {
            return windows;
        };

        let input_len = windows.len();
        let mut output = Vec::with_capacity(input_len);

        for window in windows {
            let day = window.from.with_timezone(tz).date_naive();
            let band_start = local_hour_instant(tz, day, band.start_hour);
            let band_end = local_hour_instant(tz, day, band.end_hour);

            if window.to <= band_start || window.from >= band_end {
                output.push(window);
                continue;
            }

            if window.from < band_start {
                output.push(window.slice(window.from, band_start));
            }

            output.push(window.slice(window.from.max(band_start), window.to.min(band_end)));

            if window.to > band_end {
                output.push(window.slice(band_end, window.to));
            }
        }

        output.sort_by_key(|w| w.from);

        log::debug!(
            "split {} windows into {} against work hours {}-{}",
            input_len,
            output.len(),
            band.start_hour,
            band.end_hour
        );

        output
    }
}

/// The instant of `hour:00` on local `day` in `tz`. Hour 24 is the next midnight.
fn local_hour_instant<Tz: TimeZone>(tz: &Tz, day: NaiveDate, hour: u32) -> DateTime<Utc> {
    let local = day.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    resolve_local(tz, local)
}

/// Map a local wall-clock time to UTC.
///
/// Ambiguous times take the earliest instant; times inside a DST gap take the
/// first valid instant after it.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = local;
    let mut skipped = 0;

    while skipped <= MAX_GAP_MINUTES {
        if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
            return instant.with_timezone(&Utc);
        }
        candidate += Duration::minutes(GAP_STEP_MINUTES);
        skipped += GAP_STEP_MINUTES;
    }

    Utc.from_utc_datetime(&local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WindowId;
    use chrono_tz::Europe::Berlin;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn window(from: DateTime<Utc>, to: DateTime<Utc>) -> Window {
        Window {
            id: WindowId::new(),
            from,
            to,
            min_temperature_c: 17.0,
            max_temperature_c: 24.0,
            max_humidity_percent: 55.0,
            max_uv_index: 4.0,
            max_cloud_cover_percent: 30.0,
            plan: None,
            skipped: false,
        }
    }

    fn ranges(windows: &[Window]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        windows.iter().map(|w| (w.from, w.to)).collect()
    }

    #[test]
    fn test_no_band_is_identity() {
        let input = vec![window(at(1, 8), at(1, 20)), window(at(2, 2), at(2, 5))];
        let output = WindowSplitter::split(input.clone(), None, &Utc);

        assert_eq!(output, input);
    }

    #[test]
    fn test_full_overlap_three_slices() {
        let parent = window(at(1, 8), at(1, 20));
        let output = WindowSplitter::split(vec![parent.clone()], Some(WorkHours::new(9, 17)), &Utc);

        assert_eq!(
            ranges(&output),
            vec![
                (at(1, 8), at(1, 9)),
                (at(1, 9), at(1, 17)),
                (at(1, 17), at(1, 20)),
            ]
        );
        for slice in &output {
            assert_ne!(slice.id, parent.id);
            assert_eq!(slice.min_temperature_c, parent.min_temperature_c);
            assert_eq!(slice.max_temperature_c, parent.max_temperature_c);
            assert_eq!(slice.max_humidity_percent, parent.max_humidity_percent);
        }
        assert_ne!(output[0].id, output[1].id);
        assert_ne!(output[1].id, output[2].id);
        assert_ne!(output[0].id, output[2].id);
    }

    #[test]
    fn test_disjoint_window_keeps_id() {
        let early = window(at(1, 2), at(1, 5));
        let late = window(at(1, 18), at(1, 22));
        let output = WindowSplitter::split(
            vec![early.clone(), late.clone()],
            Some(WorkHours::new(9, 17)),
            &Utc,
        );

        assert_eq!(output, vec![early, late]);
    }

    #[test]
    fn test_touching_band_edges_is_disjoint() {
        let ends_at_start = window(at(1, 5), at(1, 9));
        let starts_at_end = window(at(1, 17), at(1, 21));
        let output = WindowSplitter::split(
            vec![ends_at_start.clone(), starts_at_end.clone()],
            Some(WorkHours::new(9, 17)),
            &Utc,
        );

        assert_eq!(output, vec![ends_at_start, starts_at_end]);
    }

    #[test]
    fn test_partial_overlaps() {
        let morning = window(at(1, 6), at(1, 12));
        let afternoon = window(at(2, 10), at(2, 20));
        let output = WindowSplitter::split(
            vec![afternoon, morning],
            Some(WorkHours::new(9, 17)),
            &Utc,
        );

        assert_eq!(
            ranges(&output),
            vec![
                (at(1, 6), at(1, 9)),
                (at(1, 9), at(1, 12)),
                (at(2, 10), at(2, 17)),
                (at(2, 17), at(2, 20)),
            ]
        );
    }

    #[test]
    fn test_window_inside_band_gets_new_id() {
        let inside = window(at(1, 10), at(1, 15));
        let output = WindowSplitter::split(vec![inside.clone()], Some(WorkHours::new(9, 17)), &Utc);

        assert_eq!(ranges(&output), vec![(at(1, 10), at(1, 15))]);
        assert_ne!(output[0].id, inside.id);
    }

    #[test]
    fn test_band_anchored_to_start_day() {
        // Starts after the first day's band; the next day's band is not considered
        let overnight = window(at(1, 20), at(2, 12));
        let output = WindowSplitter::split(vec![overnight.clone()], Some(WorkHours::new(9, 17)), &Utc);

        assert_eq!(output, vec![overnight]);
    }

    #[test]
    fn test_end_hour_24_is_next_midnight() {
        let evening = window(at(1, 17), at(1, 23));
        let output = WindowSplitter::split(vec![evening], Some(WorkHours::new(18, 24)), &Utc);

        assert_eq!(
            ranges(&output),
            vec![(at(1, 17), at(1, 18)), (at(1, 18), at(1, 23))]
        );
    }

    #[test]
    fn test_band_uses_supplied_timezone() {
        // Berlin is UTC+2 in June: local 09:00-17:00 is 07:00Z-15:00Z
        let w = window(at(1, 5), at(1, 18));
        let output = WindowSplitter::split(vec![w], Some(WorkHours::new(9, 17)), &Berlin);

        assert_eq!(
            ranges(&output),
            vec![
                (at(1, 5), at(1, 7)),
                (at(1, 7), at(1, 15)),
                (at(1, 15), at(1, 18)),
            ]
        );
    }

    #[test]
    fn test_band_start_in_dst_gap() {
        // 2024-03-31 Berlin skips 02:00-03:00 local; 02:00 resolves to 03:00 CEST = 01:00Z
        let utc = |hour| Utc.with_ymd_and_hms(2024, 3, 31, hour, 0, 0).unwrap();
        let w = window(utc(0), utc(5));
        let output = WindowSplitter::split(vec![w], Some(WorkHours::new(2, 4)), &Berlin);

        assert_eq!(
            ranges(&output),
            vec![(utc(0), utc(1)), (utc(1), utc(2)), (utc(2), utc(5))]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(WindowSplitter::split(Vec::new(), Some(WorkHours::new(9, 17)), &Utc).is_empty());
    }
}
