//! Window reconciliation
//!
//! Carries user annotations (plan text, skipped flag) from previously persisted
//! windows onto freshly computed ones. Forecasts drift between fetches, so a
//! previous window matches a fresh one when it lies inside it or when both
//! bounds are within a minute of each other.
//!
//! Annotated previous windows that match nothing fresh are kept as orphans so a
//! saved plan is never dropped just because the forecast changed. Purging
//! orphans once they expire is left to the store.

use crate::types::Window;

/// Reconciler for fresh vs. persisted windows
pub struct WindowReconciler;

impl WindowReconciler {
    /// Merge fresh windows with previously persisted ones.
    ///
    /// Each fresh window takes the annotation of the first matching previous
    /// window (in `previous` order), or keeps the defaults. Annotated previous
    /// windows with no fresh match are appended unchanged, after all fresh
    /// windows. The result is not re-sorted.
    pub fn reconcile(fresh: Vec<Window>, previous: &[Window]) -> Vec<Window> {
        let fresh_len = fresh.len();

        let mut merged: Vec<Window> = fresh
            .into_iter()
            .map(|mut window| {
                if let Some(matched) = previous.iter().find(|p| window.matches_previous(p)) {
                    window.plan = matched.plan.clone();
                    window.skipped = matched.skipped;
                }
                window
            })
            .collect();

        let orphans: Vec<Window> = previous
            .iter()
            .filter(|p| p.has_annotation())
            .filter(|p| !merged.iter().any(|w| w.matches_previous(p)))
            .cloned()
            .collect();

        if !orphans.is_empty() {
            log::debug!("keeping {} orphaned annotated windows", orphans.len());
        }

        merged.extend(orphans);

        log::debug!(
            "reconciled {} fresh windows against {} previous into {}",
            fresh_len,
            previous.len(),
            merged.len()
        );

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WindowId;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn window(from: DateTime<Utc>, to: DateTime<Utc>) -> Window {
        Window {
            id: WindowId::new(),
            from,
            to,
            min_temperature_c: 18.0,
            max_temperature_c: 23.0,
            max_humidity_percent: 50.0,
            max_uv_index: 4.0,
            max_cloud_cover_percent: 25.0,
            plan: None,
            skipped: false,
        }
    }

    fn planned(from: DateTime<Utc>, to: DateTime<Utc>, plan: &str) -> Window {
        Window {
            plan: Some(plan.to_string()),
            ..window(from, to)
        }
    }

    fn skipped(from: DateTime<Utc>, to: DateTime<Utc>) -> Window {
        Window {
            skipped: true,
            ..window(from, to)
        }
    }

    #[test]
    fn test_containment_carries_plan() {
        let previous = vec![planned(at(10, 0), at(14, 0), "Hike")];
        let fresh = vec![window(at(9, 0), at(15, 0))];

        let merged = WindowReconciler::reconcile(fresh.clone(), &previous);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, fresh[0].id);
        assert_eq!((merged[0].from, merged[0].to), (at(9, 0), at(15, 0)));
        assert_eq!(merged[0].plan.as_deref(), Some("Hike"));
    }

    #[test]
    fn test_near_equality_carries_skip() {
        let previous = vec![skipped(at(10, 0), at(14, 0))];
        // Shrunk by 30 seconds on each side: not contained, but nearly equal
        let fresh = vec![window(
            at(10, 0) + chrono::Duration::seconds(30),
            at(14, 0) - chrono::Duration::seconds(30),
        )];

        let merged = WindowReconciler::reconcile(fresh, &previous);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].skipped);
    }

    #[test]
    fn test_shifted_window_does_not_match() {
        // Fresh window lost the first hour; previous is no longer contained
        let previous = vec![planned(at(10, 0), at(14, 0), "Picnic")];
        let fresh = vec![window(at(11, 0), at(14, 0))];

        let merged = WindowReconciler::reconcile(fresh, &previous);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].plan, None);
        assert_eq!(merged[1], previous[0]);
    }

    #[test]
    fn test_first_match_wins() {
        let previous = vec![
            planned(at(10, 0), at(11, 0), "Run"),
            planned(at(12, 0), at(13, 0), "Swim"),
        ];
        let fresh = vec![window(at(9, 0), at(14, 0))];

        let merged = WindowReconciler::reconcile(fresh, &previous);

        // Both previous windows are inside the fresh one, so neither is orphaned
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].plan.as_deref(), Some("Run"));
    }

    #[test]
    fn test_orphan_retained_after_fresh() {
        let orphan = skipped(at(10, 0), at(11, 0));
        let previous = vec![orphan.clone()];
        let fresh = vec![window(at(15, 0), at(18, 0)), window(at(20, 0), at(22, 0))];

        let merged = WindowReconciler::reconcile(fresh.clone(), &previous);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[..2].to_vec(), fresh);
        assert_eq!(merged[2], orphan);
    }

    #[test]
    fn test_unannotated_previous_is_dropped() {
        let previous = vec![window(at(1, 0), at(3, 0)), window(at(4, 0), at(5, 0))];
        let fresh = vec![window(at(9, 0), at(12, 0)), window(at(14, 0), at(16, 0))];

        let merged = WindowReconciler::reconcile(fresh.clone(), &previous);

        assert_eq!(merged, fresh);
    }

    #[test]
    fn test_matched_plan_overwrites_even_with_defaults() {
        // A matching unannotated previous window resets nothing beyond defaults
        let previous = vec![window(at(10, 0), at(12, 0))];
        let fresh = vec![window(at(10, 0), at(12, 0))];

        let merged = WindowReconciler::reconcile(fresh, &previous);

        assert_eq!(merged.len(), 1);
        assert!(!merged[0].has_annotation());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(WindowReconciler::reconcile(Vec::new(), &[]).is_empty());

        let previous = vec![planned(at(8, 0), at(9, 0), "Coffee outside")];
        assert_eq!(WindowReconciler::reconcile(Vec::new(), &previous), previous);
    }
}
