use super::outcome_kind;
use item_gateway_circuitbreaker::{Outcome, OutcomeKind, OutcomeWindow};
use proptest::prelude::*;
use std::time::Instant;

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

proptest! {
    #[test]
    fn never_exceeds_capacity(
        capacity in 1usize..20,
        kinds in prop::collection::vec(outcome_kind(), 0..100),
    ) {
        let mut window = OutcomeWindow::new(capacity);
        let now = Instant::now();
        for kind in kinds {
            window.record(Outcome::new(kind, now));
            prop_assert!(window.len() <= capacity);
        }
    }

    #[test]
    fn rates_match_the_most_recent_outcomes(
        capacity in 1usize..20,
        kinds in prop::collection::vec(outcome_kind(), 0..100),
    ) {
        let mut window = OutcomeWindow::new(capacity);
        let now = Instant::now();
        for kind in &kinds {
            window.record(Outcome::new(*kind, now));
        }

        let recent = &kinds[kinds.len().saturating_sub(capacity)..];
        let failures = recent.iter().filter(|k| **k == OutcomeKind::Failure).count();
        let slow = recent.iter().filter(|k| **k == OutcomeKind::SlowSuccess).count();

        prop_assert_eq!(window.len(), recent.len());
        prop_assert_eq!(window.failure_count(), failures);
        prop_assert_eq!(window.slow_count(), slow);
        prop_assert_eq!(window.success_count(), recent.len() - failures - slow);
        prop_assert!((window.failure_rate() - percent(failures, recent.len())).abs() < 1e-9);
        prop_assert!((window.slow_rate() - percent(slow, recent.len())).abs() < 1e-9);
    }

    #[test]
    fn iteration_is_oldest_first(
        capacity in 1usize..10,
        kinds in prop::collection::vec(outcome_kind(), 1..40),
    ) {
        let mut window = OutcomeWindow::new(capacity);
        let now = Instant::now();
        for kind in &kinds {
            window.record(Outcome::new(*kind, now));
        }
        let resident: Vec<OutcomeKind> = window.iter().map(|o| o.kind).collect();
        let recent = &kinds[kinds.len().saturating_sub(capacity)..];
        prop_assert_eq!(resident.as_slice(), recent);
    }

    #[test]
    fn clear_empties_counters(kinds in prop::collection::vec(outcome_kind(), 1..30)) {
        let mut window = OutcomeWindow::new(6);
        for kind in kinds {
            window.record(Outcome::now(kind));
        }
        window.clear();
        prop_assert!(window.is_empty());
        prop_assert_eq!(window.failure_rate(), 0.0);
        prop_assert_eq!(window.slow_rate(), 0.0);
    }
}
