use super::outcome_kind;
use item_gateway_circuitbreaker::{Circuit, CircuitBreakerConfig, CircuitState, OutcomeKind};
use proptest::prelude::*;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(1);

fn config(window: usize, trial: usize, wait_ms: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .name("items")
        .sliding_window_size(window)
        .permitted_calls_in_half_open(trial)
        .wait_duration_in_open(Duration::from_millis(wait_ms))
        .build()
}

proptest! {
    #[test]
    fn consecutive_failures_open_exactly_at_the_window_size(window in 1usize..20) {
        let config = config(window, 3, 1_000);
        let now = Instant::now();
        let mut circuit = Circuit::new(&config, now);

        for i in 1..=window {
            let permit = circuit.try_acquire(&config, now);
            prop_assert!(permit.is_some());
            circuit.record(&config, permit.unwrap(), OutcomeKind::Failure, TICK, now);
            let expected = if i == window { CircuitState::Open } else { CircuitState::Closed };
            prop_assert_eq!(circuit.state(), expected);
        }
    }

    #[test]
    fn open_denies_before_the_wait(wait_ms in 1u64..10_000, probe in 0u64..10_000) {
        prop_assume!(probe < wait_ms);
        let config = config(1, 1, wait_ms);
        let now = Instant::now();
        let mut circuit = Circuit::new(&config, now);
        circuit.force_open(&config, now);

        prop_assert!(circuit.try_acquire(&config, now + Duration::from_millis(probe)).is_none());
        prop_assert_eq!(circuit.state(), CircuitState::Open);
        prop_assert!(circuit.try_acquire(&config, now + Duration::from_millis(wait_ms)).is_some());
        prop_assert_eq!(circuit.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_admits_at_most_the_trial_batch(trial in 1usize..10, attempts in 0usize..30) {
        let config = config(10, trial, 10);
        let now = Instant::now();
        let mut circuit = Circuit::new(&config, now);
        circuit.force_open(&config, now);

        let later = now + Duration::from_millis(10);
        let granted = (0..attempts)
            .filter_map(|_| circuit.try_acquire(&config, later))
            .count();
        prop_assert_eq!(granted, attempts.min(trial));
    }

    #[test]
    fn closed_circuit_window_never_exceeds_capacity(
        window in 1usize..12,
        kinds in prop::collection::vec(outcome_kind(), 0..60),
    ) {
        let config = config(window, 3, 60_000);
        let now = Instant::now();
        let mut circuit = Circuit::new(&config, now);

        for kind in kinds {
            if let Some(permit) = circuit.try_acquire(&config, now) {
                circuit.record(&config, permit, kind, TICK, now);
            }
            prop_assert!(circuit.window().len() <= window);
            if circuit.state() == CircuitState::Open {
                prop_assert!(circuit.window().is_empty());
            }
        }
    }

    #[test]
    fn zero_wait_with_prompt_recording_admits_every_call(
        kinds in prop::collection::vec(outcome_kind(), 1..40),
    ) {
        let config = config(4, 2, 0);
        let now = Instant::now();
        let mut circuit = Circuit::new(&config, now);

        for kind in kinds {
            let permit = circuit.try_acquire(&config, now);
            prop_assert!(permit.is_some());
            prop_assert!(circuit.record(&config, permit.unwrap(), kind, TICK, now));
        }
        prop_assert_eq!(circuit.metrics(now).rejected_calls, 0);
        prop_assert_eq!(circuit.metrics(now).stale_outcomes, 0);
    }
}
