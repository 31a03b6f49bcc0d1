//! Property-based tests for the retry state machine
//!
//! Drives the machine with arbitrary provider outcomes and checks the
//! bounded-retry invariants hold.

use super::*;
use crate::llm::{GenerationOutcome, ProviderError};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Ready(String),
    Retryable(Option<u64>),
    Failed(u16),
}

impl ScriptedOutcome {
    fn into_outcome(self) -> GenerationOutcome {
        match self {
            ScriptedOutcome::Ready(text) => GenerationOutcome::Ready(text),
            ScriptedOutcome::Retryable(secs) => {
                GenerationOutcome::Retryable(secs.map(Duration::from_secs))
            }
            ScriptedOutcome::Failed(status) => {
                GenerationOutcome::Failed(ProviderError::status(status, "error"))
            }
        }
    }
}

fn arb_outcome() -> impl Strategy<Value = ScriptedOutcome> {
    prop_oneof![
        "[a-z ]{0,20}".prop_map(ScriptedOutcome::Ready),
        proptest::option::of(0u64..1000).prop_map(ScriptedOutcome::Retryable),
        (400u16..600).prop_map(ScriptedOutcome::Failed),
    ]
}

fn arb_policy() -> impl Strategy<Value = RetryPolicy> {
    (0u64..120, 0u64..600).prop_map(|(default_wait, max_wait)| RetryPolicy {
        default_wait: Duration::from_secs(default_wait),
        max_wait: Duration::from_secs(max_wait),
    })
}

/// Record of one simulated exchange
struct Run {
    final_state: RelayState,
    provider_calls: usize,
    notifications: Vec<String>,
    sleeps: Vec<Duration>,
}

/// Execute effects against a scripted provider the way the relay does
fn simulate(policy: &RetryPolicy, script: Vec<ScriptedOutcome>) -> Run {
    let mut script = script.into_iter();
    let initial = start();
    let mut state = initial.new_state;
    let mut pending: std::collections::VecDeque<Effect> = initial.effects.into();
    let mut run_calls = 0;
    let mut notifications = Vec::new();
    let mut sleeps = Vec::new();

    while let Some(effect) = pending.pop_front() {
        let event = match effect {
            Effect::CallProvider { .. } => {
                run_calls += 1;
                let outcome = script
                    .next()
                    .map_or_else(|| GenerationOutcome::Ready("default".into()), ScriptedOutcome::into_outcome);
                Some(Event::ProviderOutcome(outcome))
            }
            Effect::Notify { message } => {
                notifications.push(message);
                None
            }
            Effect::Sleep { duration } => {
                sleeps.push(duration);
                Some(Event::WaitElapsed)
            }
        };

        if let Some(event) = event {
            let result = transition(&state, policy, event).expect("valid transition");
            state = result.new_state;
            pending.extend(result.effects);
        }
    }

    Run {
        final_state: state,
        provider_calls: run_calls,
        notifications,
        sleeps,
    }
}

proptest! {
    #[test]
    fn prop_always_terminates_in_terminal_state(
        policy in arb_policy(),
        script in proptest::collection::vec(arb_outcome(), 0..5),
    ) {
        let run = simulate(&policy, script);
        prop_assert!(run.final_state.is_terminal());
    }

    #[test]
    fn prop_provider_called_at_most_twice(
        policy in arb_policy(),
        script in proptest::collection::vec(arb_outcome(), 0..5),
    ) {
        let run = simulate(&policy, script);
        prop_assert!(run.provider_calls >= 1);
        prop_assert!(run.provider_calls <= MAX_ATTEMPTS as usize);
    }

    #[test]
    fn prop_one_notice_per_wait(
        policy in arb_policy(),
        script in proptest::collection::vec(arb_outcome(), 0..5),
    ) {
        let run = simulate(&policy, script);
        prop_assert_eq!(run.notifications.len(), run.sleeps.len());
        prop_assert!(run.sleeps.len() <= 1);
        prop_assert_eq!(run.provider_calls, run.sleeps.len() + 1);
    }

    #[test]
    fn prop_wait_is_bounded(
        policy in arb_policy(),
        estimate in proptest::option::of(0u64..100_000),
    ) {
        let run = simulate(
            &policy,
            vec![ScriptedOutcome::Retryable(estimate), ScriptedOutcome::Ready("x".into())],
        );
        let wait = run.sleeps[0];
        prop_assert!(wait >= Duration::from_secs(1));
        prop_assert!(wait <= policy.max_wait + Duration::from_secs(1));
        prop_assert!(run.notifications[0].contains(&wait.as_secs().to_string()));
    }

    #[test]
    fn prop_first_ready_wins(text in "[a-z]{1,20}") {
        let run = simulate(&RetryPolicy::default(), vec![ScriptedOutcome::Ready(text.clone())]);
        prop_assert_eq!(run.provider_calls, 1);
        match run.final_state {
            RelayState::Succeeded { text: got } => prop_assert_eq!(got, text),
            other => prop_assert!(false, "unexpected state {:?}", other),
        }
    }

    #[test]
    fn prop_double_cold_start_fails(
        first in proptest::option::of(0u64..10),
        second in proptest::option::of(0u64..10),
    ) {
        let run = simulate(
            &RetryPolicy::default(),
            vec![
                ScriptedOutcome::Retryable(first),
                ScriptedOutcome::Retryable(second),
                ScriptedOutcome::Ready("never".into()),
            ],
        );
        prop_assert_eq!(run.provider_calls, 2);
        let failed = matches!(run.final_state, RelayState::Failed { .. });
        prop_assert!(failed);
    }
}
