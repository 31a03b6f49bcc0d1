//! Cold-start retry state machine
//!
//! Pure state transitions in the Elm style: the transition function never
//! performs I/O, it returns the effects the relay has to run next.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{RelayState, RetryPolicy};
#[allow(unused_imports)] // Re-exported for the property tests
pub use transition::{start, transition, TransitionError, TransitionResult, MAX_ATTEMPTS};
