//! Cooperative task scheduling over the RTC soft counter
//!
//! A single execution context calls [`Scheduler::run`] at a regular cadence,
//! faster than the shortest registered timing period. Each pass fires the
//! timed tasks that have come due, then every queued and conditional task.
//! Callbacks may register and remove tasks freely; insertions are staged
//! until the next pass and removals are unlinked lazily, so the traversal
//! links stay valid while the lists are mutated mid-pass.

pub mod future;
pub mod scheduler;
pub mod task;
pub mod ticks;
pub mod timer;

pub use future::Future;
pub use scheduler::Scheduler;
pub use task::{ConditionCheck, TaskCallback, TaskError, TaskHandle};
pub use ticks::TickSource;
pub use timer::{SoftTimer, MAX_PERIOD};

#[cfg(test)]
pub(crate) mod testutil {
    use super::ticks::TickSource;
    use std::sync::atomic::{AtomicU16, Ordering};

    /// Hand-driven tick counter standing in for the RTC soft counter.
    #[derive(Clone, Copy)]
    pub struct ManualTicks(&'static AtomicU16);

    impl ManualTicks {
        pub fn new() -> Self {
            Self(Box::leak(Box::new(AtomicU16::new(0))))
        }

        pub fn set(&self, value: u16) {
            self.0.store(value, Ordering::Relaxed);
        }

        pub fn advance(&self, ticks: u16) {
            let now = self.0.load(Ordering::Relaxed);
            self.0.store(now.wrapping_add(ticks), Ordering::Relaxed);
        }
    }

    impl TickSource for ManualTicks {
        fn ticks(&self) -> u16 {
            self.0.load(Ordering::Relaxed)
        }
    }
}
