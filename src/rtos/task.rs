//! Task records for the cooperative scheduler

use super::scheduler::Scheduler;
use super::timer::SoftTimer;

/// Function invoked when a task fires.
///
/// The callback receives the scheduler itself so its body can register or
/// remove tasks mid-pass, plus the opaque parameter given at registration.
pub type TaskCallback<T, P, const N: usize> = fn(&mut Scheduler<T, P, N>, P);

/// Predicate deciding whether a conditional task fires on this pass.
///
/// Evaluated on every pass, so keep it short or it slows the scheduler.
pub type ConditionCheck<P> = fn(P) -> bool;

/// Registration failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// Every task slot is occupied or still awaiting unlink.
    NoFreeSlot,
}

/// Identifies a registered task, for removal and self-identification.
///
/// A handle goes stale once its slot has been unlinked and reused by a
/// later registration; removing through a stale handle cancels whichever
/// task owns the slot now. Callers that remove tasks after completion must
/// track task lifetime themselves, exactly as with caller-owned records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskHandle(pub(crate) usize);

/// Variant tag plus per-variant state.
///
/// `Empty` doubles as the deletion marker: a removed task keeps its slot,
/// tagged `Empty`, until the next traversal unlinks it. Only then does the
/// slot become reusable.
#[derive(Clone, Copy)]
pub(crate) enum TaskState<P: Copy> {
    Empty,
    /// Due when the soft timer expires; `period == 0` marks a one-shot.
    Timed { due: SoftTimer, period: u16 },
    /// Fires exactly once on the next pass.
    Queued,
    /// Fires whenever `check(check_param)` returns true.
    Conditional {
        check: ConditionCheck<P>,
        check_param: P,
        single_shot: bool,
    },
}

/// One arena slot: variant state, callback + parameter, and the forward
/// link threading the slot into a task list.
pub(crate) struct TaskSlot<T, P: Copy, const N: usize> {
    pub(crate) state: TaskState<P>,
    pub(crate) action: Option<(TaskCallback<T, P, N>, P)>,
    pub(crate) next: Option<usize>,
    pub(crate) linked: bool,
}

impl<T, P: Copy, const N: usize> TaskSlot<T, P, N> {
    pub(crate) const EMPTY: Self = Self {
        state: TaskState::Empty,
        action: None,
        next: None,
        linked: false,
    };

    /// Free for reuse: off every chain and carrying no live variant.
    pub(crate) fn is_free(&self) -> bool {
        !self.linked && matches!(self.state, TaskState::Empty)
    }
}

impl<T, P: Copy, const N: usize> Clone for TaskSlot<T, P, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P: Copy, const N: usize> Copy for TaskSlot<T, P, N> {}
