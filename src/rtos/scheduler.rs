//! Cooperative task scheduler: timed, queued, and conditional callbacks
//! dispatched from a single execution context
//!
//! Tasks live in a fixed arena of slots threaded into two singly linked
//! index chains, one for timed tasks and one for queued/conditional tasks.
//! A chain may be modified while it is being traversed (callbacks add and
//! remove tasks), so modifications are constrained:
//!
//! * Additions land on a separate staging list, spliced onto the head of
//!   the main chain at the start of the next pass.
//! * Removals mark the slot [`TaskState::Empty`]; the node is unlinked near
//!   the end of the pass once it is safe to do so.
//!
//! This keeps the traversal links consistent no matter what the callbacks
//! do to the lists.

use super::task::{ConditionCheck, TaskCallback, TaskError, TaskHandle, TaskSlot, TaskState};
use super::ticks::TickSource;
use super::timer::SoftTimer;

/// One task chain head plus its staging sub-list.
#[derive(Clone, Copy, Default)]
struct TaskList {
    first: Option<usize>,
    add_first: Option<usize>,
    add_last: Option<usize>,
}

/// The scheduler: task arena, the two task lists, and the tick source the
/// soft timers read.
///
/// `N` is the arena capacity. `P` is the opaque parameter type handed to
/// callbacks and predicates; it must be `Copy` (an integer, a small enum,
/// or a shared reference to longer-lived state).
///
/// [`Scheduler::run`] is not reentrant: it must not be called from a
/// callback it is currently running, nor from an interrupt handler.
pub struct Scheduler<T, P: Copy, const N: usize> {
    ticks: T,
    slots: [TaskSlot<T, P, N>; N],
    timed: TaskList,
    queued: TaskList,
    current: Option<usize>,
}

impl<T: TickSource, P: Copy, const N: usize> Scheduler<T, P, N> {
    /// Create an empty scheduler reading time from `ticks`.
    pub fn new(ticks: T) -> Self {
        Self {
            ticks,
            slots: [TaskSlot::EMPTY; N],
            timed: TaskList::default(),
            queued: TaskList::default(),
            current: None,
        }
    }

    /// Current tick count as seen by the scheduler's tick source.
    pub fn tick_count(&self) -> u16 {
        self.ticks.ticks()
    }

    /// Handle of the task whose callback is currently executing.
    ///
    /// `Some` only while a callback runs; a task removes itself with
    /// `remove_task(current_task)`.
    pub fn current_task(&self) -> Option<TaskHandle> {
        self.current.map(TaskHandle)
    }

    /// Register a timed repeating task fired every `period` ticks.
    ///
    /// The period is truncated to 15 bits by the soft-timer layer. A period
    /// of zero makes the task fire once on the next pass and auto-remove.
    pub fn add_timed_task(
        &mut self,
        cb: TaskCallback<T, P, N>,
        param: P,
        period: u16,
    ) -> Result<TaskHandle, TaskError> {
        let due = SoftTimer::new(&self.ticks, period);
        self.register(TaskState::Timed { due, period }, cb, param, true)
    }

    /// Register a timed one-shot task fired once, `delay` ticks from now,
    /// then removed automatically.
    pub fn add_timed_single_shot_task(
        &mut self,
        cb: TaskCallback<T, P, N>,
        param: P,
        delay: u16,
    ) -> Result<TaskHandle, TaskError> {
        let due = SoftTimer::new(&self.ticks, delay);
        // period 0 marks the one-shot
        self.register(TaskState::Timed { due, period: 0 }, cb, param, true)
    }

    /// Register a queued one-shot task, fired exactly once on the next
    /// pass, then removed automatically.
    pub fn add_task(
        &mut self,
        cb: TaskCallback<T, P, N>,
        param: P,
    ) -> Result<TaskHandle, TaskError> {
        self.register(TaskState::Queued, cb, param, false)
    }

    /// Register a conditional repeating task: every pass the scheduler
    /// calls `check(check_param)` and fires the task whenever it returns
    /// true.
    pub fn add_conditional_task(
        &mut self,
        cb: TaskCallback<T, P, N>,
        param: P,
        check: ConditionCheck<P>,
        check_param: P,
    ) -> Result<TaskHandle, TaskError> {
        let state = TaskState::Conditional {
            check,
            check_param,
            single_shot: false,
        };
        self.register(state, cb, param, false)
    }

    /// Register a conditional one-shot task, removed automatically after
    /// the first pass on which its predicate returns true.
    pub fn add_conditional_single_shot_task(
        &mut self,
        cb: TaskCallback<T, P, N>,
        param: P,
        check: ConditionCheck<P>,
        check_param: P,
    ) -> Result<TaskHandle, TaskError> {
        let state = TaskState::Conditional {
            check,
            check_param,
            single_shot: true,
        };
        self.register(state, cb, param, false)
    }

    /// Mark a task for removal. It will not fire again; its slot is
    /// unlinked, and becomes reusable, on the next pass over its list.
    ///
    /// Safe to call at any time, from any callback, including the task's
    /// own. A handle whose slot is already free is ignored.
    pub fn remove_task(&mut self, handle: TaskHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            if slot.linked {
                slot.state = TaskState::Empty;
            }
        }
    }

    /// One driver pass. Call at a regular cadence, faster than the
    /// shortest registered timing period and at least once per wraparound
    /// period of the tick counter.
    ///
    /// All due timed tasks run first, then every queued/conditional task,
    /// on every call. Tasks staged during this pass run no earlier than
    /// the next one.
    pub fn run(&mut self) {
        // merging up front bounds this pass to tasks staged by earlier
        // calls, which is what keeps the traversal links valid while
        // callbacks mutate the lists
        Self::merge_add_list(&mut self.slots, &mut self.timed);
        Self::merge_add_list(&mut self.slots, &mut self.queued);
        self.run_timed_tasks();
        self.run_queued_tasks();
    }

    fn register(
        &mut self,
        state: TaskState<P>,
        cb: TaskCallback<T, P, N>,
        param: P,
        timed: bool,
    ) -> Result<TaskHandle, TaskError> {
        let i = self
            .slots
            .iter()
            .position(TaskSlot::is_free)
            .ok_or(TaskError::NoFreeSlot)?;
        self.slots[i] = TaskSlot {
            state,
            action: Some((cb, param)),
            next: None,
            linked: true,
        };
        let list = if timed { &mut self.timed } else { &mut self.queued };
        Self::stage(&mut self.slots, list, i);
        Ok(TaskHandle(i))
    }

    /// Prepend a slot to a list's staging area.
    fn stage(slots: &mut [TaskSlot<T, P, N>; N], list: &mut TaskList, i: usize) {
        slots[i].next = list.add_first;
        list.add_first = Some(i);
        if list.add_last.is_none() {
            // first staged element stays last through later prepends
            list.add_last = Some(i);
        }
    }

    /// Splice the staging area onto the head of the main chain.
    fn merge_add_list(slots: &mut [TaskSlot<T, P, N>; N], list: &mut TaskList) {
        let (Some(add_first), Some(add_last)) = (list.add_first, list.add_last) else {
            return;
        };
        slots[add_last].next = list.first;
        list.first = Some(add_first);
        list.add_first = None;
        list.add_last = None;
    }

    /// Unlink slot `i` from a chain. `up` is the element before it, or
    /// `None` when `i` is the chain head. The slot is reset and reusable
    /// from here on.
    fn unlink(slots: &mut [TaskSlot<T, P, N>; N], list: &mut TaskList, i: usize, up: Option<usize>) {
        let next = slots[i].next;
        match up {
            None => list.first = next,
            Some(u) => slots[u].next = next,
        }
        slots[i] = TaskSlot::EMPTY;
    }

    /// Invoke a slot's callback with its stored parameter.
    fn fire(&mut self, i: usize) {
        if let Some((cb, param)) = self.slots[i].action {
            self.current = Some(i);
            cb(self, param);
            self.current = None;
        }
    }

    fn run_timed_tasks(&mut self) {
        let mut t = self.timed.first;
        let mut up: Option<usize> = None;
        while let Some(i) = t {
            if let TaskState::Timed { due, .. } = self.slots[i].state {
                if !due.is_active(&self.ticks) {
                    self.fire(i);
                    // the callback may have emptied its own slot; re-read
                    if let TaskState::Timed { mut due, period } = self.slots[i].state {
                        self.slots[i].state = if period > 0 {
                            due.add_period(period);
                            TaskState::Timed { due, period }
                        } else {
                            // one-shot consumed
                            TaskState::Empty
                        };
                    }
                }
            }
            t = self.slots[i].next;
            if matches!(self.slots[i].state, TaskState::Empty) {
                Self::unlink(&mut self.slots, &mut self.timed, i, up);
            } else {
                // only advance the trailing pointer for elements that stay
                up = Some(i);
            }
        }
    }

    fn run_queued_tasks(&mut self) {
        let mut t = self.queued.first;
        let mut up: Option<usize> = None;
        while let Some(i) = t {
            match self.slots[i].state {
                TaskState::Queued => {
                    self.fire(i);
                    self.slots[i].state = TaskState::Empty;
                }
                TaskState::Conditional {
                    check,
                    check_param,
                    single_shot,
                } => {
                    if check(check_param) {
                        self.fire(i);
                        if single_shot {
                            self.slots[i].state = TaskState::Empty;
                        }
                    }
                }
                _ => {}
            }
            t = self.slots[i].next;
            if matches!(self.slots[i].state, TaskState::Empty) {
                Self::unlink(&mut self.slots, &mut self.queued, i, up);
            } else {
                up = Some(i);
            }
        }
    }
}
