//! Poll-completion futures resolved by scheduler callbacks
//!
//! A future pairs a promise slot with a `resolved` flag. The issuer of an
//! asynchronous operation hands the future to a completing callback
//! (typically a queued or conditional task); the callback writes the result,
//! marks the future resolved, and removes its own task. The issuer polls
//! [`Future::is_resolved`] from later passes. There is no blocking wait,
//! and the only cancellation is removing the completing task, which leaves
//! the future unresolved forever; callers must treat "removed before
//! resolution" as an outcome they track themselves.

use core::cell::Cell;

use super::task::TaskHandle;

/// A promise slot plus resolution flag, bound to the scheduler task that
/// will complete it.
pub struct Future<V: Copy> {
    promise: Cell<Option<V>>,
    resolved: Cell<bool>,
    task: Cell<Option<TaskHandle>>,
}

impl<V: Copy> Future<V> {
    /// A fresh, unresolved future with an empty promise slot.
    pub const fn new() -> Self {
        Self {
            promise: Cell::new(None),
            resolved: Cell::new(false),
            task: Cell::new(None),
        }
    }

    /// Clear for reuse: unresolved, empty promise, no bound task.
    ///
    /// Only call once the previous resolution has been observed, or after
    /// the completing task has been removed.
    pub fn reset(&self) {
        self.promise.set(None);
        self.resolved.set(false);
        self.task.set(None);
    }

    /// Associate the scheduler task that will resolve this future.
    pub fn bind(&self, task: TaskHandle) {
        self.task.set(Some(task));
    }

    /// Handle of the completing task, for cancellation.
    pub fn task(&self) -> Option<TaskHandle> {
        self.task.get()
    }

    /// Write the promise value and mark the future resolved. Called by the
    /// completing callback.
    pub fn resolve(&self, value: V) {
        self.promise.set(Some(value));
        self.resolved.set(true);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    pub fn is_unresolved(&self) -> bool {
        !self.resolved.get()
    }

    /// The promise value once resolved, `None` before that.
    pub fn value(&self) -> Option<V> {
        if self.resolved.get() {
            self.promise.get()
        } else {
            None
        }
    }
}

impl<V: Copy> Default for Future<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unresolved_and_empty() {
        let f: Future<u8> = Future::new();
        assert!(f.is_unresolved());
        assert!(!f.is_resolved());
        assert_eq!(f.value(), None);
        assert_eq!(f.task(), None);
    }

    #[test]
    fn resolve_publishes_the_value() {
        let f: Future<u16> = Future::new();
        f.resolve(512);
        assert!(f.is_resolved());
        assert_eq!(f.value(), Some(512));
    }

    #[test]
    fn reset_makes_the_future_reusable() {
        let f: Future<u8> = Future::new();
        f.resolve(7);
        f.reset();
        assert!(f.is_unresolved());
        assert_eq!(f.value(), None);
        f.resolve(9);
        assert_eq!(f.value(), Some(9));
    }
}
