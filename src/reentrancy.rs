//! Reentrancy detection for the table and its allocators.
//!
//! `DebugReentrancy` guards table entry points: user code (`K: Eq`) runs while
//! a chain is being walked, and re-entering the same table from there panics in
//! debug builds with the names of both operations. In release builds it
//! compiles to a no-op.
//!
//! `ParkingLatch` is always on. It records that an allocator has an open
//! parking stack; allocator entry points assert it is closed.

use core::cell::Cell;
use core::marker::PhantomData;

/// Tracks which table operation is running. `enter` names the operation so a
/// nested call can report both sides.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the guard drops. Debug builds panic if
    /// another operation is already running on the same table.
    #[inline]
    pub fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.active.get() {
                panic!("reentrancy detected: {op} called on a table while its {running} is running");
            }
            self.active.set(Some(op));
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            ReentrancyGuard { _z: PhantomData }
        }
    }

    /// The operation currently inside the table, if any. Always `None` in
    /// release builds.
    #[inline]
    pub fn active(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.active.get()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running operation on drop, including during unwinding.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

/// Open/closed flag for an allocator's single parking stack.
///
/// The stack engages the latch when it is created and disengages it from its
/// `Drop`. A stack that is forgotten instead of dropped leaves the latch
/// engaged, and every later allocator call panics.
#[derive(Debug, Default)]
pub struct ParkingLatch {
    engaged: bool,
    _nosend: PhantomData<*mut ()>,
}

impl ParkingLatch {
    pub const fn new() -> Self {
        Self {
            engaged: false,
            _nosend: PhantomData,
        }
    }

    #[inline]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Mark a parking stack as open. Panics if one already is.
    #[inline]
    pub fn engage(&mut self) {
        assert!(
            !self.engaged,
            "parking stack already open on this allocator"
        );
        self.engaged = true;
    }

    #[inline]
    pub fn disengage(&mut self) {
        debug_assert!(self.engaged);
        self.engaged = false;
    }

    /// Panics if a parking stack is open. `op` names the rejected call.
    #[inline]
    pub fn assert_idle(&self, op: &str) {
        assert!(
            !self.engaged,
            "{op} called while a parking stack is open on this allocator"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugReentrancy, ParkingLatch};

    #[test]
    fn operations_run_back_to_back() {
        let r = DebugReentrancy::new();
        for op in ["insert", "find", "remove"] {
            let _g = r.enter(op);
            #[cfg(debug_assertions)]
            assert_eq!(r.active(), Some(op));
        }
        assert_eq!(r.active(), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_operation_names_both_sides() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter("resize");
            let _inner = r.enter("find");
        }));
        let payload = res.unwrap_err();
        let msg = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .unwrap_or_default();
        assert!(msg.contains("find"), "{msg}");
        assert!(msg.contains("resize"), "{msg}");
        // The outer guard was dropped while unwinding.
        assert_eq!(r.active(), None);
        let _g = r.enter("clear");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nesting_is_not_tracked_in_release() {
        let r = DebugReentrancy::new();
        let _outer = r.enter("resize");
        let _inner = r.enter("find");
        assert_eq!(r.active(), None);
    }

    #[test]
    fn latch_cycles_open_and_closed() {
        let mut l = ParkingLatch::new();
        l.assert_idle("acquire");
        l.engage();
        assert!(l.is_engaged());
        l.disengage();
        l.engage();
        l.disengage();
        assert!(!l.is_engaged());
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn latch_rejects_second_open() {
        let mut l = ParkingLatch::new();
        l.engage();
        l.engage();
    }

    #[test]
    #[should_panic(expected = "while a parking stack is open")]
    fn latch_rejects_calls_while_open() {
        let mut l = ParkingLatch::new();
        l.engage();
        l.assert_idle("release");
    }
}
