//! Re-entrancy guard for undo/redo replay.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "replay in progress" flag.
///
/// Clones observe the same flag, so a mutation target can hold one and check
/// whether the edit it is about to report came from an undo/redo replay.
/// Single-threaded by construction (`Rc`), matching the core's one-thread
/// ownership of graph and history state.
#[derive(Debug, Clone, Default)]
pub struct ReplayFlag {
    active: Rc<Cell<bool>>,
}

impl ReplayFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Raises the flag until the returned guard is dropped.
    pub fn enter(&self) -> ReplayGuard {
        let previous = self.active.replace(true);
        ReplayGuard {
            active: Rc::clone(&self.active),
            previous,
        }
    }
}

/// Restores the flag's prior value on drop, including during unwinding.
#[derive(Debug)]
pub struct ReplayGuard {
    active: Rc<Cell<bool>>,
    previous: bool,
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        self.active.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::ReplayFlag;

    #[test]
    fn guard_clears_flag_on_drop() {
        let flag = ReplayFlag::new();
        let observer = flag.clone();
        {
            let _guard = flag.enter();
            assert!(observer.is_active());
        }
        assert!(!observer.is_active());
    }

    #[test]
    fn guard_clears_flag_when_unwinding() {
        let flag = ReplayFlag::new();
        let inner = flag.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inner.enter();
            panic!("replay failed");
        }));
        assert!(result.is_err());
        assert!(!flag.is_active());
    }

    #[test]
    fn nested_guards_restore_outer_state() {
        let flag = ReplayFlag::new();
        let outer = flag.enter();
        {
            let _inner = flag.enter();
        }
        assert!(flag.is_active());
        drop(outer);
        assert!(!flag.is_active());
    }
}
