//! Reentrancy guard for document-to-form pushes.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag that is raised while a session pushes document values into
/// controls.
///
/// Entering returns a [`GuardToken`]; the guard stays raised until every
/// token is dropped, including during panic unwinding.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    depth: Rc<Cell<usize>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    /// Raise the guard until the returned token is dropped.
    pub fn enter(&self) -> GuardToken {
        self.depth.set(self.depth.get() + 1);
        GuardToken {
            depth: Rc::clone(&self.depth),
        }
    }
}

/// Keeps a [`ReentrancyGuard`] raised while alive.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct GuardToken {
    depth: Rc<Cell<usize>>,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_scope() {
        let guard = ReentrancyGuard::new();
        assert!(!guard.is_active());
        {
            let _token = guard.enter();
            assert!(guard.is_active());
            let inner = guard.enter();
            drop(inner);
            assert!(guard.is_active(), "outer token still held");
        }
        assert!(!guard.is_active());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = ReentrancyGuard::new();
        let shared = guard.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _token = shared.enter();
            panic!("control update failed");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active(), "guard must be cleared after unwinding");
    }
}
