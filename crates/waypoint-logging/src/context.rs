//! Per-thread "current stop"
//!
//! Routing work usually happens on behalf of one stop. Holding a
//! [`StopContextGuard`] while doing it lets [`crate::StopContextLayer`]
//! tag every span opened in that scope with the stop, without threading
//! the id through each call.

use std::cell::RefCell;

use uuid::Uuid;
use waypoint_core::StopId;

/// The stop a scope is working for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopContextData {
    pub stop_id: StopId,
    /// Distinguishes two scopes entered for the same stop
    pub scope_id: Uuid,
}

thread_local! {
    static CURRENT_STOP: RefCell<Option<StopContextData>> = const { RefCell::new(None) };
}

/// Sets the current stop until dropped, then restores the outer one
///
/// ```ignore
/// let _stop = StopContextGuard::new(&depot);
/// network.synchronise(&depot)?; // spans here carry `depot`
/// ```
#[must_use = "the stop context ends when the guard is dropped"]
pub struct StopContextGuard {
    outer: Option<StopContextData>,
}

impl StopContextGuard {
    pub fn new(stop: &StopId) -> Self {
        Self::with_scope_id(stop, Uuid::new_v4())
    }

    /// Enter a scope with a caller-chosen id, e.g. to correlate with a request
    pub fn with_scope_id(stop: &StopId, scope_id: Uuid) -> Self {
        let data = StopContextData {
            stop_id: stop.clone(),
            scope_id,
        };
        let outer = CURRENT_STOP.with(|current| current.replace(Some(data)));
        Self { outer }
    }

    /// Context of the innermost live guard on this thread
    pub fn current() -> Option<StopContextData> {
        CURRENT_STOP.with(|current| current.borrow().clone())
    }

    pub fn current_stop_id() -> Option<StopId> {
        CURRENT_STOP.with(|current| current.borrow().as_ref().map(|data| data.stop_id.clone()))
    }
}

impl Drop for StopContextGuard {
    fn drop(&mut self) {
        let outer = self.outer.take();
        CURRENT_STOP.with(|current| *current.borrow_mut() = outer);
    }
}

/// Evaluate `$body` with `$stop` as the current stop
///
/// ```ignore
/// let report = with_stop_context!(&depot, { network.synchronise(&depot) });
/// ```
#[macro_export]
macro_rules! with_stop_context {
    ($stop:expr, $body:block) => {{
        let _stop_context = $crate::context::StopContextGuard::new($stop);
        $body
    }};
}
