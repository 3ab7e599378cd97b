//! Dirty flag coalescing redraw requests into at most one draw per
//! animation frame.

use std::cell::Cell;

/// Set by input handlers, consumed once per frame by the render loop.
///
/// Any number of [`request`](Self::request) calls between two
/// [`take`](Self::take) calls produce a single redraw.
#[derive(Debug, Default)]
pub struct RedrawFlag(Cell<bool>);

impl RedrawFlag {
    /// Create a flag with no pending redraw.
    #[must_use]
    pub const fn new() -> Self {
        Self(Cell::new(false))
    }

    /// Mark the composite as stale.
    pub fn request(&self) {
        self.0.set(true);
    }

    /// Whether a redraw is pending, without consuming it.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.get()
    }

    /// Consume the pending redraw, returning whether there was one.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}
