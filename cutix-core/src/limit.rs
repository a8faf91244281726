//! Cooperative work limits for the candidate-search loops.

/// Polled between candidate evaluations so a caller can stop a long search.
///
/// Stopping early never invalidates a result: the loops only skip candidates
/// they have not tried yet.
pub trait LimitCheck {
    fn limit_reached(&mut self) -> bool;
}

impl<F: FnMut() -> bool> LimitCheck for F {
    fn limit_reached(&mut self) -> bool {
        self()
    }
}

/// A limit that never triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimit;

impl LimitCheck for NoLimit {
    fn limit_reached(&mut self) -> bool {
        false
    }
}
