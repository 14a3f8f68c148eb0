//! Progress reporting for long-running operations
//!
//! Operations such as a chip erase can take minutes. Drivers call
//! [`Progress::tick`] periodically while waiting so the front end can show
//! that something is still happening. Ticks are purely cosmetic.

/// Receiver of progress ticks
pub trait Progress {
    /// Called while a long-running operation is still in progress
    fn tick(&mut self);
}

/// Discards all progress ticks
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn tick(&mut self) {}
}

impl<F: FnMut()> Progress for F {
    fn tick(&mut self) {
        self()
    }
}
