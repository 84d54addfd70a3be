//! Concurrency primitives: the resizable download gate and the rate throttle.

mod semaphore;
mod throttle;

pub use semaphore::{AcquireError, Permit, ResizableSemaphore};
pub use throttle::{ThrottleLock, WaitCanceled};
