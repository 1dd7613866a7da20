use std::time::Duration;

/// Blocking wait between status polls.
///
/// Production code uses [`ThreadSleeper`]; tests substitute a recorder so
/// polling runs without real delay.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
