//! Global tick counter, advanced by the timer vector.

use core::sync::atomic::{AtomicU32, Ordering};

/// Nominal timer rate used to turn ticks into seconds for display.
pub const TICKS_PER_SECOND: u32 = 100;

static TICKS: AtomicU32 = AtomicU32::new(0);

/// Advances the clock by one tick. Called from the timer handler; wraps
/// around on overflow rather than panicking.
pub fn tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Ticks since boot.
pub fn now() -> u32 {
    TICKS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate() {
        // Other tests share the global counter, so check the delta is at
        // least what we contributed.
        let before = now();
        tick();
        tick();
        tick();
        assert!(now().wrapping_sub(before) >= 3);
    }
}
