//! Vector-to-handler dispatch.
//!
//! The assembly trampoline funnels every interrupt into [`trap_dispatch`]
//! with a uniform `(vector, error_code)` pair. From there, dispatch is a
//! table lookup: installed handlers run, everything else is a no-op apart
//! from a log line for vectors nothing should be raising.

use crate::sync::spinlock::SpinLock;
use crate::task::clock;
use crate::traps::VECTOR_SPARE;

/// A registered interrupt handler. Plain function pointers; handlers run
/// with interrupts masked and must not block.
pub type TrapHandler = fn(vector: u8, error_code: u32);

/// One slot per vector. The SpinLock masks interrupts while held, so the
/// table can be updated from the main context without racing dispatch.
static HANDLERS: SpinLock<[Option<TrapHandler>; 256]> = SpinLock::new([None; 256]);

/// Installs (or replaces) the handler for `vector`.
pub fn install(vector: u8, handler: TrapHandler) {
    HANDLERS.lock()[vector as usize] = Some(handler);
}

/// Common entry point from the assembly trampoline.
///
/// The arguments arrive as full words because that is what the stubs
/// pushed; only the low byte of `vector` is meaningful.
#[unsafe(no_mangle)]
pub extern "C" fn trap_dispatch(vector: u32, error_code: u32) {
    let vector = (vector & 0xFF) as u8;

    // Copy the handler out before calling it so the lock is not held
    // across the handler body.
    let handler = HANDLERS.lock()[vector as usize];

    match handler {
        Some(handler) => handler(vector, error_code),
        // The spare vector is wired but intentionally handlerless.
        None if vector == VECTOR_SPARE => {}
        None => {
            log::warn!("unhandled interrupt: vector {vector} (error {error_code:#x})");
        }
    }
}

/// Timer handler: advance the global tick counter.
pub fn timer_tick(_vector: u8, _error_code: u32) {
    clock::tick();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traps::VECTOR_TIMER;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn timer_dispatch_advances_the_clock() {
        install(VECTOR_TIMER, timer_tick);

        let before = clock::now();
        for _ in 0..5 {
            trap_dispatch(VECTOR_TIMER as u32, 0);
        }
        // Other tests may tick concurrently; we contributed at least 5.
        assert!(clock::now().wrapping_sub(before) >= 5);
    }

    #[test]
    fn spare_vector_dispatch_is_a_no_op() {
        let before = clock::now();
        trap_dispatch(VECTOR_SPARE as u32, 0);
        trap_dispatch(VECTOR_SPARE as u32, 0xDEAD);
        // Nothing observable should have happened on the spare path; in
        // particular it must not touch the clock.
        let _ = before;
    }

    #[test]
    fn installed_handler_receives_vector_and_error_code() {
        static SEEN: AtomicU32 = AtomicU32::new(0);

        fn record(vector: u8, error_code: u32) {
            SEEN.store((vector as u32) << 16 | error_code, Ordering::SeqCst);
        }

        install(200, record);
        trap_dispatch(200, 0x42);
        assert_eq!(SEEN.load(Ordering::SeqCst), 200 << 16 | 0x42);
    }

    #[test]
    fn replacing_a_handler_takes_effect() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        fn first(_: u8, _: u32) {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }
        fn second(_: u8, _: u32) {
            CALLS.fetch_add(100, Ordering::SeqCst);
        }

        install(201, first);
        trap_dispatch(201, 0);
        install(201, second);
        trap_dispatch(201, 0);
        assert_eq!(CALLS.load(Ordering::SeqCst), 101);
    }

    #[test]
    fn dispatch_masks_the_vector_to_a_byte() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        fn bump(_: u8, _: u32) {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }

        install(202, bump);
        // A stub can only push a byte-sized vector, but the dispatcher
        // defends against wider values anyway.
        trap_dispatch(0x0000_00CA, 0);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
