// =============================================================================
// EmberOS — Ticket Spinlock
// =============================================================================
//
// The kernel's one mutual-exclusion primitive. A ticket lock is the simplest
// fair lock: take a ticket, spin until it is served, increment the serving
// counter on release.
//
// IRQ SAFETY:
//   Interrupts are disabled on this core before the lock is taken. Without
//   that, a handler firing on the same core could try to take a lock the
//   interrupted code already holds and spin forever — the classic
//   single-core spinlock deadlock. The previous interrupt-flag state is
//   saved in the guard and restored exactly on drop, so nested lock/unlock
//   pairs compose.
//
//   This also makes the lock the synchronization story for interrupt
//   handlers themselves: any state a handler shares with the main context
//   (the console, the serial port, the handler table) lives behind one of
//   these.
// =============================================================================

use crate::arch::x86::cpu;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

/// A ticket-based spinlock that disables interrupts while held.
///
/// `const fn new` makes it usable in statics, which is how every shared
/// kernel structure is declared:
///
/// ```ignore
/// static TABLE: SpinLock<[Option<Handler>; 256]> = SpinLock::new([None; 256]);
/// ```
pub struct SpinLock<T> {
    /// Next ticket to dispense; incremented by each acquirer.
    next_ticket: AtomicU32,

    /// Ticket currently holding the lock; incremented on release.
    now_serving: AtomicU32,

    /// The protected data. UnsafeCell because we mutate through a shared
    /// reference; the ticket counters provide the exclusion at runtime.
    data: UnsafeCell<T>,
}

// SAFETY: the ticket counters ensure at most one holder at a time, so
// sharing the lock is sound whenever the data itself may move between
// contexts.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates an unlocked spinlock wrapping `value`.
    pub const fn new(value: T) -> Self {
        Self {
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, disabling interrupts on this core first.
    ///
    /// Returns an RAII guard; the lock is released and the interrupt flag
    /// restored when the guard drops.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        // Save and clear the interrupt flag before touching the counters,
        // so a handler can never preempt a holder on this core.
        let irq_was_enabled = cpu::interrupts_enabled();
        cpu::disable_interrupts();

        // Relaxed is enough for the ticket grab; the Acquire spin below is
        // the synchronizing edge with the previous holder's Release.
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        while self.now_serving.load(Ordering::Acquire) != my_ticket {
            core::hint::spin_loop();
        }

        SpinLockGuard {
            lock: self,
            irq_was_enabled,
        }
    }

    /// Attempts to acquire the lock without spinning.
    ///
    /// Returns `None` if the lock is held. The option for paths that must
    /// not wait, such as a handler logging while the interrupted code might
    /// hold the output lock.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        let irq_was_enabled = cpu::interrupts_enabled();
        cpu::disable_interrupts();

        let current = self.now_serving.load(Ordering::Relaxed);
        let result = self.next_ticket.compare_exchange(
            current,
            current.wrapping_add(1),
            Ordering::Acquire,
            Ordering::Relaxed,
        );

        match result {
            Ok(_) => Some(SpinLockGuard {
                lock: self,
                irq_was_enabled,
            }),
            Err(_) => {
                cpu::restore_interrupts(irq_was_enabled);
                None
            }
        }
    }

    /// Direct access through `&mut self` — exclusive by the borrow checker,
    /// no locking needed. Used during single-context initialization.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// RAII guard for a held [`SpinLock`].
///
/// While it exists the holder has exclusive access and interrupts are
/// masked on this core; dropping it releases the lock and restores the
/// saved interrupt state.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
    irq_was_enabled: bool,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: holding the guard means holding the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: holding the guard means holding the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Release makes this holder's writes visible to the next ticket
        // before it observes the incremented counter.
        self.lock.now_serving.fetch_add(1, Ordering::Release);
        cpu::restore_interrupts(self.irq_was_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_gives_exclusive_access() {
        let lock = SpinLock::new(0u32);
        {
            let mut guard = lock.lock();
            *guard += 5;
        }
        assert_eq!(*lock.lock(), 5);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn get_mut_bypasses_the_lock() {
        let mut lock = SpinLock::new(7u32);
        *lock.get_mut() = 9;
        assert_eq!(*lock.lock(), 9);
    }

    #[test]
    fn sequential_lockers_are_served_in_order() {
        let lock = SpinLock::new(Vec::new());
        for i in 0..4 {
            lock.lock().push(i);
        }
        assert_eq!(*lock.lock(), [0, 1, 2, 3]);
    }
}
