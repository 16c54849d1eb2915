// =============================================================================
// EmberOS — CPU Utilities (x86)
// =============================================================================
//
// Thin wrappers around privileged x86 instructions: HLT, the interrupt
// flag, and port I/O. These are the "bottom" of the abstraction stack —
// minimal logic, just execute the instruction and return.
//
// Host builds (unit tests) get inert stand-ins so the pure-logic modules
// that sit on top of these compile and run under the normal test harness.
// On the host there is no interrupt flag to save and no ports to poke;
// none of the test paths reach hardware.
// =============================================================================

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod imp {
    use core::arch::asm;

    /// EFLAGS bit 9: the interrupt-enable flag (IF).
    const EFLAGS_IF: u32 = 1 << 9;

    /// Halts the CPU until the next interrupt arrives.
    ///
    /// With interrupts masked this stops the CPU for good, which is exactly
    /// what the terminal halt paths want.
    #[inline(always)]
    pub fn halt() {
        // SAFETY: HLT stops instruction execution until an interrupt fires;
        // always safe in ring 0.
        unsafe {
            asm!("hlt", options(nomem, nostack));
        }
    }

    /// Masks interrupts and halts forever. The system's only defined
    /// terminal state — used when `kmain` returns, on panic, and by the
    /// shell's `halt` command.
    #[inline(always)]
    pub fn halt_forever() -> ! {
        loop {
            // SAFETY: CLI + HLT in a loop keeps the CPU stopped; no
            // interrupt can wake us because interrupts are disabled.
            unsafe {
                asm!("cli", "hlt", options(nomem, nostack));
            }
        }
    }

    /// Whether the interrupt-enable flag is currently set.
    #[inline]
    pub fn interrupts_enabled() -> bool {
        let eflags: u32;
        // SAFETY: PUSHFD/POP only reads flag state via the stack.
        unsafe {
            asm!("pushfd", "pop {}", out(reg) eflags, options(preserves_flags));
        }
        eflags & EFLAGS_IF != 0
    }

    /// Clears the interrupt-enable flag.
    #[inline(always)]
    pub fn disable_interrupts() {
        // SAFETY: CLI only masks maskable interrupts.
        unsafe {
            asm!("cli", options(nomem, nostack));
        }
    }

    /// Restores the interrupt-enable flag to a previously saved state.
    /// The paired save/restore keeps nested critical sections correct.
    #[inline(always)]
    pub fn restore_interrupts(was_enabled: bool) {
        if was_enabled {
            // SAFETY: STI only unmasks maskable interrupts; the caller
            // saved this state with `interrupts_enabled()`.
            unsafe {
                asm!("sti", options(nomem, nostack));
            }
        }
    }

    /// Reads a byte from an I/O port.
    ///
    /// x86 has a separate I/O address space (ports 0x0000-0xFFFF) accessed
    /// with IN/OUT, not memory reads.
    #[inline]
    pub fn inb(port: u16) -> u8 {
        let value: u8;
        // SAFETY: reading an I/O port; callers pass known device registers.
        unsafe {
            asm!(
                "in al, dx",
                out("al") value,
                in("dx") port,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }

    /// Writes a byte to an I/O port.
    #[inline]
    pub fn outb(port: u16, value: u8) {
        // SAFETY: writing an I/O port; callers pass known device registers.
        unsafe {
            asm!(
                "out dx, al",
                in("dx") port,
                in("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
    }
}

#[cfg(not(all(target_arch = "x86", target_os = "none")))]
mod imp {
    pub fn halt() {}

    pub fn halt_forever() -> ! {
        loop {
            core::hint::spin_loop();
        }
    }

    pub fn interrupts_enabled() -> bool {
        false
    }

    pub fn disable_interrupts() {}

    pub fn restore_interrupts(_was_enabled: bool) {}

    pub fn inb(_port: u16) -> u8 {
        0
    }

    pub fn outb(_port: u16, _value: u8) {}
}

pub use imp::*;
