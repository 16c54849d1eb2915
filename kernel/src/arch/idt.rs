//! Interrupt Descriptor Table (IDT) for 32-bit protected mode.
//!
//! The IDT maps each of the 256 interrupt vectors to a gate descriptor
//! telling the CPU where to transfer control. Every slot is written before
//! the table is activated — a vector with no real handler gets an absent
//! (all-zero) gate, never garbage, so any interrupt the CPU might raise
//! resolves to a defined entry.

use bitflags::bitflags;
use core::mem::{offset_of, size_of};

/// Number of entries in the IDT. x86 defines 256 interrupt vectors (0-255).
pub const IDT_ENTRIES: usize = 256;

bitflags! {
    /// Gate descriptor flags byte.
    ///
    /// Low nibble is the gate type; 0xE is a 32-bit interrupt gate (the CPU
    /// clears IF on entry, so handlers never nest). The canonical value for
    /// every gate in this kernel is `PRESENT | INTERRUPT_GATE_32` = 0x8E.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GateFlags: u8 {
        /// Gate is present. Clear = the vector raises #NP / double fault.
        const PRESENT           = 1 << 7;
        /// Privilege required to invoke via `int` (both DPL bits set).
        const RING_3            = 3 << 5;
        /// 32-bit interrupt gate type.
        const INTERRUPT_GATE_32 = 0x0E;
        /// 32-bit trap gate type (does not clear IF on entry). Unused here.
        const TRAP_GATE_32      = 0x0F;
    }
}

/// An entry in the IDT.
///
/// Hardware-defined 8-byte layout; the handler address is split into two
/// 16-bit halves around the selector and flags:
///
/// - Bits 0-15:  Handler offset bits 0-15
/// - Bits 16-31: Code segment selector (always 0x08 here)
/// - Bits 32-39: Reserved, must be zero
/// - Bits 40-47: Flags (present, DPL, gate type)
/// - Bits 48-63: Handler offset bits 16-31
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct GateDescriptor {
    offset_low: u16,
    selector: u16,
    zero: u8,
    flags: u8,
    offset_high: u16,
}

impl GateDescriptor {
    /// An absent gate (disabled vector). All fields zero, matching the
    /// "initialize everything first" invariant.
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            zero: 0,
            flags: 0,
            offset_high: 0,
        }
    }

    /// Build a gate pointing at a handler entry point.
    ///
    /// `handler` is the linear address of the trampoline stub for this
    /// vector; `selector` is the code segment the CPU switches to.
    pub const fn new(handler: u32, selector: u16, flags: GateFlags) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            zero: 0,
            flags: flags.bits(),
            offset_high: (handler >> 16) as u16,
        }
    }

    /// Reassembled handler address.
    pub const fn handler(&self) -> u32 {
        self.offset_low as u32 | (self.offset_high as u32) << 16
    }

    /// Code segment selector field.
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    /// Raw flags byte.
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Reserved byte (must stay zero).
    pub const fn reserved(&self) -> u8 {
        self.zero
    }

    /// Whether the present bit is set.
    pub const fn is_present(&self) -> bool {
        self.flags & GateFlags::PRESENT.bits() != 0
    }

    /// The descriptor as the u64 the CPU reads.
    pub const fn to_bits(&self) -> u64 {
        (self.offset_low as u64)
            | (self.selector as u64) << 16
            | (self.zero as u64) << 32
            | (self.flags as u64) << 40
            | (self.offset_high as u64) << 48
    }
}

/// The Interrupt Descriptor Table: 256 gates, one per vector.
#[repr(C, align(8))]
pub struct Idt {
    entries: [GateDescriptor; IDT_ENTRIES],
}

impl Idt {
    /// A table with every vector written as absent. This is the mandatory
    /// starting state — real gates are overwritten on top of it.
    pub const fn new() -> Self {
        Self {
            entries: [GateDescriptor::missing(); IDT_ENTRIES],
        }
    }

    /// Install a gate for `vector`.
    pub fn set_gate(&mut self, vector: u8, handler: u32, selector: u16, flags: GateFlags) {
        self.entries[vector as usize] = GateDescriptor::new(handler, selector, flags);
    }

    /// Gate accessor.
    pub fn entry(&self, vector: u8) -> &GateDescriptor {
        &self.entries[vector as usize]
    }

    /// Iterate over all 256 gates (used by the well-formedness tests).
    pub fn entries(&self) -> impl Iterator<Item = &GateDescriptor> {
        self.entries.iter()
    }

    /// Load this IDT into the CPU with `lidt`.
    ///
    /// Precondition (enforced by the caller, `traps::init_idt`): every slot
    /// has been written, and interrupts are still disabled — enabling them
    /// before this load is undefined behavior at the hardware level.
    #[cfg(all(target_arch = "x86", target_os = "none"))]
    pub fn load(&'static self) {
        let ptr = IdtPointer {
            limit: (size_of::<Self>() - 1) as u16,
            base: self as *const _ as u32,
        };

        unsafe {
            core::arch::asm!(
                "lidt [{}]",
                in(reg) &ptr,
                options(readonly, nostack, preserves_flags)
            );
        }
    }
}

/// Pointer structure for the `lidt` instruction, same shape as the GDT's:
/// 16-bit limit (size in bytes minus one) + 32-bit linear base.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtPointer {
    pub limit: u16,
    pub base: u32,
}

const _: () = assert!(size_of::<GateDescriptor>() == 8);
const _: () = assert!(size_of::<Idt>() == 2048);
const _: () = assert!(size_of::<IdtPointer>() == 6);
const _: () = assert!(offset_of!(GateDescriptor, selector) == 2);
const _: () = assert!(offset_of!(GateDescriptor, flags) == 5);
const _: () = assert!(offset_of!(GateDescriptor, offset_high) == 6);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_has_all_gates_absent() {
        let idt = Idt::new();
        let mut count = 0;
        for gate in idt.entries() {
            assert_eq!(gate.to_bits(), 0);
            count += 1;
        }
        assert_eq!(count, IDT_ENTRIES);
    }

    #[test]
    fn gate_encoding_splits_handler_address() {
        let flags = GateFlags::PRESENT | GateFlags::INTERRUPT_GATE_32;
        let gate = GateDescriptor::new(0xDEAD_BEEF, 0x08, flags);
        assert_eq!(gate.handler(), 0xDEAD_BEEF);
        assert_eq!(gate.selector(), 0x08);
        assert_eq!(gate.flags(), 0x8E);
        assert_eq!(gate.reserved(), 0);
        assert!(gate.is_present());
    }

    #[test]
    fn installed_gates_are_fully_formed() {
        // Every gate must be fully absent or fully present — a partially
        // initialized entry is the misconfiguration the invariant forbids.
        let mut idt = Idt::new();
        idt.set_gate(0, 0x0010_0000, 0x08, GateFlags::PRESENT | GateFlags::INTERRUPT_GATE_32);
        idt.set_gate(1, 0x0010_0040, 0x08, GateFlags::PRESENT | GateFlags::INTERRUPT_GATE_32);

        for (vector, gate) in idt.entries().enumerate() {
            if gate.is_present() {
                assert!(vector <= 1);
                assert_eq!(gate.selector(), 0x08);
                assert_eq!(gate.flags(), 0x8E);
                assert_ne!(gate.handler(), 0);
                assert_eq!(gate.reserved(), 0);
            } else {
                assert_eq!(gate.to_bits(), 0);
            }
        }
    }
}
