//! Global Descriptor Table (GDT) for 32-bit protected mode.
//!
//! The GDT here implements a flat memory model: every segment spans the
//! full 4 GiB address space, so segmentation imposes no protection beyond
//! the privilege ring. Three entries, fixed for the kernel's lifetime:
//!
//! - Entry 0: Null descriptor (mandated by the CPU, all zero)
//! - Entry 1: Kernel code, base 0, limit 4 GiB, executable+readable, ring 0
//! - Entry 2: Kernel data, base 0, limit 4 GiB, writable, ring 0
//!
//! A malformed access byte or limit does not fail here — it raises a
//! general-protection fault on the first segment-relative access after
//! activation, which this kernel treats as fatal. The layouts below are
//! therefore checked byte-for-byte by compile-time asserts and unit tests.

use bitflags::bitflags;
use core::mem::{offset_of, size_of};

/// Number of GDT entries: null, kernel code, kernel data.
const GDT_ENTRIES: usize = 3;

bitflags! {
    /// Segment descriptor access byte (bits 40-47 of the descriptor).
    ///
    /// The DPL field (bits 5-6) is zero for ring 0, so it never appears in
    /// the kernel's flag combinations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentAccess: u8 {
        /// Segment is present in memory. Clear = any load faults.
        const PRESENT     = 1 << 7;
        /// Descriptor privilege level 3 (both DPL bits set).
        const RING_3      = 3 << 5;
        /// Code/data descriptor (S bit). Clear = system descriptor (TSS etc).
        const CODE_DATA   = 1 << 4;
        /// Executable (code segment). Clear = data segment.
        const EXECUTABLE  = 1 << 3;
        /// Code: conforming. Data: grows down.
        const CONFORMING  = 1 << 2;
        /// Code: readable. Data: writable.
        const READ_WRITE  = 1 << 1;
        /// Set by the CPU on first use.
        const ACCESSED    = 1 << 0;
    }
}

/// Flag nibble stored in the high half of the granularity byte.
///
/// G=1 counts the 20-bit limit in 4 KiB pages; D=1 selects 32-bit default
/// operand size. Together: 0xC0, which combined with limit bits 16-19 of
/// 0xFFFFF yields the canonical 0xCF granularity byte of a flat segment.
const FLAGS_4K_32BIT: u8 = 0xC0;

/// Maximum 20-bit limit. With 4 KiB granularity this covers all 4 GiB.
const LIMIT_FLAT: u32 = 0xFFFFF;

/// A segment descriptor in the GDT.
///
/// Hardware-defined 8-byte layout. The base address is split across three
/// non-contiguous fields and the limit across two, which is why this struct
/// only exposes builder/accessor functions rather than raw fields:
///
/// - Bits 0-15:  Limit bits 0-15
/// - Bits 16-39: Base bits 0-23
/// - Bits 40-47: Access byte
/// - Bits 48-51: Limit bits 16-19
/// - Bits 52-55: Flags (G, D/B, L, AVL)
/// - Bits 56-63: Base bits 24-31
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SegmentDescriptor {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    granularity: u8,
    base_high: u8,
}

impl SegmentDescriptor {
    /// The null descriptor (required as the first GDT entry).
    pub const NULL: Self = Self {
        limit_low: 0,
        base_low: 0,
        base_mid: 0,
        access: 0,
        granularity: 0,
        base_high: 0,
    };

    /// Build a descriptor from its logical fields, performing the base and
    /// limit splits the hardware layout demands.
    pub const fn new(base: u32, limit: u32, access: SegmentAccess, flags: u8) -> Self {
        Self {
            limit_low: (limit & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: ((base >> 16) & 0xFF) as u8,
            access: access.bits(),
            granularity: (((limit >> 16) & 0x0F) as u8) | (flags & 0xF0),
            base_high: ((base >> 24) & 0xFF) as u8,
        }
    }

    /// Flat ring-0 code segment: base 0, limit 4 GiB, access byte 0x9A.
    pub const fn flat_code() -> Self {
        Self::new(
            0,
            LIMIT_FLAT,
            SegmentAccess::PRESENT
                .union(SegmentAccess::CODE_DATA)
                .union(SegmentAccess::EXECUTABLE)
                .union(SegmentAccess::READ_WRITE),
            FLAGS_4K_32BIT,
        )
    }

    /// Flat ring-0 data segment: base 0, limit 4 GiB, access byte 0x92.
    pub const fn flat_data() -> Self {
        Self::new(
            0,
            LIMIT_FLAT,
            SegmentAccess::PRESENT
                .union(SegmentAccess::CODE_DATA)
                .union(SegmentAccess::READ_WRITE),
            FLAGS_4K_32BIT,
        )
    }

    /// Reassembled 32-bit base address.
    pub const fn base(&self) -> u32 {
        self.base_low as u32 | (self.base_mid as u32) << 16 | (self.base_high as u32) << 24
    }

    /// Reassembled 20-bit limit (units depend on the G flag).
    pub const fn limit(&self) -> u32 {
        self.limit_low as u32 | ((self.granularity & 0x0F) as u32) << 16
    }

    /// Raw access byte.
    pub const fn access(&self) -> u8 {
        self.access
    }

    /// Raw granularity byte (flags nibble | limit bits 16-19).
    pub const fn granularity(&self) -> u8 {
        self.granularity
    }

    /// The descriptor as the u64 the CPU reads, for whole-entry checks.
    pub const fn to_bits(&self) -> u64 {
        (self.limit_low as u64)
            | (self.base_low as u64) << 16
            | (self.base_mid as u64) << 32
            | (self.access as u64) << 40
            | (self.granularity as u64) << 48
            | (self.base_high as u64) << 56
    }
}

/// Segment selectors for the GDT entries.
///
/// A selector is the byte offset of its entry; ring bits are zero since
/// everything here is ring 0.
#[derive(Debug, Clone, Copy)]
pub struct Selectors {
    pub code: u16,
    pub data: u16,
}

impl Selectors {
    /// Selectors matching [`Gdt::new`]'s fixed layout. These two constants
    /// are hardware-facing: 0x08 is baked into every IDT gate, 0x10 into
    /// the trampoline's segment reload.
    pub const FLAT: Self = Self { code: 0x08, data: 0x10 };
}

/// The Global Descriptor Table.
///
/// Layout is fixed and deterministic — `new()` takes no inputs and always
/// produces the same three entries.
#[repr(C, align(8))]
pub struct Gdt {
    entries: [SegmentDescriptor; GDT_ENTRIES],
}

impl Gdt {
    /// Build the flat three-entry table. Construction only; nothing is
    /// loaded into the CPU until [`Gdt::load`].
    pub const fn new() -> (Self, Selectors) {
        let gdt = Self {
            entries: [
                SegmentDescriptor::NULL,      // 0x00: Null
                SegmentDescriptor::flat_code(), // 0x08: Kernel code
                SegmentDescriptor::flat_data(), // 0x10: Kernel data
            ],
        };
        (gdt, Selectors::FLAT)
    }

    /// Entry accessor, used by the layout tests.
    pub fn entry(&self, index: usize) -> &SegmentDescriptor {
        &self.entries[index]
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        GDT_ENTRIES
    }

    /// Load this GDT and switch to its segments.
    ///
    /// Three steps:
    ///   1. `lgdt` with the (limit, base) pointer
    ///   2. far control transfer through the new code selector — CS cannot
    ///      be written with a plain mov; instructions must be re-fetched
    ///      through the new descriptor
    ///   3. reload every data segment register with the new data selector
    ///
    /// Only step 1 has a mandated position; the CS transfer and the data
    /// reloads are independent of each other and could run in either
    /// order, as long as both complete before anything relies on the new
    /// segments. CS-first is used here because a fault between the two
    /// steps then arrives with a code segment the new table can describe.
    ///
    /// # Safety
    ///
    /// The GDT must remain valid (and at a fixed address) for the lifetime
    /// of the system — the CPU keeps reading it through the loaded pointer.
    /// The selectors must match this table's layout.
    #[cfg(all(target_arch = "x86", target_os = "none"))]
    pub unsafe fn load(&'static self, selectors: &Selectors) {
        use core::arch::asm;

        let ptr = GdtPointer {
            limit: (size_of::<Self>() - 1) as u16,
            base: self as *const _ as u32,
        };

        unsafe {
            // Load the GDT register.
            asm!(
                "lgdt [{}]",
                in(reg) &ptr,
                options(readonly, nostack, preserves_flags)
            );

            // Reload CS by pushing the new selector and a return address,
            // then doing a far return.
            asm!(
                "push {sel}",
                "lea {tmp}, [2f]",
                "push {tmp}",
                "retf",
                "2:",
                sel = in(reg) selectors.code as u32,
                tmp = lateout(reg) _,
                options(preserves_flags)
            );

            // Reload the data segment registers.
            asm!(
                "mov ds, {sel:x}",
                "mov es, {sel:x}",
                "mov fs, {sel:x}",
                "mov gs, {sel:x}",
                "mov ss, {sel:x}",
                sel = in(reg) selectors.data as u16,
                options(nostack, preserves_flags)
            );
        }
    }
}

/// Pointer structure for the `lgdt` instruction: 16-bit limit (table size
/// in bytes minus one) followed by the 32-bit linear base.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct GdtPointer {
    pub limit: u16,
    pub base: u32,
}

// The CPU reads these structures byte-for-byte; field order and size are
// part of the hardware contract, not an implementation detail.
const _: () = assert!(size_of::<SegmentDescriptor>() == 8);
const _: () = assert!(size_of::<Gdt>() == 24);
const _: () = assert!(size_of::<GdtPointer>() == 6);
const _: () = assert!(offset_of!(SegmentDescriptor, access) == 5);
const _: () = assert!(offset_of!(SegmentDescriptor, base_high) == 7);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_descriptor_is_all_zero() {
        let (gdt, _) = Gdt::new();
        assert_eq!(gdt.entry(0).to_bits(), 0);
    }

    #[test]
    fn flat_code_and_data_share_extent() {
        let (gdt, _) = Gdt::new();
        let code = gdt.entry(1);
        let data = gdt.entry(2);

        // Identical base and limit encoding — the flat-model invariant.
        assert_eq!(code.base(), 0);
        assert_eq!(data.base(), 0);
        assert_eq!(code.limit(), 0xFFFFF);
        assert_eq!(data.limit(), code.limit());
        assert_eq!(code.granularity(), data.granularity());
    }

    #[test]
    fn access_bytes_match_hardware_contract() {
        let (gdt, _) = Gdt::new();
        // 0x9A: present, ring 0, code/data, executable, readable.
        assert_eq!(gdt.entry(1).access(), 0x9A);
        // 0x92: present, ring 0, code/data, writable, NOT executable.
        assert_eq!(gdt.entry(2).access(), 0x92);
        assert_eq!(gdt.entry(1).access() & (1 << 3), 1 << 3);
        assert_eq!(gdt.entry(2).access() & (1 << 3), 0);
    }

    #[test]
    fn granularity_byte_is_4k_32bit_flat() {
        let (gdt, _) = Gdt::new();
        assert_eq!(gdt.entry(1).granularity(), 0xCF);
        assert_eq!(gdt.entry(2).granularity(), 0xCF);
    }

    #[test]
    fn selectors_are_entry_offsets() {
        let (_, selectors) = Gdt::new();
        assert_eq!(selectors.code, 0x08);
        assert_eq!(selectors.data, 0x10);
    }

    #[test]
    fn base_split_reassembles() {
        let d = SegmentDescriptor::new(0xAABB_CCDD, 0x12345, SegmentAccess::PRESENT, 0xC0);
        assert_eq!(d.base(), 0xAABB_CCDD);
        assert_eq!(d.limit(), 0x12345 & 0xFFFFF);
    }
}
