// =============================================================================
// EmberOS — Multiboot Boot Hand-off
// =============================================================================
//
// The very first instructions the kernel executes. The multiboot loader
// (GRUB, or QEMU's -kernel) arrives here in 32-bit protected mode with:
//   - EAX = 0x2BADB002 (the loader's validation magic)
//   - EBX = physical pointer to the multiboot information block
//   - interrupts disabled, paging off, a GDT we do not own
//   - NO usable stack
//
// `_start` therefore does exactly four things, in order:
//   1. Point ESP at our own 16 KiB boot stack — no call is safe before this
//   2. Push EBX then EAX so they arrive as `kmain(magic, info)` per cdecl
//   3. Call `kmain`
//   4. If `kmain` ever returns, mask interrupts and halt forever; a kernel
//      must never fall off the end into undefined memory
//
// The multiboot header itself lives in its own section so the linker script
// can place it within the first 8 KiB of the image where the loader scans
// for it.
// =============================================================================

use core::arch::global_asm;

/// The magic value a multiboot loader leaves in EAX.
pub const MULTIBOOT_LOADER_MAGIC: u32 = 0x2BAD_B002;

global_asm!(
    r#"
# ---------------------------------------------------------------------------
# Multiboot v1 header. flags = 0x3: page-align modules + provide memory info.
# checksum = -(magic + flags) so the three fields sum to zero.
# ---------------------------------------------------------------------------
.section .multiboot, "a"
.align 4
.long 0x1BADB002
.long 0x00000003
.long 0xE4524FFB

# ---------------------------------------------------------------------------
# Entry point.
# ---------------------------------------------------------------------------
.section .text._start, "ax"
.global _start
.type _start, @function
_start:
    cli

    # A stack before anything else — the call below already needs one.
    lea esp, [boot_stack_top]

    # Hand the loader's two registers to kmain as (magic, info).
    push ebx
    push eax
    call kmain

    # kmain never returns; if it somehow does, park the CPU for good.
1:
    cli
    hlt
    jmp 1b
.size _start, . - _start

# ---------------------------------------------------------------------------
# 16 KiB boot stack. Grows downward from boot_stack_top.
# ---------------------------------------------------------------------------
.section .bss.boot_stack, "aw", @nobits
.align 16
boot_stack_bottom:
    .skip 16384
boot_stack_top:
"#
);

/// Minimal typed view of the multiboot information block.
///
/// The full structure carries much more (module list, memory map, boot
/// device); this kernel only consumes the conventional-memory figures, so
/// only the leading fields are modeled. The pointer comes straight from
/// EBX and is only dereferenced after the magic check in `kmain`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct MultibootInfo {
    /// Validity bitmap for the remaining fields.
    pub flags: u32,
    /// KiB of conventional memory below 1 MiB (valid when flags bit 0 set).
    pub mem_lower: u32,
    /// KiB of memory above 1 MiB (valid when flags bit 0 set).
    pub mem_upper: u32,
}

impl MultibootInfo {
    /// Flags bit 0: mem_lower/mem_upper are valid.
    const FLAG_MEMORY: u32 = 1 << 0;

    /// Conventional memory figures `(lower, upper)` in KiB, when the
    /// loader provided them.
    pub fn memory_bounds(&self) -> Option<(u32, u32)> {
        if self.flags & Self::FLAG_MEMORY != 0 {
            Some((self.mem_lower, self.mem_upper))
        } else {
            None
        }
    }
}
