// =============================================================================
// EmberOS — Interrupt Entry Stubs
// =============================================================================
//
// The CPU knows nothing about Rust calling conventions; on an interrupt it
// pushes EFLAGS/CS/EIP (plus an error code for a handful of exception
// vectors) and jumps to the gate's handler address. These stubs bridge that
// raw entry into a normal `extern "C"` call to `trap_dispatch`.
//
// Every per-vector stub pushes the same two words so the common path sees
// one uniform frame regardless of which vector fired:
//
//   push 0          # error-code placeholder (none of our vectors get one
//                   # from hardware)
//   push <vector>   # vector number
//   jmp trap_common
//
// `trap_common` then saves every register the interrupted context owns,
// loads the kernel data segments, and calls into Rust. The restore sequence
// mirrors the save sequence exactly — any asymmetry corrupts the
// interrupted context on IRET.
//
// Stack layout at the `mov eax, [esp + ...]` lines, relative to ESP:
//
//   +0   gs            ┐
//   +4   fs            │ segment saves (4 x 4 bytes)
//   +8   es            │
//   +12  ds            ┘
//   +16  edi..eax      PUSHA block (8 x 4 bytes)
//   +48  vector        pushed by the per-vector stub
//   +52  error code    pushed by the per-vector stub
//   +56  eip/cs/eflags hardware frame
// =============================================================================

use core::arch::global_asm;

global_asm!(
    r#"
.section .text.trap_stubs, "ax"

.global vector0_entry
.type vector0_entry, @function
vector0_entry:
    push 0
    push 0
    jmp trap_common
.size vector0_entry, . - vector0_entry

.global vector1_entry
.type vector1_entry, @function
vector1_entry:
    push 0
    push 1
    jmp trap_common
.size vector1_entry, . - vector1_entry

.type trap_common, @function
trap_common:
    # Save the general registers, then the data segment registers.
    pusha
    push ds
    push es
    push fs
    push gs

    # Handlers run with the kernel's flat data segment.
    mov ax, 0x10
    mov ds, ax
    mov es, ax
    mov fs, ax
    mov gs, ax

    # The C ABI requires the direction flag clear at function entry, but
    # the interrupted context may have set it (e.g. a backward rep movs).
    # Clear it before entering compiled code; iretd restores the caller's
    # EFLAGS, DF included.
    cld

    # trap_dispatch(vector, error_code) — cdecl, args pushed right to left.
    mov eax, [esp + 48]
    mov edx, [esp + 52]
    push edx
    push eax
    call trap_dispatch
    add esp, 8

    # Unwind in exact reverse order.
    pop gs
    pop fs
    pop es
    pop ds
    popa

    # Drop the vector number and error-code placeholder.
    add esp, 8
    iretd
.size trap_common, . - trap_common
"#
);

unsafe extern "C" {
    /// Entry stub for vector 0 (timer).
    pub fn vector0_entry();
    /// Entry stub for vector 1 (reserved spare).
    pub fn vector1_entry();
}
