// =============================================================================
// EmberOS — x86 Protected-Mode Platform Layer
// =============================================================================
//
// Everything that touches privileged instructions or boot-time assembly.
// All `unsafe` hardware access in the kernel is concentrated here; the rest
// of the tree is safe Rust calling into these abstractions.
//
//   boot.rs   — multiboot header, `_start`, boot stack, boot-info view
//   stubs.rs  — per-vector interrupt entry stubs + shared trampoline
//   cpu.rs    — hlt, interrupt flag, port I/O (inert stand-ins on the host)
//   serial.rs — polled 16550 COM1 for debug output
// =============================================================================

pub mod cpu;
pub mod serial;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod boot;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod stubs;
