// =============================================================================
// EmberOS — Architecture Abstraction
// =============================================================================
//
// Descriptor-table construction (gdt, idt) is plain data manipulation and
// compiles everywhere — that is what lets the layout tests run on the host.
// Everything that executes privileged instructions lives under `x86/` and
// is gated to the bare-metal target.
// =============================================================================

pub mod gdt;
pub mod idt;
pub mod x86;
