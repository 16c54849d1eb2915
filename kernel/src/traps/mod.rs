// =============================================================================
// EmberOS — Descriptor Tables and Interrupt Plumbing
// =============================================================================
//
// Construction and activation of the two CPU-defined tables, plus the Rust
// side of interrupt delivery:
//
//   init_gdt()    — build + load the flat GDT, reload every segment register
//   init_idt()    — populate all 256 gates, load, register the timer handler
//   handlers.rs   — vector → handler table and the C-ABI dispatch entry
//
// `build_idt` is separated from activation so its table-shape rules are
// testable on the host with fake stub addresses.
// =============================================================================

pub mod handlers;

use crate::arch::idt::{GateFlags, Idt};

#[cfg(all(target_arch = "x86", target_os = "none"))]
use crate::arch::gdt::{Gdt, Selectors};
#[cfg(all(target_arch = "x86", target_os = "none"))]
use crate::arch::x86::stubs;
#[cfg(all(target_arch = "x86", target_os = "none"))]
use spin::Once;

/// Vector 0: the timer. Advances the tick counter on each delivery.
pub const VECTOR_TIMER: u8 = 0;

/// Vector 1: wired to a stub but deliberately left without a handler, as a
/// landing pad for experiments with `int 1`.
pub const VECTOR_SPARE: u8 = 1;

#[cfg(all(target_arch = "x86", target_os = "none"))]
static GDT: Once<(Gdt, Selectors)> = Once::new();

#[cfg(all(target_arch = "x86", target_os = "none"))]
static IDT: Once<Idt> = Once::new();

/// Builds and activates the kernel's own GDT, replacing whatever provisional
/// table the loader left behind.
///
/// After this returns, CS holds the flat code selector and every data
/// segment register holds the flat data selector.
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn init_gdt() {
    let (gdt, selectors) = GDT.call_once(Gdt::new);

    // SAFETY: the table lives in a `static` (via Once), so it outlives the
    // lgdt registration; the selectors match the entries just built.
    unsafe {
        gdt.load(selectors);
    }

    log::debug!(
        "GDT active: code={:#04x} data={:#04x}",
        selectors.code,
        selectors.data
    );
}

/// Populates and activates the IDT, then registers the timer handler.
///
/// Must run after [`init_gdt`]: the gates embed the flat code selector.
/// Interrupts are still masked when this returns; nothing in this build
/// ever sets IF, so only explicit `int` instructions can reach the gates.
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn init_idt() {
    let idt = IDT.call_once(|| {
        build_idt(
            crate::arch::gdt::Selectors::FLAT.code,
            stubs::vector0_entry as u32,
            stubs::vector1_entry as u32,
        )
    });
    idt.load();

    handlers::install(VECTOR_TIMER, handlers::timer_tick);

    log::debug!("IDT active: 256 gates, vectors 0-1 wired");
}

/// Constructs the full 256-gate table: every vector written (absent by
/// default), then present 32-bit interrupt gates for the timer and spare
/// vectors pointing at their trampoline stubs.
fn build_idt(code_selector: u16, timer_stub: u32, spare_stub: u32) -> Idt {
    let mut idt = Idt::new();
    let flags = GateFlags::PRESENT | GateFlags::INTERRUPT_GATE_32;
    idt.set_gate(VECTOR_TIMER, timer_stub, code_selector, flags);
    idt.set_gate(VECTOR_SPARE, spare_stub, code_selector, flags);
    idt
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: u16 = 0x08;
    const TIMER_STUB: u32 = 0x0010_1000;
    const SPARE_STUB: u32 = 0x0010_1008;

    #[test]
    fn built_table_wires_exactly_two_vectors() {
        let idt = build_idt(CODE, TIMER_STUB, SPARE_STUB);

        let timer = idt.entry(VECTOR_TIMER);
        assert!(timer.is_present());
        assert_eq!(timer.handler(), TIMER_STUB);
        assert_eq!(timer.selector(), CODE);
        assert_eq!(timer.flags(), 0x8E);

        let spare = idt.entry(VECTOR_SPARE);
        assert!(spare.is_present());
        assert_eq!(spare.handler(), SPARE_STUB);
        assert_eq!(spare.selector(), CODE);
        assert_eq!(spare.flags(), 0x8E);
    }

    #[test]
    fn built_table_leaves_the_rest_absent() {
        let idt = build_idt(CODE, TIMER_STUB, SPARE_STUB);
        for (vector, gate) in idt.entries().enumerate() {
            if vector > 1 {
                assert_eq!(gate.to_bits(), 0, "vector {vector} should be absent");
            }
        }
    }
}
