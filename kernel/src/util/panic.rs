// =============================================================================
// EmberOS — Panic Handler
// =============================================================================
//
// A kernel panic is unrecoverable: report everything we know on both
// output sinks, then stop the CPU for good. Host builds use std's handler.
// =============================================================================

#[cfg(all(target_arch = "x86", target_os = "none"))]
use crate::arch::x86::cpu;
#[cfg(all(target_arch = "x86", target_os = "none"))]
use crate::kprintln;
#[cfg(all(target_arch = "x86", target_os = "none"))]
use core::panic::PanicInfo;

#[cfg(all(target_arch = "x86", target_os = "none"))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    kprintln!();
    kprintln!("*** KERNEL PANIC ***");
    if let Some(location) = info.location() {
        kprintln!("at {}:{}:{}", location.file(), location.line(), location.column());
    }
    kprintln!("{}", info.message());
    kprintln!("system halted.");

    cpu::halt_forever()
}
