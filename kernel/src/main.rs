// =============================================================================
// EmberOS — Kernel Entry Point
// =============================================================================
//
// This is the first Rust code that runs when the kernel boots.
//
// WHAT HAPPENED BEFORE WE GOT HERE:
//   1. The BIOS initialized hardware and loaded a multiboot-compliant
//      bootloader (GRUB, or QEMU's -kernel built-in loader)
//   2. The loader found our multiboot header in the first 8 KiB of the image
//   3. The loader switched the CPU to 32-bit protected mode with its own
//      provisional GDT, interrupts disabled, paging off
//   4. The loader placed 0x2BADB002 in EAX and a pointer to the boot
//      information block in EBX
//   5. The loader jumped to `_start` (arch/x86/boot.rs)
//   6. `_start` set up our 16 KiB boot stack, pushed EBX and EAX as
//      arguments, and called `kmain()` below
//
// WHAT WE DO HERE:
//   Phase 1: "Deaf and Blind" → serial + VGA console output working
//   Phase 2: "Own the CPU"    → our flat GDT, our fully populated IDT
//   Phase 3: "Interactive"    → polled keyboard + shell
//
// The CPU arrives with interrupts disabled and they stay disabled: the IDT
// is loaded before any path could ever set IF, and this minimal build never
// sets it (the PIC is not remapped, so enabling IRQs would raise vectors we
// deliberately leave absent).
// =============================================================================

// #![no_std] / #![no_main] apply to the bare-metal image only. Host builds
// keep std so the unit tests for the pure logic (descriptor encoding, VGA
// grid, dispatch table) run under the normal test harness.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
// Allow dead code during development — several descriptor accessors exist
// for the test suite and for future fault handlers.
#![allow(dead_code)]

// =============================================================================
// Module declarations
// =============================================================================

/// Architecture-specific code (x86 protected mode).
/// Contains: boot hand-off, GDT, IDT, trampoline stubs, CPU utilities, serial.
mod arch;

/// In-kernel drivers (boot-critical only): VGA text console, polled keyboard.
mod drivers;

/// Interactive command shell (pure consumer of console + keyboard).
mod shell;

/// Synchronization primitives: interrupt-state-saving spinlock.
mod sync;

/// Timekeeping: the tick counter incremented by the timer vector.
mod task;

/// Interrupt plumbing: table construction/activation and the dispatch layer.
mod traps;

/// Kernel utilities: kprint!/kprintln! logging macros, panic handler.
mod util;

#[cfg(all(target_arch = "x86", target_os = "none"))]
use arch::x86::boot::{MULTIBOOT_LOADER_MAGIC, MultibootInfo};
#[cfg(all(target_arch = "x86", target_os = "none"))]
use arch::x86::serial::SERIAL;
#[cfg(all(target_arch = "x86", target_os = "none"))]
use drivers::vga::{self, Color, ColorCode};

// =============================================================================
// Kernel Entry Point
// =============================================================================

/// The kernel's main entry point.
///
/// Called from the `_start` assembly stub with the two values the multiboot
/// loader handed off: the validation magic (EAX) and a pointer to the boot
/// information block (EBX).
///
/// # Execution Environment
/// When we enter this function:
///   - CPU is in 32-bit protected mode, flat provisional segments
///   - Interrupts are DISABLED (no IDT exists yet)
///   - A 16 KiB stack is set up (ours, from `_start`)
///   - Paging is off; physical == linear
///
/// # Never Returns
/// Initializes the kernel subsystems and enters the shell loop. `_start`
/// still guards the return path with a masked halt loop — a kernel must
/// never fall off the end.
#[cfg(all(target_arch = "x86", target_os = "none"))]
#[unsafe(no_mangle)]
pub extern "C" fn kmain(magic: u32, info: *const MultibootInfo) -> ! {
    // =========================================================================
    // PHASE 1: "Deaf and Blind" → get output working
    // =========================================================================

    // Serial first: it needs no memory setup at all and survives anything
    // short of a triple fault, so every later step can report progress.
    {
        let serial = SERIAL.lock();
        serial.init();
    }
    util::logger::init();

    // Attach the console to the VGA text buffer and clear the screen.
    vga::init(ColorCode::new(Color::LightGreen, Color::Black));

    kprintln!("========================================");
    kprintln!("   EmberOS kernel v0.1.0");
    kprintln!("========================================");
    kprintln!();

    // --- Boot hand-off values ---
    // The loader put its magic in EAX; anything else means we were started
    // by something that did not follow the multiboot contract and the info
    // pointer cannot be trusted.
    if magic == MULTIBOOT_LOADER_MAGIC {
        log::info!("multiboot hand-off ok (magic {:#010X})", magic);
        if let Some(info) = unsafe { info.as_ref() } {
            if let Some((lower, upper)) = info.memory_bounds() {
                log::info!("conventional memory: {} KiB low, {} KiB high", lower, upper);
            }
        }
    } else {
        log::warn!("unexpected loader magic {:#010X}, ignoring boot info", magic);
    }

    // =========================================================================
    // PHASE 2: "Own the CPU" → descriptor tables
    // =========================================================================
    //
    // Order matters and is enforced here, nowhere else:
    //   1. GDT built, then activated (lgdt + segment reload + far transfer)
    //   2. IDT fully populated (all 256 gates), then activated (lidt)
    // The IDT load must precede any possibility of IF being set.
    // =========================================================================

    log::info!("installing flat segment table");
    traps::init_gdt();

    log::info!("installing interrupt table");
    traps::init_idt();

    kprintln!();
    kprintln!("Kernel features:");
    kprintln!("  - VGA text mode display with scrolling");
    kprintln!("  - Flat GDT (code/data, ring 0)");
    kprintln!("  - IDT with trampoline dispatch (256 gates)");
    kprintln!("  - Polled PS/2 keyboard input");
    kprintln!("  - Interactive shell");
    kprintln!();
    log::info!("kernel initialized");

    // =========================================================================
    // PHASE 3: "Interactive" → hand the CPU to the shell, forever
    // =========================================================================

    shell::run()
}

// Host builds exist solely to run the unit tests; the binary does nothing.
#[cfg(not(target_os = "none"))]
fn main() {}
