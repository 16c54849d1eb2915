// =============================================================================
// EmberOS — Kernel Output and Logging
// =============================================================================
//
// All text output funnels through `_kprint`, which mirrors everything to
// both sinks: the serial port (survives display bugs, captured by QEMU)
// and the VGA console (visible on the machine). Before `vga::init` runs,
// the console half is silently skipped, so the earliest boot messages
// still reach serial.
//
// The `log` crate's macros (log::info! and friends) are the structured
// path — they add a level prefix and go through the same sinks. kprint!
// is for raw console text such as the banner and shell output.
// =============================================================================

use crate::arch::x86::serial::SERIAL;
use crate::drivers::vga;
use core::fmt::{self, Write};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes formatted output to serial and (if attached) the VGA console.
/// Implementation detail of the `kprint!`/`kprintln!` macros.
#[doc(hidden)]
pub fn _kprint(args: fmt::Arguments) {
    // fmt::Write on both sinks cannot fail, so swallow the Results.
    let _ = SERIAL.lock().write_fmt(args);
    vga::with_console(|console| {
        let _ = console.write_fmt(args);
    });
}

/// Prints to serial and the VGA console.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::util::logger::_kprint(core::format_args!($($arg)*))
    };
}

/// Prints to serial and the VGA console, with a trailing newline.
#[macro_export]
macro_rules! kprintln {
    () => { $crate::kprint!("\n") };
    ($($arg:tt)*) => {
        $crate::util::logger::_kprint(core::format_args!("{}\n", core::format_args!($($arg)*)))
    };
}

/// Backend for the `log` facade: prefix with the level, then go through
/// the normal output path.
struct KernelLog;

static LOGGER: KernelLog = KernelLog;

impl Log for KernelLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            _kprint(format_args!("[{}] {}\n", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Registers the kernel logger. Called once during boot; a second call is
/// harmless (the facade rejects it and we ignore the error).
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}
