// =============================================================================
// EmberOS — Interactive Shell
// =============================================================================
//
// A single-threaded read-eval-print loop over the polled keyboard and the
// VGA console. Pure consumer: no hardware access of its own, everything
// goes through the drivers.
//
// Line editing is deliberately minimal — printable ASCII, backspace within
// the current line, enter submits. A command is one word plus an optional
// argument tail separated by the first space.
// =============================================================================

use crate::arch::x86::cpu;
use crate::drivers::keyboard;
use crate::drivers::vga::{self, Color, ColorCode};
use crate::task::clock;
use crate::{kprint, kprintln};

/// Maximum command line length.
const LINE_CAPACITY: usize = 256;

/// Runs the shell forever.
pub fn run() -> ! {
    set_color(Color::LightGreen);
    kprintln!();
    kprintln!("Welcome to the EmberOS shell!");
    kprintln!("Type 'help' for available commands.");
    kprintln!();

    let mut line = [0u8; LINE_CAPACITY];
    loop {
        set_color(Color::LightBlue);
        kprint!("shell> ");
        set_color(Color::White);

        let len = read_line(&mut line);
        let Ok(input) = core::str::from_utf8(&line[..len]) else {
            // Unreachable with the current keymap (pure ASCII), but never
            // feed a bad buffer to the parser.
            continue;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, args) = match input.split_once(' ') {
            Some((command, args)) => (command, args.trim_start()),
            None => (input, ""),
        };

        match command {
            "help" => cmd_help(),
            "clear" => cmd_clear(),
            "echo" => kprintln!("{}", args),
            "uptime" => cmd_uptime(),
            "sysinfo" => cmd_sysinfo(),
            "colors" => cmd_colors(),
            "banner" => cmd_banner(),
            "halt" => cmd_halt(),
            _ => {
                kprintln!("Unknown command: '{}'", command);
                kprintln!("Type 'help' for available commands.");
            }
        }
    }
}

/// Reads one line into `buffer`, echoing as the user types. Returns the
/// number of bytes stored (the newline is not stored).
fn read_line(buffer: &mut [u8; LINE_CAPACITY]) -> usize {
    let mut len = 0;
    loop {
        let byte = keyboard::read_char();
        match byte {
            b'\n' => {
                kprintln!();
                return len;
            }
            0x08 => {
                if len > 0 {
                    len -= 1;
                    vga::with_console(|console| console.backspace());
                }
            }
            0x20..=0x7E if len < buffer.len() => {
                buffer[len] = byte;
                len += 1;
                kprint!("{}", byte as char);
            }
            _ => {}
        }
    }
}

fn set_color(foreground: Color) {
    vga::with_console(|console| {
        console.set_color(ColorCode::new(foreground, Color::Black));
    });
}

fn cmd_help() {
    set_color(Color::Yellow);
    kprintln!("Available commands:");
    set_color(Color::White);
    kprintln!("  help      - Show this help message");
    kprintln!("  clear     - Clear the screen");
    kprintln!("  echo      - Echo text back");
    kprintln!("  uptime    - Show system uptime");
    kprintln!("  sysinfo   - Show system information");
    kprintln!("  colors    - Display all VGA colors");
    kprintln!("  banner    - Show kernel banner");
    kprintln!("  halt      - Halt the system");
}

fn cmd_clear() {
    vga::with_console(|console| console.clear());
}

fn cmd_uptime() {
    let ticks = clock::now();
    kprintln!(
        "System uptime: {} seconds ({} ticks)",
        ticks / clock::TICKS_PER_SECOND,
        ticks
    );
}

fn cmd_sysinfo() {
    set_color(Color::LightCyan);
    kprintln!("System Information:");
    set_color(Color::White);
    kprintln!("  Kernel: EmberOS v{}", env!("CARGO_PKG_VERSION"));
    kprintln!("  Architecture: x86 (32-bit protected mode)");
    kprintln!("  Display: VGA text mode (80x25)");
    kprintln!("  Timer ticks: {}", clock::now());
}

fn cmd_colors() {
    kprintln!("VGA color palette:");
    for color in Color::ALL {
        set_color(if color == Color::Black { Color::DarkGray } else { color });
        kprint!("{:10} ", color.name());
    }
    kprintln!();
    set_color(Color::White);
}

fn cmd_banner() {
    vga::with_console(|console| console.clear());
    set_color(Color::LightCyan);
    kprintln!("========================================");
    set_color(Color::Yellow);
    kprintln!("   EmberOS kernel v{}", env!("CARGO_PKG_VERSION"));
    set_color(Color::LightCyan);
    kprintln!("========================================");
    set_color(Color::White);
    kprintln!();
}

fn cmd_halt() -> ! {
    set_color(Color::LightRed);
    kprintln!();
    kprintln!("Halting.");
    kprintln!("System stopped. You can close the window now.");
    cpu::halt_forever()
}
