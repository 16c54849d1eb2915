// =============================================================================
// EmberOS — Serial UART Driver (COM1)
// =============================================================================
//
// The most reliable output device on x86: no memory setup, no interrupts
// (we poll the status register), works before anything else is initialized.
// QEMU's `-serial stdio` shows this output in the terminal, so every boot
// message survives even a display-driver bug.
//
// HARDWARE DETAILS:
//   The 16550 UART at I/O port base 0x3F8 (COM1):
//
//   Port    │ Read              │ Write
//   ────────┼───────────────────┼──────────────────
//   +0      │ Receive Buffer    │ Transmit Holding
//   +1      │ Interrupt Enable  │ Interrupt Enable
//   +2      │ Interrupt ID      │ FIFO Control
//   +3      │ Line Control      │ Line Control
//   +4      │ Modem Control     │ Modem Control
//   +5      │ Line Status       │ (factory test)
//
//   With DLAB (bit 7 of Line Control) set, ports +0/+1 become the baud
//   divisor latch. We configure 115200 baud, 8 data bits, no parity,
//   1 stop bit — the configuration QEMU and serial tools expect.
// =============================================================================

use crate::arch::x86::cpu;
use crate::sync::spinlock::SpinLock;
use core::fmt;

/// Base I/O port for COM1. Standardized on all x86 PCs.
const COM1_BASE: u16 = 0x3F8;

/// Register offsets from the base port (16550 layout).
const DATA_REG: u16 = 0; // +0: TX/RX data (divisor low when DLAB=1)
const INT_ENABLE_REG: u16 = 1; // +1: interrupt enable (divisor high when DLAB=1)
const FIFO_CTRL_REG: u16 = 2; // +2: FIFO control
const LINE_CTRL_REG: u16 = 3; // +3: line control (data bits, parity, DLAB)
const MODEM_CTRL_REG: u16 = 4; // +4: modem control (DTR, RTS, loopback)
const LINE_STATUS_REG: u16 = 5; // +5: line status (TX empty, RX ready)

/// Line Status Register bits.
const LSR_TX_EMPTY: u8 = 1 << 5; // Transmit Holding Register empty
const LSR_RX_READY: u8 = 1 << 0; // Data ready

/// The global serial port, protected by the interrupt-safe spinlock so a
/// future handler that logs cannot interleave with the main context.
pub static SERIAL: SpinLock<SerialPort> = SpinLock::new(SerialPort::new(COM1_BASE));

/// A polled 16550 UART.
pub struct SerialPort {
    base: u16,
}

impl SerialPort {
    /// Creates a port handle. Touches no hardware — call `init()` first.
    pub const fn new(base: u16) -> Self {
        Self { base }
    }

    /// Configures the UART: 115200 baud, 8N1, FIFOs on.
    ///
    /// Must be called once during boot before any output.
    pub fn init(&self) {
        // Disable UART interrupts — this driver polls.
        self.write_reg(INT_ENABLE_REG, 0x00);

        // DLAB on, divisor 1 (115200 baud), DLAB off with 8N1 format.
        self.write_reg(LINE_CTRL_REG, 0x80);
        self.write_reg(DATA_REG, 0x01);
        self.write_reg(INT_ENABLE_REG, 0x00);
        self.write_reg(LINE_CTRL_REG, 0x03);

        // Enable and clear FIFOs, 14-byte trigger level.
        self.write_reg(FIFO_CTRL_REG, 0xC7);

        // DTR + RTS + OUT2.
        self.write_reg(MODEM_CTRL_REG, 0x0B);
    }

    /// Sends one byte, busy-waiting for transmit-buffer space.
    pub fn write_byte(&self, byte: u8) {
        while self.read_reg(LINE_STATUS_REG) & LSR_TX_EMPTY == 0 {
            core::hint::spin_loop();
        }
        self.write_reg(DATA_REG, byte);
    }

    /// Reads one byte if available. Non-blocking.
    pub fn read_byte(&self) -> Option<u8> {
        if self.read_reg(LINE_STATUS_REG) & LSR_RX_READY != 0 {
            Some(self.read_reg(DATA_REG))
        } else {
            None
        }
    }

    /// Sends a string, translating `\n` to `\r\n` — serial terminals need
    /// the carriage return to avoid the staircase effect.
    pub fn write_string(&self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }

    #[inline]
    fn read_reg(&self, offset: u16) -> u8 {
        cpu::inb(self.base + offset)
    }

    #[inline]
    fn write_reg(&self, offset: u16, value: u8) {
        cpu::outb(self.base + offset, value)
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}
