// =============================================================================
// EmberOS — Polled PS/2 Keyboard
// =============================================================================
//
// The simplest possible keyboard driver: spin on the controller status
// port until a byte is ready, read the scancode, translate set-1 make
// codes to ASCII, discard everything else. No interrupts, no modifier
// state, no shift — good enough for a boot shell.
// =============================================================================

use crate::arch::x86::cpu;

/// PS/2 controller status port.
const STATUS_PORT: u16 = 0x64;

/// PS/2 controller data port.
const DATA_PORT: u16 = 0x60;

/// Status bit 0: output buffer full, a scancode is waiting.
const OUTPUT_FULL: u8 = 1 << 0;

/// Bit 7 of a scancode marks a key release (break code).
const RELEASE_BIT: u8 = 0x80;

/// Scancode set 1 make codes → ASCII, unshifted US layout. Zero entries
/// are keys with no character meaning here (Esc, modifiers, F-keys).
#[rustfmt::skip]
const SCANCODE_MAP: [u8; 58] = [
    0, 0, b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'-', b'=', 0x08,
    b'\t', b'q', b'w', b'e', b'r', b't', b'y', b'u', b'i', b'o', b'p', b'[', b']', b'\n',
    0, b'a', b's', b'd', b'f', b'g', b'h', b'j', b'k', b'l', b';', b'\'', b'`',
    0, b'\\', b'z', b'x', b'c', b'v', b'b', b'n', b'm', b',', b'.', b'/', 0,
    b'*', 0, b' ',
];

/// Translates a set-1 make code to ASCII, if it has a character meaning.
pub fn scancode_to_ascii(scancode: u8) -> Option<u8> {
    match SCANCODE_MAP.get(scancode as usize) {
        Some(&ascii) if ascii != 0 => Some(ascii),
        _ => None,
    }
}

/// Blocks until a translatable key press arrives and returns its ASCII
/// byte. Releases and unmapped keys are swallowed.
pub fn read_char() -> u8 {
    loop {
        if cpu::inb(STATUS_PORT) & OUTPUT_FULL == 0 {
            core::hint::spin_loop();
            continue;
        }
        let scancode = cpu::inb(DATA_PORT);
        if scancode & RELEASE_BIT != 0 {
            continue;
        }
        if let Some(ascii) = scancode_to_ascii(scancode) {
            return ascii;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_and_digit_rows_translate() {
        assert_eq!(scancode_to_ascii(0x02), Some(b'1'));
        assert_eq!(scancode_to_ascii(0x0B), Some(b'0'));
        assert_eq!(scancode_to_ascii(0x10), Some(b'q'));
        assert_eq!(scancode_to_ascii(0x1E), Some(b'a'));
        assert_eq!(scancode_to_ascii(0x2C), Some(b'z'));
        assert_eq!(scancode_to_ascii(0x39), Some(b' '));
    }

    #[test]
    fn control_keys_translate_to_control_bytes() {
        assert_eq!(scancode_to_ascii(0x0E), Some(0x08)); // backspace
        assert_eq!(scancode_to_ascii(0x0F), Some(b'\t'));
        assert_eq!(scancode_to_ascii(0x1C), Some(b'\n')); // enter
    }

    #[test]
    fn non_character_keys_are_none() {
        assert_eq!(scancode_to_ascii(0x00), None);
        assert_eq!(scancode_to_ascii(0x01), None); // Esc
        assert_eq!(scancode_to_ascii(0x1D), None); // left Ctrl
        assert_eq!(scancode_to_ascii(0x2A), None); // left Shift
        assert_eq!(scancode_to_ascii(0x38), None); // left Alt
    }

    #[test]
    fn out_of_range_scancodes_are_none() {
        assert_eq!(scancode_to_ascii(58), None);
        assert_eq!(scancode_to_ascii(0x7F), None);
        assert_eq!(scancode_to_ascii(0xFF), None);
    }
}
