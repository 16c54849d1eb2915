// =============================================================================
// EmberOS — VGA Text-Mode Console
// =============================================================================
//
// The classic 80x25 text console at physical 0xB8000. Each cell is a u16:
// low byte the code-page-437 character, high byte the attribute
// (bg nibble << 4 | fg nibble).
//
// CURSOR DISCIPLINE:
//   The console tracks a logical cursor plus a `pending_wrap` flag. Writing
//   the last column of a row leaves the cursor on that row with the wrap
//   pending; the move to the next row happens only when another character
//   actually needs the space. A newline arriving while a wrap is pending
//   consumes it — the wrap and the newline collapse into a single row
//   advance, so a line that exactly fills the width does not leave a blank
//   row behind it.
//
// SCROLL DISCIPLINE:
//   Advancing past the bottom row never moves the cursor off the grid.
//   Instead every row is copied one row up, the bottom row is cleared to
//   blanks in the current color, and the cursor stays on the bottom row.
//   The top line is gone for good; there is no scrollback.
//
// All buffer traffic uses volatile accesses — this is device memory and
// the compiler must not elide or reorder the stores.
// =============================================================================

use crate::sync::spinlock::SpinLock;
use core::fmt;
use core::ptr;

/// Columns in the text buffer.
pub const BUFFER_WIDTH: usize = 80;

/// Rows in the text buffer.
pub const BUFFER_HEIGHT: usize = 25;

/// Physical address of the VGA text buffer.
#[cfg(all(target_arch = "x86", target_os = "none"))]
const VGA_TEXT_BASE: usize = 0xB8000;

/// The 16 standard VGA colors. The raw value is the hardware attribute
/// nibble.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

impl Color {
    /// All 16 colors in attribute order, for palette displays.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Brown,
        Color::LightGray,
        Color::DarkGray,
        Color::LightBlue,
        Color::LightGreen,
        Color::LightCyan,
        Color::LightRed,
        Color::Pink,
        Color::Yellow,
        Color::White,
    ];

    /// Display name matching the enum variant.
    pub fn name(&self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Cyan => "Cyan",
            Color::Red => "Red",
            Color::Magenta => "Magenta",
            Color::Brown => "Brown",
            Color::LightGray => "LightGray",
            Color::DarkGray => "DarkGray",
            Color::LightBlue => "LightBlue",
            Color::LightGreen => "LightGreen",
            Color::LightCyan => "LightCyan",
            Color::LightRed => "LightRed",
            Color::Pink => "Pink",
            Color::Yellow => "Yellow",
            Color::White => "White",
        }
    }
}

/// A full attribute byte: background in the high nibble, foreground low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(u8);

impl ColorCode {
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self((background as u8) << 4 | foreground as u8)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }
}

/// One character cell as the hardware sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct VgaCell(u16);

impl VgaCell {
    pub const fn new(character: u8, color: ColorCode) -> Self {
        Self((color.bits() as u16) << 8 | character as u16)
    }

    pub const fn character(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn color_bits(&self) -> u8 {
        (self.0 >> 8) as u8
    }
}

/// The raw 80x25 grid of cells, matching the hardware layout exactly.
#[repr(C)]
pub struct TextBuffer {
    cells: [[VgaCell; BUFFER_WIDTH]; BUFFER_HEIGHT],
}

impl TextBuffer {
    /// A buffer of blanks. Only meaningful on the host, where tests own
    /// their buffer instead of mapping device memory.
    #[cfg(not(all(target_arch = "x86", target_os = "none")))]
    pub const fn blank() -> Self {
        Self {
            cells: [[VgaCell::new(b' ', ColorCode::new(Color::LightGray, Color::Black));
                BUFFER_WIDTH]; BUFFER_HEIGHT],
        }
    }
}

/// A writer over a [`TextBuffer`] implementing the cursor and scroll
/// discipline described in the module header.
pub struct Console {
    row: usize,
    col: usize,
    pending_wrap: bool,
    color: ColorCode,
    buffer: &'static mut TextBuffer,
}

impl Console {
    /// Attaches a console to a text buffer and clears it.
    ///
    /// # Safety
    /// `buffer` must point to a valid, exclusively owned `TextBuffer` that
    /// lives for the rest of the program — the real VGA window or a leaked
    /// host allocation.
    pub unsafe fn attach(buffer: *mut TextBuffer, color: ColorCode) -> Self {
        let mut console = Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            color,
            // SAFETY: caller guarantees validity, exclusivity, and 'static.
            buffer: unsafe { &mut *buffer },
        };
        console.clear();
        console
    }

    /// Blanks the whole grid and homes the cursor.
    pub fn clear(&mut self) {
        let blank = VgaCell::new(b' ', self.color);
        for row in 0..BUFFER_HEIGHT {
            for col in 0..BUFFER_WIDTH {
                self.write_cell(row, col, blank);
            }
        }
        self.row = 0;
        self.col = 0;
        self.pending_wrap = false;
    }

    /// Sets the attribute used for subsequent output.
    pub fn set_color(&mut self, color: ColorCode) {
        self.color = color;
    }

    /// Current attribute.
    pub fn color(&self) -> ColorCode {
        self.color
    }

    /// Writes one byte, handling newline, wrap, and scroll.
    pub fn put_byte(&mut self, byte: u8) {
        if byte == b'\n' {
            // A pending wrap collapses into the newline: one row advance,
            // not two.
            self.col = 0;
            if !self.pending_wrap {
                self.advance_row();
            }
            self.pending_wrap = false;
            return;
        }

        if self.pending_wrap {
            self.col = 0;
            self.pending_wrap = false;
            self.advance_row();
        }

        self.write_cell(self.row, self.col, VgaCell::new(byte, self.color));
        if self.col + 1 == BUFFER_WIDTH {
            self.pending_wrap = true;
        } else {
            self.col += 1;
        }
    }

    /// Erases the character before the cursor, if any. Used by the shell's
    /// line editor; does not cross row boundaries.
    pub fn backspace(&mut self) {
        if self.pending_wrap {
            // Cursor is logically past the last column; erase that column.
            self.pending_wrap = false;
            self.col = BUFFER_WIDTH - 1;
            self.write_cell(self.row, self.col, VgaCell::new(b' ', self.color));
        } else if self.col > 0 {
            self.col -= 1;
            self.write_cell(self.row, self.col, VgaCell::new(b' ', self.color));
        }
    }

    /// Writes a string byte by byte. Non-ASCII input is the caller's
    /// problem; bytes land in the buffer as code page 437.
    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            self.put_byte(byte);
        }
    }

    /// Cursor position `(row, col)` as the next character would land.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Reads back one cell (volatile; test and diagnostic use).
    pub fn cell(&self, row: usize, col: usize) -> VgaCell {
        // SAFETY: row/col are bounds-checked by the array indexing in the
        // reference we take; the buffer reference is valid by construction.
        unsafe { ptr::read_volatile(&self.buffer.cells[row][col]) }
    }

    /// Moves to the next row, scrolling if the cursor is on the bottom one.
    fn advance_row(&mut self) {
        if self.row + 1 == BUFFER_HEIGHT {
            self.scroll_up();
        } else {
            self.row += 1;
        }
    }

    /// Copies every row one row up and blanks the bottom row. The cursor
    /// row is untouched (callers keep it on the bottom row).
    fn scroll_up(&mut self) {
        for row in 1..BUFFER_HEIGHT {
            for col in 0..BUFFER_WIDTH {
                let cell = self.cell(row, col);
                self.write_cell(row - 1, col, cell);
            }
        }
        let blank = VgaCell::new(b' ', self.color);
        for col in 0..BUFFER_WIDTH {
            self.write_cell(BUFFER_HEIGHT - 1, col, blank);
        }
    }

    fn write_cell(&mut self, row: usize, col: usize, cell: VgaCell) {
        // SAFETY: indices are in bounds (callers stay within the grid);
        // volatile because this may be device memory.
        unsafe {
            ptr::write_volatile(&mut self.buffer.cells[row][col], cell);
        }
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

/// The global console. `None` until [`init`] attaches it to the hardware
/// buffer; output helpers skip the console quietly before that point so
/// early logging still reaches serial.
pub static CONSOLE: SpinLock<Option<Console>> = SpinLock::new(None);

/// Attaches the global console to the VGA window and clears the screen.
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn init(color: ColorCode) {
    // SAFETY: 0xB8000 is the VGA text window, identity-mapped (paging is
    // off) and owned solely by this console for the kernel's lifetime.
    let console = unsafe { Console::attach(VGA_TEXT_BASE as *mut TextBuffer, color) };
    *CONSOLE.lock() = Some(console);
}

/// Runs `f` against the global console if it has been initialized.
pub fn with_console<R>(f: impl FnOnce(&mut Console) -> R) -> Option<R> {
    CONSOLE.lock().as_mut().map(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_console() -> Console {
        let buffer: &'static mut TextBuffer = Box::leak(Box::new(TextBuffer::blank()));
        // SAFETY: leaked box is valid, exclusive, and 'static.
        unsafe { Console::attach(buffer, ColorCode::new(Color::LightGray, Color::Black)) }
    }

    fn row_string(console: &Console, row: usize) -> String {
        (0..BUFFER_WIDTH)
            .map(|col| console.cell(row, col).character() as char)
            .collect()
    }

    #[test]
    fn color_code_packs_nibbles() {
        let code = ColorCode::new(Color::Yellow, Color::Blue);
        assert_eq!(code.bits(), 0x1E);
    }

    #[test]
    fn cell_packs_attribute_and_character() {
        let cell = VgaCell::new(b'A', ColorCode::new(Color::White, Color::Black));
        assert_eq!(cell.character(), b'A');
        assert_eq!(cell.color_bits(), 0x0F);
    }

    #[test]
    fn plain_text_lands_at_the_cursor() {
        let mut console = test_console();
        console.write_string("hi\n");
        console.put_byte(b'x');

        assert_eq!(console.cell(0, 0).character(), b'h');
        assert_eq!(console.cell(0, 1).character(), b'i');
        assert_eq!(console.cell(1, 0).character(), b'x');
        assert_eq!(console.cursor(), (1, 1));
    }

    #[test]
    fn full_width_line_wraps_on_the_next_character() {
        let mut console = test_console();
        for _ in 0..BUFFER_WIDTH {
            console.put_byte(b'a');
        }
        // The 80th character fills row 0 but the cursor has not moved on.
        assert_eq!(console.cursor(), (0, BUFFER_WIDTH - 1));

        console.put_byte(b'b');
        assert_eq!(console.cell(1, 0).character(), b'b');
        assert_eq!(console.cursor(), (1, 1));
    }

    #[test]
    fn newline_after_full_width_line_advances_once() {
        let mut console = test_console();
        for _ in 0..BUFFER_WIDTH {
            console.put_byte(b'a');
        }
        console.put_byte(b'\n');
        console.put_byte(b'b');

        // The wrap and the newline collapse: 'b' is on row 1, not row 2.
        assert_eq!(console.cell(1, 0).character(), b'b');
        assert_eq!(console.cursor(), (1, 1));
    }

    #[test]
    fn writing_past_the_bottom_scrolls_content_up() {
        let mut console = test_console();
        // One full-width line per row, H+1 lines total, labeled by letter.
        for i in 0..=BUFFER_HEIGHT {
            let label = b'A' + i as u8;
            for _ in 0..BUFFER_WIDTH {
                console.put_byte(label);
            }
        }

        // Line 'A' scrolled off; lines 'B'.. fill the grid top to bottom.
        for row in 0..BUFFER_HEIGHT {
            let expected = b'B' + row as u8;
            assert_eq!(
                console.cell(row, 0).character(),
                expected,
                "row {row} should hold the line labeled {}",
                expected as char
            );
            assert_eq!(console.cell(row, BUFFER_WIDTH - 1).character(), expected);
        }
        // Cursor stays on the bottom row, wrap pending after the last cell.
        assert_eq!(console.cursor().0, BUFFER_HEIGHT - 1);
    }

    #[test]
    fn one_character_past_a_full_grid_scrolls_exactly_once() {
        let mut console = test_console();
        let total = BUFFER_HEIGHT * BUFFER_WIDTH;
        // Cycle through printable characters so cells are distinguishable.
        let glyph = |i: usize| b'!' + (i % 90) as u8;
        for i in 0..total {
            console.put_byte(glyph(i));
        }
        // Grid exactly full, no scroll yet: the first character is still
        // in the top-left corner.
        assert_eq!(console.cell(0, 0).character(), glyph(0));

        console.put_byte(glyph(total));
        // One scroll: the old second row is now on top, the extra
        // character opens the bottom row, and everything in between is
        // the original content shifted up by one row.
        assert_eq!(console.cell(0, 0).character(), glyph(BUFFER_WIDTH));
        assert_eq!(console.cell(BUFFER_HEIGHT - 1, 0).character(), glyph(total));
        assert_eq!(console.cell(BUFFER_HEIGHT - 1, 1).character(), b' ');
        assert_eq!(
            console.cell(BUFFER_HEIGHT - 2, BUFFER_WIDTH - 1).character(),
            glyph(total - 1)
        );
        assert_eq!(console.cursor(), (BUFFER_HEIGHT - 1, 1));
    }

    #[test]
    fn newline_scroll_blanks_the_bottom_row() {
        let mut console = test_console();
        for _ in 0..BUFFER_HEIGHT {
            console.write_string("line\n");
        }
        // The cursor is now on the bottom row after exactly one scroll.
        assert_eq!(console.cursor(), (BUFFER_HEIGHT - 1, 0));
        assert_eq!(row_string(&console, BUFFER_HEIGHT - 1), " ".repeat(BUFFER_WIDTH));
        assert_eq!(&row_string(&console, BUFFER_HEIGHT - 2)[..4], "line");
        // Row 0 still holds a "line" — only one row has scrolled off.
        assert_eq!(&row_string(&console, 0)[..4], "line");
    }

    #[test]
    fn clear_blanks_everything_and_homes_the_cursor() {
        let mut console = test_console();
        console.write_string("some text\nmore\n");
        console.clear();

        assert_eq!(console.cursor(), (0, 0));
        for row in 0..BUFFER_HEIGHT {
            assert_eq!(row_string(&console, row), " ".repeat(BUFFER_WIDTH));
        }
    }

    #[test]
    fn backspace_erases_and_steps_back() {
        let mut console = test_console();
        console.write_string("ab");
        console.backspace();

        assert_eq!(console.cursor(), (0, 1));
        assert_eq!(console.cell(0, 1).character(), b' ');
        assert_eq!(console.cell(0, 0).character(), b'a');

        // At column 0 backspace is a no-op.
        console.backspace();
        console.backspace();
        assert_eq!(console.cursor(), (0, 0));
    }

    #[test]
    fn set_color_applies_to_subsequent_output_only() {
        let mut console = test_console();
        console.put_byte(b'a');
        console.set_color(ColorCode::new(Color::Red, Color::Black));
        console.put_byte(b'b');

        assert_eq!(console.cell(0, 0).color_bits(), 0x07);
        assert_eq!(console.cell(0, 1).color_bits(), 0x04);
    }
}
