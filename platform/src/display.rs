/// Text display: the glyph-drawing collaborator and the cursor-owning writer.
///
/// The display hardware is an 80x25 grid of cells, each a 16-bit
/// (attribute << 8 | character) word. Everything above the hardware only
/// needs one primitive, "draw glyph G with attribute A at cell N", which
/// is the `GlyphSink` trait. `DisplayWriter` owns the cursor: it starts
/// at the first cell, advances on every write and goes back to the first
/// cell only on `clear`.
use core::fmt;

use crate::layout::DISPLAY_BASE;
use crate::region::HardwareRegion;

pub const COLUMNS: usize = 80;
pub const ROWS: usize = 25;
pub const CELLS: usize = COLUMNS * ROWS;

/// The 16 text-mode colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0x0,
    Blue = 0x1,
    Green = 0x2,
    Cyan = 0x3,
    Red = 0x4,
    Magenta = 0x5,
    Brown = 0x6,
    LightGray = 0x7,
    DarkGray = 0x8,
    LightBlue = 0x9,
    LightGreen = 0xA,
    LightCyan = 0xB,
    LightRed = 0xC,
    Pink = 0xD,
    Yellow = 0xE,
    White = 0xF,
}

/// A cell attribute byte: background in the high nibble, foreground low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Attribute(u8);

impl Attribute {
    /// Light gray on black, used for blank cells and plain progress text.
    pub const NORMAL: Self = Self::on_black(Color::LightGray);
    /// Failure reports.
    pub const ERROR: Self = Self::on_black(Color::Red);
    /// Successful milestones.
    pub const SUCCESS: Self = Self::on_black(Color::Green);

    pub const fn new(foreground: Color, background: Color) -> Self {
        Self(((background as u8) << 4) | (foreground as u8 & 0x0F))
    }

    pub const fn on_black(foreground: Color) -> Self {
        Self::new(foreground, Color::Black)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Anything that can draw a glyph into a numbered cell.
pub trait GlyphSink {
    /// Number of addressable cells.
    fn cell_count(&self) -> usize;

    /// Draw `glyph` with `attr` at `cell`. Cells past `cell_count` are
    /// never passed in.
    fn draw(&mut self, cell: usize, glyph: u8, attr: Attribute);
}

/// The color text buffer, reached through a hardware region.
pub struct TextBuffer<'a> {
    cells: HardwareRegion<'a, u16>,
}

impl TextBuffer<'static> {
    /// Bind to the display window at its fixed physical address.
    ///
    /// # Safety
    /// Only one `TextBuffer` over the display window may exist at a time.
    pub unsafe fn fixed() -> Self {
        Self {
            cells: unsafe { HardwareRegion::at(DISPLAY_BASE, CELLS) },
        }
    }
}

impl<'a> TextBuffer<'a> {
    /// Use an arbitrary region of cell words as the screen.
    pub fn new(cells: HardwareRegion<'a, u16>) -> Self {
        Self { cells }
    }

    /// The glyph and attribute currently shown at `cell`.
    pub fn glyph_at(&self, cell: usize) -> (u8, Attribute) {
        let word = self.cells.read(cell);
        ((word & 0xFF) as u8, Attribute::from_bits((word >> 8) as u8))
    }

    /// Copy the characters of `row` into `out`.
    pub fn row_text(&self, row: usize, out: &mut [u8; COLUMNS]) {
        for (column, byte) in out.iter_mut().enumerate() {
            *byte = self.glyph_at(row * COLUMNS + column).0;
        }
    }
}

impl GlyphSink for TextBuffer<'_> {
    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn draw(&mut self, cell: usize, glyph: u8, attr: Attribute) {
        self.cells.write(cell, ((attr.bits() as u16) << 8) | glyph as u16);
    }
}

/// Cursor-tracking text output over a `GlyphSink`.
///
/// Output past the last cell is dropped; there is no scrolling.
pub struct DisplayWriter<S: GlyphSink> {
    sink: S,
    cursor: usize,
}

impl<S: GlyphSink> DisplayWriter<S> {
    /// Take ownership of `sink` with the cursor at the first cell.
    pub fn new(sink: S) -> Self {
        Self { sink, cursor: 0 }
    }

    /// Blank every cell and move the cursor home.
    pub fn clear(&mut self) {
        for cell in 0..self.sink.cell_count() {
            self.sink.draw(cell, b' ', Attribute::NORMAL);
        }
        self.cursor = 0;
    }

    /// Write one character at the cursor. `\n` moves to the next row.
    pub fn put_char(&mut self, c: u8, attr: Attribute) {
        if c == b'\n' {
            self.cursor += COLUMNS - self.cursor % COLUMNS;
        } else if self.cursor < self.sink.cell_count() {
            self.sink.draw(self.cursor, c, attr);
            self.cursor += 1;
        }
    }

    pub fn print(&mut self, s: &str, attr: Attribute) {
        for byte in s.bytes() {
            self.put_char(byte, attr);
        }
    }

    /// Write `value` as `0x` and eight uppercase hex digits.
    ///
    /// Unlike `paint`, this pulls no formatting machinery into the binary.
    pub fn print_hex(&mut self, value: u32, attr: Attribute) {
        self.print("0x", attr);
        for shift in (0..8u32).rev() {
            let digit = ((value >> (shift * 4)) & 0xF) as u8;
            let glyph = if digit < 10 { b'0' + digit } else { b'A' + digit - 10 };
            self.put_char(glyph, attr);
        }
    }

    /// Draw at an absolute cell without touching the cursor.
    pub fn draw_at(&mut self, cell: usize, glyph: u8, attr: Attribute) {
        if cell < self.sink.cell_count() {
            self.sink.draw(cell, glyph, attr);
        }
    }

    /// A `fmt::Write` adapter that writes in `attr`.
    pub fn paint(&mut self, attr: Attribute) -> Painter<'_, S> {
        Painter { writer: self, attr }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cell_count(&self) -> usize {
        self.sink.cell_count()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Formatted output in a fixed attribute.
pub struct Painter<'w, S: GlyphSink> {
    writer: &'w mut DisplayWriter<S>,
    attr: Attribute,
}

impl<S: GlyphSink> fmt::Write for Painter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.print(s, self.attr);
        Ok(())
    }
}
