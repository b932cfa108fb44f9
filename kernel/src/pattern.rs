/// Startup pattern: fill the screen with green stars, one cell at a time.
use emberos_platform::{wait, Attribute, Color, DisplayWriter, GlyphSink};

pub const PATTERN_GLYPH: u8 = b'*';
pub const PATTERN_ATTR: Attribute = Attribute::on_black(Color::LightGreen);

/// Loop turns between two cells. Cosmetic only.
pub const CELL_DELAY: u32 = 1_000_000;

/// Draw the pattern over every cell, pausing `delay` turns after each.
/// The cursor is left where it was.
pub fn draw_pattern<S: GlyphSink>(display: &mut DisplayWriter<S>, delay: u32) {
    for cell in 0..display.cell_count() {
        display.draw_at(cell, PATTERN_GLYPH, PATTERN_ATTR);
        wait::busy_delay(delay);
    }
}
