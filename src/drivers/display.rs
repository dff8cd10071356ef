//! Character Display
//!
//! The panel shows its menus on a 20x4 character LCD. The core talks to
//! it through [`CharDisplay`]; two custom glyphs carry the scroll arrows.

use crate::config::{DISPLAY_COLUMNS, DISPLAY_ROWS};
use crate::error::Result;

/// Glyph slot holding the up arrow
pub const GLYPH_UP: u8 = 0;

/// Glyph slot holding the down arrow
pub const GLYPH_DOWN: u8 = 1;

/// 5x8 up arrow
pub const UP_ARROW: [u8; 8] = [
    0b00100, 0b01110, 0b10101, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000,
];

/// 5x8 down arrow
pub const DOWN_ARROW: [u8; 8] = [
    0b00000, 0b00100, 0b00100, 0b00100, 0b00100, 0b10101, 0b01110, 0b00100,
];

/// Character display contract
pub trait CharDisplay {
    /// Blank the screen and home the cursor
    fn clear(&mut self) -> Result<()>;

    /// Move the write position
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()>;

    /// Write text at the current position
    fn write_str(&mut self, text: &str) -> Result<()>;

    /// Write one raw character code (custom glyphs live at 0..8)
    fn write_glyph(&mut self, code: u8) -> Result<()>;

    /// Load a custom 5x8 glyph into `slot`
    fn define_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<()>;
}

/// Load the scroll arrows
pub fn load_glyphs<D: CharDisplay>(display: &mut D) -> Result<()> {
    display.define_glyph(GLYPH_UP, &UP_ARROW)?;
    display.define_glyph(GLYPH_DOWN, &DOWN_ARROW)
}

/// Clear and show up to four lines, truncated to the display width
pub fn show_lines<D: CharDisplay>(display: &mut D, lines: &[&str]) -> Result<()> {
    display.clear()?;
    for (row, line) in (0u8..).zip(lines.iter().take(DISPLAY_ROWS)) {
        display.set_cursor(row, 0)?;
        display.write_str(truncate(line, DISPLAY_COLUMNS))?;
    }
    Ok(())
}

/// Longest prefix of `text` that fits `width` columns
#[must_use]
pub fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("Unable to connect...", 20), "Unable to connect...");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
