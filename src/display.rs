use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use heapless::Vec;

use crate::font::{self, GLYPH_HEIGHT};

/// Left padding that centers `HH:MM:SS` (27 px) on a 32 px wide matrix.
pub const LEFT_MARGIN: i32 = 2;
/// Gap after every glyph, colons included.
pub const GLYPH_SPACING: i32 = 1;
/// Number of glyph positions recorded by [`draw_time_string`].
pub const MAX_GLYPHS: usize = 16;

pub type GlyphEdges = Vec<i32, MAX_GLYPHS>;

/// Draws `ch` with its top-left corner at `(x, y)` and returns its advance width.
///
/// Characters outside the font draw nothing and advance by 0.
pub fn draw_char<D>(target: &mut D, x: i32, y: i32, ch: char) -> Result<u32, D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let glyph = font::glyph(ch);
    let origin = Point::new(x, y);

    let pixels = (0..GLYPH_HEIGHT).flat_map(move |row| {
        (0..glyph.width)
            .filter(move |&col| glyph.is_lit(col, row))
            .map(move |col| Pixel(origin + Point::new(i32::from(col), row as i32), BinaryColor::On))
    });
    target.draw_iter(pixels)?;

    Ok(u32::from(glyph.width))
}

/// Lays `text` out left to right from [`LEFT_MARGIN`], one pixel between glyphs.
///
/// Returns the left edge of every glyph drawn. Unsupported characters are
/// skipped without moving the cursor. Nothing wraps; glyphs past the right
/// edge are clipped by the target.
pub fn draw_time_string<D>(target: &mut D, text: &str, y_offset: i32) -> Result<GlyphEdges, D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let mut cursor = LEFT_MARGIN;
    let mut edges = GlyphEdges::new();

    for ch in text.chars().filter(|&ch| font::is_supported(ch)) {
        let width = draw_char(target, cursor, y_offset, ch)?;
        // positions past MAX_GLYPHS are drawn but not recorded
        if !edges.is_full() {
            edges.push(cursor).ok();
        }
        cursor += width as i32 + GLYPH_SPACING;
    }

    Ok(edges)
}
