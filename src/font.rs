/// Rows per glyph. Every glyph in the table is exactly this tall.
pub const GLYPH_HEIGHT: usize = 7;

/// A fixed-height bitmap glyph. Each row is a bitmask over `width` columns,
/// most significant bit (of the declared width) first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub width: u8,
    pub rows: [u8; GLYPH_HEIGHT],
}

impl Glyph {
    /// Zero-width glyph returned for characters outside the font.
    pub const BLANK: Glyph = Glyph {
        width: 0,
        rows: [0; GLYPH_HEIGHT],
    };

    const fn digit(rows: [u8; GLYPH_HEIGHT]) -> Self {
        Self { width: 3, rows }
    }

    /// Whether the pixel at `(col, row)` is lit. Out-of-range coordinates are unlit.
    pub fn is_lit(&self, col: u8, row: usize) -> bool {
        if col >= self.width || row >= GLYPH_HEIGHT {
            return false;
        }
        let bit = self.width - 1 - col;
        self.rows[row] & (1 << bit) != 0
    }
}

/// 3x7 digits, indexed by digit value.
pub const DIGITS: [Glyph; 10] = [
    Glyph::digit([0b111, 0b101, 0b101, 0b101, 0b101, 0b101, 0b111]),
    Glyph::digit([0b010, 0b110, 0b010, 0b010, 0b010, 0b010, 0b111]),
    Glyph::digit([0b111, 0b001, 0b001, 0b111, 0b100, 0b100, 0b111]),
    Glyph::digit([0b111, 0b001, 0b001, 0b111, 0b001, 0b001, 0b111]),
    Glyph::digit([0b101, 0b101, 0b101, 0b111, 0b001, 0b001, 0b001]),
    Glyph::digit([0b111, 0b100, 0b100, 0b111, 0b001, 0b001, 0b111]),
    Glyph::digit([0b111, 0b100, 0b100, 0b111, 0b101, 0b101, 0b111]),
    Glyph::digit([0b111, 0b001, 0b001, 0b001, 0b001, 0b001, 0b001]),
    Glyph::digit([0b111, 0b101, 0b101, 0b111, 0b101, 0b101, 0b111]),
    Glyph::digit([0b111, 0b101, 0b101, 0b111, 0b001, 0b001, 0b111]),
];

/// 1x7 separator with dots on rows 2 and 4.
pub const COLON: Glyph = Glyph {
    width: 1,
    rows: [0, 0, 1, 0, 1, 0, 0],
};

/// Looks up the glyph for `ch`. Unsupported characters map to [`Glyph::BLANK`].
pub fn glyph(ch: char) -> &'static Glyph {
    match ch {
        '0'..='9' => &DIGITS[ch as usize - '0' as usize],
        ':' => &COLON,
        _ => &Glyph::BLANK,
    }
}

/// Whether `ch` has a glyph of its own.
pub fn is_supported(ch: char) -> bool {
    ch.is_ascii_digit() || ch == ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_three_wide_colon_is_one() {
        for ch in '0'..='9' {
            assert_eq!(glyph(ch).width, 3, "digit {ch}");
        }
        assert_eq!(glyph(':').width, 1);
    }

    #[test]
    fn rows_fit_declared_width() {
        for ch in "0123456789:".chars() {
            let g = glyph(ch);
            for row in g.rows {
                assert_eq!(row >> g.width, 0, "glyph {ch:?} row {row:#b} overflows");
            }
        }
    }

    #[test]
    fn unsupported_characters_are_blank() {
        for ch in [' ', 'a', 'Z', '-', '.'] {
            assert!(!is_supported(ch));
            assert_eq!(*glyph(ch), Glyph::BLANK);
        }
    }

    #[test]
    fn bit_order_is_msb_first() {
        // '4' starts with 0b101: left and right columns lit, middle dark
        let four = glyph('4');
        assert!(four.is_lit(0, 0));
        assert!(!four.is_lit(1, 0));
        assert!(four.is_lit(2, 0));
        // '1' top row 0b010
        assert!(glyph('1').is_lit(1, 0));
        assert!(!glyph('1').is_lit(0, 0));
    }
}
