//! Text renderings of a braille cell

use std::fmt::Write;

use super::pattern::BraillePattern;

/// Glyph for a raised dot
pub const RAISED: char = 'O';
/// Glyph for a lowered dot
pub const LOWERED: char = '.';

const fn glyph(raised: bool) -> char {
    if raised { RAISED } else { LOWERED }
}

/// Three-row grid, left column is dots 1-3, right column is dots 4-6
///
/// ```
/// use braille_tutor::braille::{BraillePattern, render_grid};
/// let a = BraillePattern::from_raised(&[1]);
/// assert_eq!(render_grid(a), "O .\n. .\n. .");
/// ```
#[must_use]
pub fn render_grid(pattern: BraillePattern) -> String {
    let dots = pattern.dots();
    let mut out = String::with_capacity(11);
    for row in 0..3 {
        if row > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{} {}", glyph(dots[row]), glyph(dots[row + 3]));
    }
    out
}

/// Dot states as a six-character `1`/`0` string in dot order
#[must_use]
pub fn format_binary(pattern: BraillePattern) -> String {
    pattern
        .dots()
        .iter()
        .map(|&raised| if raised { '1' } else { '0' })
        .collect()
}

/// Raised dot numbers joined by commas, or `none`
#[must_use]
pub fn describe_dots(pattern: BraillePattern) -> String {
    let raised = pattern.raised_dots();
    if raised.is_empty() {
        return "none".to_string();
    }
    raised
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::braille::pattern_for;
    use crate::vocab::Letter;

    #[test]
    fn test_grid_layout() {
        let y = pattern_for(Letter::new('y').unwrap());
        assert_eq!(render_grid(y), "O O\n. O\nO O");
        assert_eq!(render_grid(BraillePattern::BLANK), ". .\n. .\n. .");
    }

    #[test]
    fn test_every_cell_uses_only_two_glyphs() {
        let mut seen = std::collections::BTreeSet::new();

        for bits in 0u8..64 {
            let dots = std::array::from_fn(|i| bits & (1 << i) != 0);
            let pattern = BraillePattern::new(dots);
            let grid = render_grid(pattern);

            assert_eq!(grid, render_grid(pattern));
            assert_eq!(grid.lines().count(), 3);
            for line in grid.lines() {
                let glyphs: Vec<char> = line.split(' ').flat_map(str::chars).collect();
                assert_eq!(glyphs.len(), 2, "{line:?}");
                assert!(glyphs.iter().all(|&g| g == RAISED || g == LOWERED), "{line:?}");
                seen.extend(glyphs);
            }
        }

        assert_eq!(seen, std::collections::BTreeSet::from([LOWERED, RAISED]));
    }

    #[test]
    fn test_binary() {
        let c = pattern_for(Letter::new('c').unwrap());
        assert_eq!(format_binary(c), "100100");
    }

    #[test]
    fn test_describe() {
        let d = pattern_for(Letter::new('d').unwrap());
        assert_eq!(describe_dots(d), "1, 4, 5");
        assert_eq!(describe_dots(BraillePattern::BLANK), "none");
    }
}
