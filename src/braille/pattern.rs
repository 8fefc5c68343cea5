//! Six-dot braille cells and the standard letter table

use crate::vocab::Letter;

/// Dots in one braille cell
pub const DOT_COUNT: usize = 6;

/// Raised/lowered state of the six dots of a cell
///
/// Index 0 is dot 1. Dots 1-3 run down the left column and dots 4-6 down
/// the right column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BraillePattern([bool; DOT_COUNT]);

impl BraillePattern {
    /// All dots lowered
    pub const BLANK: Self = Self([false; DOT_COUNT]);

    #[must_use]
    pub const fn new(dots: [bool; DOT_COUNT]) -> Self {
        Self(dots)
    }

    /// Build a pattern from 1-based raised dot numbers
    ///
    /// Numbers outside `1..=6` are ignored.
    #[must_use]
    pub fn from_raised(raised: &[u8]) -> Self {
        let mut dots = [false; DOT_COUNT];
        for &n in raised {
            if (1..=6).contains(&n) {
                dots[usize::from(n - 1)] = true;
            }
        }
        Self(dots)
    }

    #[must_use]
    pub const fn dots(self) -> [bool; DOT_COUNT] {
        self.0
    }

    /// Whether 1-based dot `n` is raised
    #[must_use]
    pub fn is_raised(self, n: usize) -> bool {
        n.checked_sub(1)
            .and_then(|i| self.0.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// 1-based numbers of raised dots, ascending
    #[must_use]
    pub fn raised_dots(self) -> Vec<u8> {
        (1u8..=6).filter(|&n| self.0[usize::from(n - 1)]).collect()
    }

    #[must_use]
    pub fn is_blank(self) -> bool {
        self.0.iter().all(|raised| !raised)
    }
}

/// Standard English braille, grade 1, raised dots per letter
const LETTER_DOTS: [&[u8]; 26] = [
    &[1],             // a
    &[1, 2],          // b
    &[1, 4],          // c
    &[1, 4, 5],       // d
    &[1, 5],          // e
    &[1, 2, 4],       // f
    &[1, 2, 4, 5],    // g
    &[1, 2, 5],       // h
    &[2, 4],          // i
    &[2, 4, 5],       // j
    &[1, 3],          // k
    &[1, 2, 3],       // l
    &[1, 3, 4],       // m
    &[1, 3, 4, 5],    // n
    &[1, 3, 5],       // o
    &[1, 2, 3, 4],    // p
    &[1, 2, 3, 4, 5], // q
    &[1, 2, 3, 5],    // r
    &[2, 3, 4],       // s
    &[2, 3, 4, 5],    // t
    &[1, 3, 6],       // u
    &[1, 2, 3, 6],    // v
    &[2, 4, 5, 6],    // w
    &[1, 3, 4, 6],    // x
    &[1, 3, 4, 5, 6], // y
    &[1, 3, 5, 6],    // z
];

/// Braille cell for a letter
#[must_use]
pub fn pattern_for(letter: Letter) -> BraillePattern {
    BraillePattern::from_raised(LETTER_DOTS[letter.index()])
}
