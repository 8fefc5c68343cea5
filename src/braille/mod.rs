//! Braille cells: letter table and text rendering

mod pattern;
mod render;

pub use pattern::{BraillePattern, DOT_COUNT, pattern_for};
pub use render::{LOWERED, RAISED, describe_dots, format_binary, render_grid};
