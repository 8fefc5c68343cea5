//! Braille output devices
//!
//! A display raises and lowers the six dots of a single cell. Calls return
//! without waiting for the mechanism to settle.

mod servo;
mod sim;

pub use servo::{ServoDisplay, pulse_width_ns};
pub use sim::SimulatedDisplay;

use crate::Result;
use crate::braille::BraillePattern;

/// A single-cell braille output
pub trait BrailleDisplay: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Raise exactly the dots set in `pattern` and lower the rest
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be driven
    fn set_pattern(&mut self, pattern: BraillePattern) -> Result<()>;

    /// Lower every dot
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be driven
    fn reset(&mut self) -> Result<()>;

    /// Release the device, leaving every dot lowered
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be driven
    fn shutdown(&mut self) -> Result<()> {
        self.reset()
    }
}
