//! Console stand-in for the servo cell

use std::io::{self, Write};

use super::BrailleDisplay;
use crate::Result;
use crate::braille::{BraillePattern, render_grid};

/// Prints patterns as a text grid instead of moving servos
pub struct SimulatedDisplay {
    out: Box<dyn Write + Send>,
}

impl SimulatedDisplay {
    /// Print to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

impl Default for SimulatedDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl BrailleDisplay for SimulatedDisplay {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn set_pattern(&mut self, pattern: BraillePattern) -> Result<()> {
        writeln!(self.out, "\n[DISPLAY] Braille pattern set:")?;
        writeln!(self.out, "{}", render_grid(pattern))?;
        self.out.flush()?;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        writeln!(self.out, "\n[DISPLAY] Reset (all dots lowered)")?;
        self.out.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
