//! Servo-driven braille cell over the Linux sysfs PWM interface
//!
//! Each dot is a hobby servo on its own PWM channel. A dot is raised by
//! rotating to the raised angle and lowered by rotating to the lowered
//! angle; pulse width varies linearly from `min_pulse_ns` at -90 degrees
//! to `max_pulse_ns` at +90 degrees.

use std::path::{Path, PathBuf};

use super::BrailleDisplay;
use crate::braille::{BraillePattern, DOT_COUNT};
use crate::config::ServoConfig;
use crate::{Error, Result};

/// Pulse width for a servo angle in degrees, clamped to -90..=90
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn pulse_width_ns(angle: f64, min_pulse_ns: u64, max_pulse_ns: u64) -> u64 {
    let angle = if angle.is_nan() { 0.0 } else { angle.clamp(-90.0, 90.0) };
    let span = max_pulse_ns.saturating_sub(min_pulse_ns) as f64;
    min_pulse_ns + ((angle + 90.0) / 180.0 * span).round() as u64
}

/// One exported PWM channel
#[derive(Debug)]
struct PwmChannel {
    number: u32,
    dir: PathBuf,
}

impl PwmChannel {
    fn export(chip: &Path, number: u32) -> Result<Self> {
        let dir = chip.join(format!("pwm{number}"));
        if !dir.is_dir() {
            write_attr(&chip.join("export"), u64::from(number))?;
        }
        if !dir.is_dir() {
            return Err(Error::Device(format!(
                "PWM channel {number} unavailable on {}",
                chip.display()
            )));
        }
        Ok(Self { number, dir })
    }

    fn configure(&self, period_ns: u64, duty_ns: u64) -> Result<()> {
        // Duty must never exceed the period, including the old one
        write_attr(&self.dir.join("duty_cycle"), 0)?;
        write_attr(&self.dir.join("period"), period_ns)?;
        self.set_duty(duty_ns)?;
        write_attr(&self.dir.join("enable"), 1)
    }

    fn set_duty(&self, duty_ns: u64) -> Result<()> {
        write_attr(&self.dir.join("duty_cycle"), duty_ns)
    }

    fn disable(&self) -> Result<()> {
        write_attr(&self.dir.join("enable"), 0)
    }
}

fn write_attr(path: &Path, value: u64) -> Result<()> {
    std::fs::write(path, value.to_string())
        .map_err(|e| Error::Device(format!("{}: {e}", path.display())))
}

/// Six servos on one PWM chip
#[derive(Debug)]
pub struct ServoDisplay {
    chip: PathBuf,
    channels: Vec<PwmChannel>,
    raised_ns: u64,
    lowered_ns: u64,
    released: bool,
}

impl ServoDisplay {
    /// Export and enable every channel with all dots lowered
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the chip or a channel is missing or
    /// cannot be written
    pub fn open(config: &ServoConfig) -> Result<Self> {
        let chip = config.pwm_chip.clone();
        if !chip.is_dir() {
            return Err(Error::Device(format!(
                "PWM chip {} not found",
                chip.display()
            )));
        }

        let raised_ns = pulse_width_ns(
            config.raised_angle,
            config.min_pulse_ns,
            config.max_pulse_ns,
        );
        let lowered_ns = pulse_width_ns(
            config.lowered_angle,
            config.min_pulse_ns,
            config.max_pulse_ns,
        );

        let mut channels = Vec::with_capacity(DOT_COUNT);
        for &number in &config.channels {
            let channel = PwmChannel::export(&chip, number)?;
            channel.configure(config.period_ns, lowered_ns)?;
            channels.push(channel);
        }

        tracing::info!(
            chip = %chip.display(),
            channels = ?config.channels,
            raised_ns,
            lowered_ns,
            "servo display ready"
        );

        Ok(Self {
            chip,
            channels,
            raised_ns,
            lowered_ns,
            released: false,
        })
    }

    fn drive(&self, dots: [bool; DOT_COUNT]) -> Result<()> {
        for (channel, raised) in self.channels.iter().zip(dots) {
            let duty = if raised { self.raised_ns } else { self.lowered_ns };
            channel.set_duty(duty)?;
        }
        Ok(())
    }
}

impl BrailleDisplay for ServoDisplay {
    fn name(&self) -> &'static str {
        "servo"
    }

    fn set_pattern(&mut self, pattern: BraillePattern) -> Result<()> {
        tracing::debug!(dots = ?pattern.raised_dots(), "raising pattern");
        self.drive(pattern.dots())
    }

    fn reset(&mut self) -> Result<()> {
        tracing::debug!("lowering all dots");
        self.drive([false; DOT_COUNT])
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.reset()?;
        for channel in &self.channels {
            channel.disable()?;
            write_attr(&self.chip.join("unexport"), u64::from(channel.number))?;
        }
        self.released = true;
        tracing::debug!(chip = %self.chip.display(), "servo display released");
        Ok(())
    }
}
