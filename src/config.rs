//! Configuration management for the braille tutor

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Tutor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the offline recognizer model
    pub model_path: PathBuf,

    /// Listening behaviour
    pub listen: ListenConfig,

    /// Presentation timing
    pub display: DisplayConfig,

    /// Microphone selection
    pub audio: AudioConfig,

    /// Servo hardware
    pub servo: ServoConfig,

    /// Spoken feedback
    pub speech: SpeechConfig,
}

/// Listening behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    /// Seconds to wait for a phrase before starting a fresh attempt
    pub timeout_secs: f64,

    /// Finalized results below this average word confidence are ignored
    pub min_confidence: f32,

    /// Samples per audio frame fed to the recognizer
    pub frame_samples: usize,
}

/// Presentation timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Seconds a pattern stays raised
    pub hold_secs: f64,
}

/// Microphone selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Input device index or name fragment (system default when unset)
    pub device: Option<String>,

    /// Capture rate in Hz (device default when unset)
    pub sample_rate: Option<u32>,

    /// RMS level the meter reports as sound
    pub level_threshold: f64,
}

/// Servo hardware
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServoConfig {
    /// sysfs PWM chip directory
    pub pwm_chip: PathBuf,

    /// PWM channel driving each dot, in dot order
    pub channels: [u32; 6],

    /// Servo angle for a raised dot, degrees
    pub raised_angle: f64,

    /// Servo angle for a lowered dot, degrees
    pub lowered_angle: f64,

    /// PWM period
    pub period_ns: u64,

    /// Pulse width at -90 degrees
    pub min_pulse_ns: u64,

    /// Pulse width at +90 degrees
    pub max_pulse_ns: u64,
}

/// Spoken feedback
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechConfig {
    /// Speak feedback aloud
    pub enabled: bool,

    /// Synthesizer program, looked up on `PATH`
    pub program: String,

    /// Speaking rate
    pub words_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/vosk-model-small-en-us-0.15"),
            listen: ListenConfig::default(),
            display: DisplayConfig::default(),
            audio: AudioConfig::default(),
            servo: ServoConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10.0,
            min_confidence: 0.5,
            frame_samples: 2048,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { hold_secs: 3.0 }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: None,
            level_threshold: 500.0,
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            channels: [0, 1, 2, 3, 4, 5],
            raised_angle: 90.0,
            lowered_angle: -90.0,
            period_ns: 20_000_000,
            min_pulse_ns: 1_000_000,
            max_pulse_ns: 2_000_000,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak-ng".to_string(),
            words_per_minute: 150,
        }
    }
}

/// Default config file location
///
/// `~/.config/braille-tutor/config.toml` on Linux
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "braille-tutor", "braille-tutor")
        .map(|d| d.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise. The result is not
    /// validated, since command-line flags may still override it; call
    /// [`Config::validate`] once every layer is applied.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or an environment
    /// override is malformed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with environment lookups going through `lookup`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or an override
    /// is malformed
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("no config file, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Parse a TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid config TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse config TOML
    ///
    /// # Errors
    ///
    /// Returns error on malformed TOML or unknown keys
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `BRAILLE_TUTOR_*` overrides through `lookup`
    ///
    /// # Errors
    ///
    /// Returns error if a numeric override does not parse
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("BRAILLE_TUTOR_MODEL") {
            self.model_path = PathBuf::from(model);
        }
        if let Some(device) = lookup("BRAILLE_TUTOR_DEVICE") {
            self.audio.device = Some(device);
        }
        if let Some(hold) = lookup("BRAILLE_TUTOR_HOLD_SECS") {
            self.display.hold_secs = parse_secs("BRAILLE_TUTOR_HOLD_SECS", &hold)?;
        }
        if let Some(timeout) = lookup("BRAILLE_TUTOR_TIMEOUT_SECS") {
            self.listen.timeout_secs = parse_secs("BRAILLE_TUTOR_TIMEOUT_SECS", &timeout)?;
        }
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if !is_valid_duration(self.listen.timeout_secs) {
            return Err(Error::Config(format!(
                "listen.timeout_secs must be positive and at most {MAX_DURATION_SECS}"
            )));
        }
        if !is_valid_duration(self.display.hold_secs) {
            return Err(Error::Config(format!(
                "display.hold_secs must be positive and at most {MAX_DURATION_SECS}"
            )));
        }
        if !(0.0..=1.0).contains(&self.listen.min_confidence) {
            return Err(Error::Config(
                "listen.min_confidence must be within 0.0..=1.0".into(),
            ));
        }
        if self.listen.frame_samples == 0 {
            return Err(Error::Config("listen.frame_samples must be non-zero".into()));
        }
        if self.audio.sample_rate == Some(0) {
            return Err(Error::Config("audio.sample_rate must be non-zero".into()));
        }

        let channels = &self.servo.channels;
        for (i, channel) in channels.iter().enumerate() {
            if channels[i + 1..].contains(channel) {
                return Err(Error::Config(format!(
                    "servo channel {channel} assigned to more than one dot"
                )));
            }
        }
        if self.servo.min_pulse_ns >= self.servo.max_pulse_ns
            || self.servo.max_pulse_ns > self.servo.period_ns
        {
            return Err(Error::Config(
                "servo pulses must satisfy min < max <= period".into(),
            ));
        }
        for angle in [self.servo.raised_angle, self.servo.lowered_angle] {
            if !(-90.0..=90.0).contains(&angle) {
                return Err(Error::Config(format!(
                    "servo angle {angle} outside -90..=90"
                )));
            }
        }

        Ok(())
    }

    /// Maximum wait for one phrase
    #[must_use]
    pub fn listen_timeout(&self) -> Duration {
        secs(self.listen.timeout_secs)
    }

    /// How long a pattern stays raised
    #[must_use]
    pub fn hold_duration(&self) -> Duration {
        secs(self.display.hold_secs)
    }
}

/// Upper bound for the hold and listen durations, in seconds
pub const MAX_DURATION_SECS: f64 = 3600.0;

/// Shortest duration a validated setting converts to
const MIN_DURATION: Duration = Duration::from_millis(1);

fn is_valid_duration(value: f64) -> bool {
    value > 0.0 && value <= MAX_DURATION_SECS
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_DURATION_SECS))
        .map_or(MIN_DURATION, |d| d.max(MIN_DURATION))
}

fn parse_secs(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}={raw} is not a number of seconds")))
}
