//! Error types for the braille tutor

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for tutor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the braille tutor
///
/// Timeouts, cancellations and unrecognized phrases are ordinary outcomes
/// and are not represented here.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The same spoken variant is listed under two canonical entries
    #[error("ambiguous phrase table: \"{variant}\" maps to both '{first}' and '{second}'")]
    AmbiguousVariant {
        /// Offending spoken form
        variant: String,
        /// Canonical value it was first registered under
        first: String,
        /// Canonical value that tried to claim it again
        second: String,
    },

    /// Recognizer model directory is missing
    #[error("recognizer model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Recognizer backend was not compiled in or failed to load
    #[error("recognizer backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Hardware device error (PWM chip, servo channel)
    #[error("device error: {0}")]
    Device(String),

    /// Audio input error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// WAV decoding error
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}

impl Error {
    /// Whether this error is a startup configuration defect
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::AmbiguousVariant { .. }
                | Self::ModelNotFound(_)
                | Self::BackendUnavailable(_)
                | Self::Toml(_)
        )
    }

    /// Whether this error comes from missing or failing hardware
    #[must_use]
    pub const fn is_device(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Audio(_))
    }

    /// Short hint printed next to a fatal error
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ModelNotFound(_) => {
                Some("download a Vosk model and pass its directory with --model")
            }
            Self::BackendUnavailable(_) => Some("rebuild with `--features vosk`"),
            Self::Device(_) => Some("check the servo wiring, or run with --simulate"),
            Self::Audio(_) => Some("check the microphone, or run with --list-devices"),
            Self::AmbiguousVariant { .. } => Some("each spoken variant must map to one entry"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::ModelNotFound(PathBuf::from("m")).is_configuration());
        assert!(
            Error::AmbiguousVariant {
                variant: "see".into(),
                first: "c".into(),
                second: "s".into(),
            }
            .is_configuration()
        );
        assert!(Error::Device("no pwm".into()).is_device());
        assert!(Error::Audio("no mic".into()).is_device());
        assert!(!Error::Tts("espeak".into()).is_device());
        assert!(!Error::Tts("espeak".into()).is_configuration());
    }

    #[test]
    fn test_ambiguous_message_names_both_entries() {
        let err = Error::AmbiguousVariant {
            variant: "see".into(),
            first: "c".into(),
            second: "s".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"see\""));
        assert!(msg.contains("'c'"));
        assert!(msg.contains("'s'"));
    }
}
