//! Offline speech recognizer interface and backend loading

use std::path::Path;

use crate::vocab::Grammar;
use crate::{Error, Result};

/// A recognizer's best hypothesis for one utterance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Utterance {
    /// Recognized text, possibly empty
    pub text: String,
    /// Average word confidence in `0.0..=1.0`, when the backend reports one
    pub confidence: Option<f32>,
}

impl Utterance {
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Streaming recognizer fed one frame at a time
///
/// Implementations are created for a fixed sample rate and, optionally, a
/// closed grammar. Frames must be mono signed 16-bit PCM at that rate.
pub trait Recognizer: Send {
    /// Feed a frame; returns `true` once an utterance is finalized
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails to decode
    fn accept(&mut self, frame: &[i16]) -> Result<bool>;

    /// The finalized utterance after [`Recognizer::accept`] returned `true`
    fn current_result(&mut self) -> Utterance;

    /// In-progress hypothesis for the current utterance
    fn partial_result(&mut self) -> String;

    /// Flush buffered audio and return whatever it decodes to
    fn finish(&mut self) -> Utterance;

    /// Discard all state so the next frame starts a new utterance
    fn reset(&mut self);
}

/// Check that a recognizer model directory exists
///
/// # Errors
///
/// Returns [`Error::ModelNotFound`] if `path` is not a directory
pub fn check_model(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::ModelNotFound(path.to_path_buf()))
    }
}

/// Load the compiled-in recognizer backend
///
/// With a grammar the recognizer only emits grammar phrases; without one it
/// transcribes freely.
///
/// # Errors
///
/// Returns [`Error::ModelNotFound`] if the model directory is missing and
/// [`Error::BackendUnavailable`] if no backend is compiled in or the model
/// fails to load
pub fn load_recognizer(
    model_path: &Path,
    sample_rate: u32,
    grammar: Option<&Grammar>,
) -> Result<Box<dyn Recognizer>> {
    check_model(model_path)?;
    backend(model_path, sample_rate, grammar)
}

#[cfg(feature = "vosk")]
fn backend(
    model_path: &Path,
    sample_rate: u32,
    grammar: Option<&Grammar>,
) -> Result<Box<dyn Recognizer>> {
    let recognizer = super::vosk::VoskRecognizer::new(model_path, sample_rate, grammar)?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "vosk"))]
fn backend(
    model_path: &Path,
    _sample_rate: u32,
    _grammar: Option<&Grammar>,
) -> Result<Box<dyn Recognizer>> {
    tracing::debug!(model = %model_path.display(), "no recognizer backend compiled in");
    Err(Error::BackendUnavailable(
        "built without the `vosk` feature".to_string(),
    ))
}
