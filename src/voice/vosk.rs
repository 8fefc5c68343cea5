//! Vosk (Kaldi) recognizer backend

use std::path::Path;

use vosk::{CompleteResult, DecodingState, Model};

use super::recognizer::{Recognizer, Utterance};
use crate::vocab::Grammar;
use crate::{Error, Result};

/// Vosk marker for speech outside the grammar
const UNKNOWN_WORD: &str = "[unk]";

/// Offline recognizer backed by a Vosk model directory
pub struct VoskRecognizer {
    inner: vosk::Recognizer,
    // Kept alive for the recognizer's lifetime
    _model: Model,
}

impl VoskRecognizer {
    /// Load a model and build a recognizer
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the model or recognizer
    /// cannot be created
    pub fn new(model_path: &Path, sample_rate: u32, grammar: Option<&Grammar>) -> Result<Self> {
        let model_dir = model_path.to_string_lossy().into_owned();
        let mut model = Model::new(model_dir).ok_or_else(|| {
            Error::BackendUnavailable(format!(
                "failed to load model from {}",
                model_path.display()
            ))
        })?;

        #[allow(clippy::cast_precision_loss)]
        let rate = sample_rate as f32;

        let inner = match grammar {
            Some(grammar) => {
                let mut phrases: Vec<&str> = grammar.phrases().collect();
                for phrase in &phrases {
                    for word in phrase.split(' ') {
                        if model.find_word(word).is_none() {
                            tracing::warn!(word, phrase, "grammar word missing from model");
                        }
                    }
                }
                phrases.push(UNKNOWN_WORD);
                vosk::Recognizer::new_with_grammar(&model, rate, &phrases)
            }
            None => vosk::Recognizer::new(&model, rate),
        };

        let mut inner = inner.ok_or_else(|| {
            Error::BackendUnavailable("failed to create recognizer".to_string())
        })?;
        inner.set_words(true);
        inner.set_partial_words(false);

        tracing::info!(
            model = %model_path.display(),
            sample_rate,
            constrained = grammar.is_some(),
            "speech recognizer loaded"
        );

        Ok(Self {
            inner,
            _model: model,
        })
    }
}

fn utterance(result: CompleteResult<'_>) -> Utterance {
    let Some(single) = result.single() else {
        return Utterance::default();
    };

    let confidence = if single.result.is_empty() {
        None
    } else {
        let total: f32 = single.result.iter().map(|w| w.conf).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = total / single.result.len() as f32;
        Some(mean)
    };

    Utterance::new(single.text, confidence)
}

impl Recognizer for VoskRecognizer {
    fn accept(&mut self, frame: &[i16]) -> Result<bool> {
        match self.inner.accept_waveform(frame) {
            DecodingState::Finalized => Ok(true),
            DecodingState::Running => Ok(false),
            DecodingState::Failed => Err(Error::Audio("recognizer failed to decode audio".to_string())),
        }
    }

    fn current_result(&mut self) -> Utterance {
        utterance(self.inner.result())
    }

    fn partial_result(&mut self) -> String {
        self.inner.partial_result().partial.to_string()
    }

    fn finish(&mut self) -> Utterance {
        utterance(self.inner.final_result())
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}
