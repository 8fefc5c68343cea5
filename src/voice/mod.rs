//! Voice processing module
//!
//! Handles audio capture, offline recognition, input levels and spoken
//! feedback.

mod capture;
mod devices;
mod level;
mod recognizer;
mod session;
mod source;
mod tts;
#[cfg(feature = "vosk")]
mod vosk;

pub use capture::MicrophoneSource;
pub use devices::{DeviceSelector, InputDeviceInfo, list_input_devices, select_input_device};
pub use level::{METER_WIDTH, meter_line, rms};
pub use recognizer::{Recognizer, Utterance, check_model, load_recognizer};
pub use session::{Hypothesis, NoResultReason, RecognitionResult, RecognitionSession};
pub(crate) use session::deadline_after;
pub use source::{AudioSource, DEFAULT_FRAME_SAMPLES, Frame, WavSource};
pub use tts::{
    EspeakSpeech, SilentSpeech, Speech, letter_prompt, prompts, speech_from_config,
};
#[cfg(feature = "vosk")]
pub use vosk::VoskRecognizer;
