//! Spoken feedback through a local speech synthesizer

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::config::SpeechConfig;
use crate::vocab::Letter;
use crate::{Error, Result};

/// Synthesizers tried when the configured one is missing
const FALLBACK_PROGRAMS: &[&str] = &["espeak-ng", "espeak"];

/// Spoken prompts
pub mod prompts {
    pub const NOT_UNDERSTOOD: &str = "I didn't understand, please try again";
    pub const GOODBYE: &str = "Goodbye!";
    pub const WELCOME: &str = "Please say a letter from A to Z";
}

/// Announcement for a recognized letter
#[must_use]
pub fn letter_prompt(letter: Letter) -> String {
    format!("Letter {}", letter.as_char().to_ascii_uppercase())
}

/// Spoken feedback sink
///
/// Calls return once speech has started; they never wait for it to finish.
pub trait Speech: Send {
    /// Speak arbitrary text
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer cannot be started
    fn say(&mut self, text: &str) -> Result<()>;

    /// Announce a recognized letter
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer cannot be started
    fn speak_letter(&mut self, letter: Letter) -> Result<()> {
        self.say(&letter_prompt(letter))
    }

    /// Ask the learner to repeat themselves
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer cannot be started
    fn speak_not_understood(&mut self) -> Result<()> {
        self.say(prompts::NOT_UNDERSTOOD)
    }

    /// Say goodbye before exiting
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer cannot be started
    fn speak_goodbye(&mut self) -> Result<()> {
        self.say(prompts::GOODBYE)
    }

    /// Let in-flight speech finish and release resources
    fn shutdown(&mut self) {}
}

/// Feedback that is only logged
#[derive(Debug, Default)]
pub struct SilentSpeech;

impl Speech for SilentSpeech {
    fn say(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "speech disabled");
        Ok(())
    }
}

/// eSpeak command-line synthesizer
///
/// Each utterance is a child process; finished children are reaped on the
/// next call and the rest are waited for on shutdown.
#[derive(Debug)]
pub struct EspeakSpeech {
    program: PathBuf,
    words_per_minute: u32,
    children: Vec<Child>,
}

impl EspeakSpeech {
    /// Use a specific synthesizer binary
    #[must_use]
    pub const fn new(program: PathBuf, words_per_minute: u32) -> Self {
        Self {
            program,
            words_per_minute,
            children: Vec::new(),
        }
    }

    /// Locate the configured synthesizer, then the known fallbacks, on `PATH`
    #[must_use]
    pub fn detect(config: &SpeechConfig) -> Option<Self> {
        std::iter::once(config.program.as_str())
            .chain(FALLBACK_PROGRAMS.iter().copied())
            .find_map(|program| which::which(program).ok())
            .map(|program| {
                tracing::debug!(program = %program.display(), "speech synthesizer found");
                Self::new(program, config.words_per_minute)
            })
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::warn!(%status, "speech synthesizer exited with failure");
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll speech synthesizer");
                false
            }
        });
    }
}

impl Speech for EspeakSpeech {
    fn say(&mut self, text: &str) -> Result<()> {
        self.reap();

        let child = Command::new(&self.program)
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Tts(format!("{}: {e}", self.program.display())))?;

        tracing::debug!(text, pid = child.id(), "speaking");
        self.children.push(child);
        Ok(())
    }

    fn shutdown(&mut self) {
        for mut child in self.children.drain(..) {
            if let Err(e) = child.wait() {
                tracing::warn!(error = %e, "failed to wait for speech synthesizer");
            }
        }
    }
}

impl Drop for EspeakSpeech {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Build the feedback sink described by `config`
///
/// Falls back to [`SilentSpeech`] with a warning when no synthesizer is
/// installed.
#[must_use]
pub fn speech_from_config(config: &SpeechConfig) -> Box<dyn Speech> {
    if !config.enabled {
        tracing::info!("spoken feedback disabled");
        return Box::new(SilentSpeech);
    }
    match EspeakSpeech::detect(config) {
        Some(speech) => Box::new(speech),
        None => {
            tracing::warn!(
                program = %config.program,
                "no speech synthesizer found, continuing without spoken feedback"
            );
            Box::new(SilentSpeech)
        }
    }
}
