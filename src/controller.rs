//! Tutor session controller
//!
//! Owns the listen, present, hold and reset cycle:
//!
//! ```text
//! Idle -> Listening -> Presenting(letter) -> Holding -> Resetting -> Listening ...
//!             |  \-> Listening (not understood, after feedback)
//!             \----> Stopped (exit phrase, cancellation, end of input)
//! ```
//!
//! Only one pattern is ever raised, and the display is always reset before
//! the next listening attempt starts.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::braille::{BraillePattern, describe_dots, format_binary, pattern_for, render_grid};
use crate::config::Config;
use crate::display::BrailleDisplay;
use crate::vocab::{Intent, IntentResolver, Letter};
use crate::voice::{
    AudioSource, NoResultReason, RecognitionResult, RecognitionSession, Speech, deadline_after,
};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Listening,
    Presenting(Letter),
    Holding,
    Resetting,
    Stopped,
}

/// The pattern currently raised and when it went up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySession {
    pub letter: Letter,
    pub pattern: BraillePattern,
    pub started_at: Instant,
}

/// Listen and hold durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Maximum wait for one phrase
    pub listen_timeout: Duration,
    /// How long a pattern stays raised
    pub hold: Duration,
}

impl Timing {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            listen_timeout: config.listen_timeout(),
            hold: config.hold_duration(),
        }
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub letters_presented: usize,
    pub not_understood: usize,
    pub timeouts: usize,
}

/// Drives one tutoring session from start to shutdown
pub struct Controller {
    session: RecognitionSession,
    source: Box<dyn AudioSource>,
    resolver: IntentResolver,
    display: Box<dyn BrailleDisplay>,
    speech: Box<dyn Speech>,
    timing: Timing,
    console: bool,
    state: ControllerState,
    current: Option<DisplaySession>,
    stats: SessionStats,
    released: bool,
}

impl Controller {
    #[must_use]
    pub fn new(
        session: RecognitionSession,
        source: Box<dyn AudioSource>,
        resolver: IntentResolver,
        display: Box<dyn BrailleDisplay>,
        speech: Box<dyn Speech>,
        timing: Timing,
    ) -> Self {
        Self {
            session,
            source,
            resolver,
            display,
            speech,
            timing,
            console: true,
            state: ControllerState::Idle,
            current: None,
            stats: SessionStats::default(),
            released: false,
        }
    }

    /// Print a summary of each recognized letter to stdout
    #[must_use]
    pub const fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// The raised pattern, if any
    #[must_use]
    pub const fn current(&self) -> Option<&DisplaySession> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Run until an exit phrase, cancellation or end of input
    ///
    /// The display is reset and released on every exit path, including
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns error if the audio source, recognizer or display fails
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<SessionStats> {
        tracing::info!(
            display = self.display.name(),
            hold_ms = self.timing.hold.as_millis(),
            timeout_ms = self.timing.listen_timeout.as_millis(),
            "tutor session started"
        );

        let outcome = self.drive(cancel).await;
        self.state = ControllerState::Stopped;
        self.release();

        let stats = outcome?;
        tracing::info!(
            letters = stats.letters_presented,
            not_understood = stats.not_understood,
            timeouts = stats.timeouts,
            "tutor session ended"
        );
        Ok(stats)
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<SessionStats> {
        loop {
            let next = match self.state {
                ControllerState::Idle => ControllerState::Listening,
                ControllerState::Listening => self.listen(cancel).await?,
                ControllerState::Presenting(letter) => self.present(letter)?,
                ControllerState::Holding => self.hold(cancel).await,
                ControllerState::Resetting => self.lower()?,
                ControllerState::Stopped => return Ok(self.stats),
            };
            tracing::trace!(from = ?self.state, to = ?next, "state transition");
            self.state = next;
        }
    }

    async fn listen(&mut self, cancel: &CancellationToken) -> Result<ControllerState> {
        let result = self
            .session
            .listen(self.source.as_mut(), self.timing.listen_timeout, cancel)
            .await?;

        let text = match result {
            RecognitionResult::Phrase(text) => text,
            RecognitionResult::NoResult(NoResultReason::Timeout) => {
                self.stats.timeouts += 1;
                return Ok(ControllerState::Idle);
            }
            RecognitionResult::NoResult(reason) => {
                tracing::info!(?reason, "listening ended");
                return Ok(ControllerState::Stopped);
            }
        };

        match self.resolver.resolve(&text) {
            Intent::Letter(letter) => {
                tracing::info!(heard = %text, %letter, "letter recognized");
                Ok(ControllerState::Presenting(letter))
            }
            Intent::Exit => {
                tracing::info!(heard = %text, "exit requested");
                if let Err(e) = self.speech.speak_goodbye() {
                    tracing::warn!(error = %e, "failed to speak goodbye");
                }
                Ok(ControllerState::Stopped)
            }
            Intent::Unknown => {
                tracing::info!(heard = %text, "phrase not understood");
                self.stats.not_understood += 1;
                if let Err(e) = self.speech.speak_not_understood() {
                    tracing::warn!(error = %e, "failed to speak feedback");
                }
                Ok(ControllerState::Listening)
            }
        }
    }

    fn present(&mut self, letter: Letter) -> Result<ControllerState> {
        let pattern = pattern_for(letter);

        // Recorded first so a partially raised cell is still lowered on failure
        self.current = Some(DisplaySession {
            letter,
            pattern,
            started_at: Instant::now(),
        });
        self.display.set_pattern(pattern)?;
        self.stats.letters_presented += 1;

        if self.console {
            print_summary(letter, pattern);
        }
        if let Err(e) = self.speech.speak_letter(letter) {
            tracing::warn!(error = %e, "failed to announce letter");
        }

        Ok(ControllerState::Holding)
    }

    async fn hold(&mut self, cancel: &CancellationToken) -> ControllerState {
        let Some(current) = self.current else {
            return ControllerState::Resetting;
        };
        let deadline = deadline_after(current.started_at, self.timing.hold);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(letter = %current.letter, "shutdown requested while holding");
                ControllerState::Stopped
            }
            () = tokio::time::sleep_until(deadline) => ControllerState::Resetting,
        }
    }

    fn lower(&mut self) -> Result<ControllerState> {
        self.display.reset()?;
        self.current = None;
        Ok(ControllerState::Listening)
    }

    /// Lower any raised pattern and release outputs, once
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.current.take().is_some()
            && let Err(e) = self.display.reset()
        {
            tracing::error!(error = %e, "failed to lower pattern during shutdown");
        }
        if let Err(e) = self.display.shutdown() {
            tracing::error!(error = %e, "failed to release display");
        }
        self.speech.shutdown();
    }
}

fn print_summary(letter: Letter, pattern: BraillePattern) {
    println!();
    println!("Letter: {}", letter.as_char().to_ascii_uppercase());
    println!("{}", render_grid(pattern));
    println!(
        "Dots raised: {}  Pattern: {}",
        describe_dots(pattern),
        format_binary(pattern)
    );
}
