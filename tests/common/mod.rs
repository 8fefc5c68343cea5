//! Shared test utilities
//!
//! A scripted audio source and recognizer share one script: each step the
//! source plays decides what the recognizer hears for that frame. Display
//! and speech fakes append to a single event log so ordering across
//! components can be asserted.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use braille_tutor::voice::{AudioSource, Frame, Recognizer, Speech, Utterance};
use braille_tutor::{
    BrailleDisplay, BraillePattern, Controller, Error, IntentResolver, PhraseTable,
    RecognitionSession, Result, Timing,
};

/// Something observable a component did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Close,
    SetPattern(BraillePattern),
    Reset,
    DisplayShutdown,
    Say(String),
    SpeechShutdown,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

#[must_use]
pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[must_use]
pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().expect("event log poisoned").clone()
}

/// What the next frame carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A confidently finalized phrase
    Phrase(&'static str),
    /// A finalized phrase below the confidence gate
    LowConfidence(&'static str),
    /// A frame that updates the in-progress hypothesis
    Partial(&'static str),
    /// No audio arrives for the rest of this attempt
    Silence,
    /// The source is exhausted
    End,
    /// The device fails
    Fail,
}

#[derive(Debug, Default)]
pub struct Script {
    steps: VecDeque<Step>,
    heard: Option<Utterance>,
    partial: String,
    flush: Option<Utterance>,
}

pub type SharedScript = Arc<Mutex<Script>>;

#[must_use]
pub fn script(steps: &[Step]) -> SharedScript {
    Arc::new(Mutex::new(Script {
        steps: steps.iter().copied().collect(),
        ..Script::default()
    }))
}

/// Make `finish` return `text` once the source ends
pub fn set_flush(script: &SharedScript, text: &str) {
    script.lock().expect("script poisoned").flush = Some(Utterance::new(text, Some(0.9)));
}

pub struct ScriptedSource {
    script: SharedScript,
    log: EventLog,
    open: bool,
    stalls_on_open: bool,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(script: SharedScript, log: EventLog) -> Self {
        Self {
            script,
            log,
            open: false,
            stalls_on_open: false,
        }
    }

    /// A source whose `open` starts but never completes, like a hung device
    #[must_use]
    pub fn stalling(script: SharedScript, log: EventLog) -> Self {
        Self {
            stalls_on_open: true,
            ..Self::new(script, log)
        }
    }
}

#[async_trait]
impl AudioSource for ScriptedSource {
    fn sample_rate(&self) -> u32 {
        16_000
    }

    async fn open(&mut self) -> Result<()> {
        assert!(!self.open, "source opened twice");
        self.open = true;
        self.log.lock().expect("event log poisoned").push(Event::Open);
        if self.stalls_on_open {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        assert!(self.open, "frame requested from closed source");
        let step = {
            let mut script = self.script.lock().expect("script poisoned");
            let step = script.steps.pop_front().unwrap_or(Step::Silence);
            match step {
                Step::Phrase(text) => script.heard = Some(Utterance::new(text, Some(0.9))),
                Step::LowConfidence(text) => {
                    script.heard = Some(Utterance::new(text, Some(0.2)));
                }
                Step::Partial(text) => text.clone_into(&mut script.partial),
                Step::Silence | Step::End | Step::Fail => {}
            }
            step
        };

        match step {
            Step::Silence => std::future::pending().await,
            Step::End => None,
            Step::Fail => Some(Err(Error::Audio("device unplugged".to_string()))),
            _ => Some(Ok(vec![0; 160])),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.lock().expect("event log poisoned").push(Event::Close);
        }
    }
}

pub struct ScriptedRecognizer {
    script: SharedScript,
    finalized: Option<Utterance>,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new(script: SharedScript) -> Self {
        Self {
            script,
            finalized: None,
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn accept(&mut self, _frame: &[i16]) -> Result<bool> {
        self.finalized = self.script.lock().expect("script poisoned").heard.take();
        Ok(self.finalized.is_some())
    }

    fn current_result(&mut self) -> Utterance {
        self.finalized.take().unwrap_or_default()
    }

    fn partial_result(&mut self) -> String {
        self.script.lock().expect("script poisoned").partial.clone()
    }

    fn finish(&mut self) -> Utterance {
        self.script
            .lock()
            .expect("script poisoned")
            .flush
            .take()
            .unwrap_or_default()
    }

    fn reset(&mut self) {
        self.finalized = None;
        self.script.lock().expect("script poisoned").partial.clear();
    }
}

pub struct RecordingDisplay {
    log: EventLog,
    fail_set: bool,
}

impl RecordingDisplay {
    #[must_use]
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_set: false,
        }
    }

    /// A display whose `set_pattern` always fails
    #[must_use]
    pub fn failing(log: EventLog) -> Self {
        Self {
            log,
            fail_set: true,
        }
    }

    fn push(&self, event: Event) {
        self.log.lock().expect("event log poisoned").push(event);
    }
}

impl BrailleDisplay for RecordingDisplay {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_pattern(&mut self, pattern: BraillePattern) -> Result<()> {
        if self.fail_set {
            return Err(Error::Device("servo jammed".to_string()));
        }
        self.push(Event::SetPattern(pattern));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.push(Event::Reset);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.push(Event::DisplayShutdown);
        Ok(())
    }
}

pub struct RecordingSpeech {
    log: EventLog,
}

impl RecordingSpeech {
    #[must_use]
    pub const fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Speech for RecordingSpeech {
    fn say(&mut self, text: &str) -> Result<()> {
        self.log
            .lock()
            .expect("event log poisoned")
            .push(Event::Say(text.to_string()));
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log
            .lock()
            .expect("event log poisoned")
            .push(Event::SpeechShutdown);
    }
}

pub const HOLD: Duration = Duration::from_secs(3);
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Session over a scripted source and recognizer
#[must_use]
pub fn scripted_session(script: &SharedScript) -> RecognitionSession {
    RecognitionSession::new(Box::new(ScriptedRecognizer::new(Arc::clone(script))), 0.5)
}

/// Controller wired to fakes, with the console summary disabled
#[must_use]
pub fn controller(steps: &[Step]) -> (Controller, EventLog) {
    controller_with(steps, RecordingDisplay::new)
}

#[must_use]
pub fn controller_with(
    steps: &[Step],
    make_display: fn(EventLog) -> RecordingDisplay,
) -> (Controller, EventLog) {
    build_controller(
        steps,
        make_display,
        Timing {
            listen_timeout: TIMEOUT,
            hold: HOLD,
        },
    )
}

/// Controller with explicit listen and hold durations
#[must_use]
pub fn controller_timed(steps: &[Step], timing: Timing) -> (Controller, EventLog) {
    build_controller(steps, RecordingDisplay::new, timing)
}

fn build_controller(
    steps: &[Step],
    make_display: fn(EventLog) -> RecordingDisplay,
    timing: Timing,
) -> (Controller, EventLog) {
    let log = new_log();
    let script = script(steps);
    let display = make_display(Arc::clone(&log));
    let resolver =
        IntentResolver::new(&PhraseTable::builtin()).expect("builtin table is unambiguous");

    let controller = Controller::new(
        scripted_session(&script),
        Box::new(ScriptedSource::new(script, Arc::clone(&log))),
        resolver,
        Box::new(display),
        Box::new(RecordingSpeech::new(Arc::clone(&log))),
        timing,
    )
    .with_console(false);

    (controller, log)
}
