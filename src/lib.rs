//! Braille Tutor - offline voice-driven braille letter trainer
//!
//! A learner says a letter ("bee", "letter double you"); the tutor raises
//! that letter's braille cell on a six-servo display, announces it, holds
//! it for a few seconds, lowers it and listens again.
//!
//! - Spoken vocabulary and intent resolution
//! - Braille cell table and text rendering
//! - Microphone capture and offline grammar-constrained recognition
//! - Servo and simulated displays
//! - Session controller and troubleshooting modes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Audio sources                       │
//! │        Microphone (cpal)  │  WAV replay (hound)     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ frames
//! ┌────────────────────▼────────────────────────────────┐
//! │   RecognitionSession (grammar from PhraseTable)     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ phrase
//! ┌────────────────────▼────────────────────────────────┐
//! │   Controller  →  IntentResolver  →  braille table   │
//! └──────────┬──────────────────────────────┬───────────┘
//!            │                              │
//!   ┌────────▼─────────┐          ┌─────────▼─────────┐
//!   │ Display          │          │ Speech            │
//!   │ servo │ console  │          │ espeak │ silent   │
//!   └──────────────────┘          └───────────────────┘
//! ```

pub mod braille;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod vocab;
pub mod voice;

pub use braille::{BraillePattern, pattern_for};
pub use config::Config;
pub use controller::{Controller, ControllerState, SessionStats, Timing};
pub use display::{BrailleDisplay, ServoDisplay, SimulatedDisplay};
pub use error::{Error, Result};
pub use vocab::{Grammar, Intent, IntentResolver, Letter, PhraseTable};
pub use voice::{AudioSource, RecognitionResult, RecognitionSession, Speech};
