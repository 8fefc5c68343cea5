//! Spoken vocabulary
//!
//! The phrase table is the single source of truth: the recognizer grammar
//! and the intent resolver are both derived from it, so every phrase the
//! recognizer can emit resolves to a known intent.

mod grammar;
mod intent;
mod table;

pub use grammar::Grammar;
pub use intent::{Intent, IntentResolver, normalize};
pub use table::{Canonical, Command, Letter, PhraseEntry, PhraseTable};
