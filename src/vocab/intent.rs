//! Map recognized text to a letter, a command, or nothing

use std::collections::HashMap;

use super::table::{Canonical, Command, Letter, PREFIX_WORD, PhraseTable};
use crate::Result;

/// Token the recognizer emits for out-of-grammar speech
const UNKNOWN_TOKEN: &str = "[unk]";

/// What the learner asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Letter(Letter),
    Exit,
    Unknown,
}

/// Resolves recognized phrases by exact lookup in the phrase table
///
/// No fuzzy or edit-distance matching is performed.
#[derive(Debug, Clone)]
pub struct IntentResolver {
    variants: HashMap<String, Canonical>,
}

impl IntentResolver {
    /// Index a phrase table for resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the table is ambiguous or malformed
    pub fn new(table: &PhraseTable) -> Result<Self> {
        let variants = table
            .variant_index()?
            .into_iter()
            .map(|(variant, canonical)| (variant.to_string(), canonical))
            .collect();
        Ok(Self { variants })
    }

    /// Resolve raw recognizer text
    ///
    /// Text is normalized first (case folded, whitespace collapsed, `[unk]`
    /// dropped). A leading prefix word is stripped once when something
    /// follows it.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Intent {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Intent::Unknown;
        }

        let phrase = normalized
            .strip_prefix(PREFIX_WORD)
            .and_then(|rest| rest.strip_prefix(' '))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&normalized);

        match self.variants.get(phrase) {
            Some(Canonical::Letter(letter)) => Intent::Letter(*letter),
            Some(Canonical::Command(Command::Exit)) => Intent::Exit,
            None => Intent::Unknown,
        }
    }
}

/// Lowercase, collapse whitespace and drop unknown-word markers
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token != UNKNOWN_TOKEN)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IntentResolver {
        IntentResolver::new(&PhraseTable::builtin()).unwrap()
    }

    fn letter(c: char) -> Intent {
        Intent::Letter(Letter::new(c).unwrap())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Letter   BEE "), "letter bee");
        assert_eq!(normalize("[unk] see [unk]"), "see");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn test_direct_variants() {
        let r = resolver();
        assert_eq!(r.resolve("bee"), letter('b'));
        assert_eq!(r.resolve("see"), letter('c'));
        assert_eq!(r.resolve("double you"), letter('w'));
        assert_eq!(r.resolve("zed"), letter('z'));
    }

    #[test]
    fn test_prefix_stripped_once() {
        let r = resolver();
        assert_eq!(r.resolve("letter bee"), letter('b'));
        assert_eq!(r.resolve("LETTER  Double U"), letter('w'));
        assert_eq!(r.resolve("letter letter bee"), Intent::Unknown);
        assert_eq!(r.resolve("letter"), Intent::Unknown);
        assert_eq!(r.resolve("letter "), Intent::Unknown);
    }

    #[test]
    fn test_exit_commands() {
        let r = resolver();
        for phrase in ["exit", "Quit", " stop "] {
            assert_eq!(r.resolve(phrase), Intent::Exit, "{phrase}");
        }
    }

    #[test]
    fn test_unknown_inputs() {
        let r = resolver();
        assert_eq!(r.resolve(""), Intent::Unknown);
        assert_eq!(r.resolve("   "), Intent::Unknown);
        assert_eq!(r.resolve("[unk]"), Intent::Unknown);
        assert_eq!(r.resolve("banana"), Intent::Unknown);
        assert_eq!(r.resolve("bea"), Intent::Unknown);
    }

    #[test]
    fn test_every_grammar_phrase_resolves() {
        let table = PhraseTable::builtin();
        let grammar = crate::vocab::Grammar::build(&table).unwrap();
        let r = IntentResolver::new(&table).unwrap();
        for phrase in grammar.phrases() {
            assert_ne!(r.resolve(phrase), Intent::Unknown, "{phrase}");
        }
    }
}
