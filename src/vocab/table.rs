//! Phrase table: canonical letters and commands with their spoken variants

use std::collections::HashMap;
use std::fmt;

use crate::{Error, Result};

/// One of the 26 lowercase latin letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Letter(u8);

impl Letter {
    /// Create a letter from a character, case-insensitively
    ///
    /// Returns `None` for anything outside `a..=z`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(c: char) -> Option<Self> {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            Some(Self(lower as u8))
        } else {
            None
        }
    }

    /// Lowercase character value
    #[must_use]
    pub const fn as_char(self) -> char {
        self.0 as char
    }

    /// Zero-based alphabet position (`a` is 0)
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - b'a') as usize
    }

    /// All letters in alphabetical order
    pub fn all() -> impl Iterator<Item = Self> {
        (b'a'..=b'z').map(Self)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Spoken commands understood outside the alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Leave the tutor
    Exit,
}

impl Command {
    /// Stable command name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exit => "exit",
        }
    }
}

/// Stable value a spoken variant resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canonical {
    Letter(Letter),
    Command(Command),
}

impl fmt::Display for Canonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(letter) => write!(f, "{letter}"),
            Self::Command(command) => f.write_str(command.name()),
        }
    }
}

/// A canonical value and the spoken forms accepted for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseEntry {
    canonical: Canonical,
    variants: Vec<String>,
}

impl PhraseEntry {
    /// Create an entry from its canonical value and ordered variants
    #[must_use]
    pub fn new<S: AsRef<str>>(canonical: Canonical, variants: &[S]) -> Self {
        Self {
            canonical,
            variants: variants.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    #[must_use]
    pub const fn canonical(&self) -> Canonical {
        self.canonical
    }

    /// Accepted spoken forms, in table order
    #[must_use]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

/// Built-in letter variants, including common misrecognitions of each name
const LETTER_VARIANTS: &[(char, &[&str])] = &[
    ('a', &["a", "ay", "hey", "hay", "eh", "day"]),
    ('b', &["b", "bee", "be", "me", "we"]),
    ('c', &["c", "cee", "see", "sea", "she"]),
    ('d', &["d", "dee", "the", "they", "there"]),
    ('e', &["e", "ee", "he"]),
    ('f', &["f", "ef", "if", "off", "half"]),
    ('g', &["g", "gee", "jee"]),
    ('h', &["h", "aitch", "age", "eight"]),
    ('i', &["i", "eye", "hi", "high"]),
    ('j', &["j", "jay"]),
    ('k', &["k", "kay", "okay", "gay"]),
    ('l', &["l", "el", "hell", "all", "ill"]),
    ('m', &["m", "em", "am", "um", "them"]),
    ('n', &["n", "en", "an", "in", "and", "end"]),
    ('o', &["o", "oh", "zero", "owe"]),
    ('p', &["p", "pee", "pe"]),
    ('q', &["q", "cue", "queue"]),
    ('r', &["r", "are", "or", "our", "hour"]),
    ('s', &["s", "ess", "yes", "is", "as"]),
    ('t', &["t", "tee", "tea", "to", "two", "tree"]),
    ('u', &["u", "you", "hue", "who"]),
    ('v', &["v", "vee"]),
    ('w', &["w", "double u", "double you"]),
    ('x', &["x", "ex", "axe", "acts"]),
    ('y', &["y", "why", "while", "wa"]),
    ('z', &["z", "zee", "zed", "ze"]),
];

const EXIT_VARIANTS: &[&str] = &["exit", "quit", "stop"];

/// Word that may precede a letter name ("letter bee")
pub(crate) const PREFIX_WORD: &str = "letter";

/// Immutable table of every phrase the tutor accepts
///
/// Constructed once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct PhraseTable {
    entries: Vec<PhraseEntry>,
}

impl PhraseTable {
    /// Create a table from explicit entries
    ///
    /// Ambiguity is not checked here; [`PhraseTable::variant_index`] reports it.
    #[must_use]
    pub const fn new(entries: Vec<PhraseEntry>) -> Self {
        Self { entries }
    }

    /// The built-in English table: 26 letters and the exit command
    #[must_use]
    pub fn builtin() -> Self {
        let mut entries: Vec<PhraseEntry> = LETTER_VARIANTS
            .iter()
            .filter_map(|(c, variants)| {
                Letter::new(*c).map(|letter| PhraseEntry::new(Canonical::Letter(letter), variants))
            })
            .collect();
        entries.push(PhraseEntry::new(
            Canonical::Command(Command::Exit),
            EXIT_VARIANTS,
        ));
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[PhraseEntry] {
        &self.entries
    }

    /// Entries whose canonical value is a letter
    pub fn letters(&self) -> impl Iterator<Item = (Letter, &PhraseEntry)> {
        self.entries.iter().filter_map(|e| match e.canonical {
            Canonical::Letter(letter) => Some((letter, e)),
            Canonical::Command(_) => None,
        })
    }

    /// Entries whose canonical value is a command
    pub fn commands(&self) -> impl Iterator<Item = (Command, &PhraseEntry)> {
        self.entries.iter().filter_map(|e| match e.canonical {
            Canonical::Command(command) => Some((command, e)),
            Canonical::Letter(_) => None,
        })
    }

    /// Build the reverse mapping from spoken variant to canonical value
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousVariant`] if a variant appears under two
    /// canonical values, and [`Error::Config`] for malformed variants
    /// (empty, not normalized, starting with the prefix word, or repeated
    /// within one entry).
    pub fn variant_index(&self) -> Result<HashMap<&str, Canonical>> {
        let mut index: HashMap<&str, Canonical> = HashMap::new();

        for entry in &self.entries {
            for variant in &entry.variants {
                validate_variant(variant, entry.canonical)?;

                if let Some(previous) = index.insert(variant.as_str(), entry.canonical) {
                    if previous == entry.canonical {
                        return Err(Error::Config(format!(
                            "variant \"{variant}\" listed twice under '{previous}'"
                        )));
                    }
                    return Err(Error::AmbiguousVariant {
                        variant: variant.clone(),
                        first: previous.to_string(),
                        second: entry.canonical.to_string(),
                    });
                }
            }
        }

        Ok(index)
    }
}

fn validate_variant(variant: &str, canonical: Canonical) -> Result<()> {
    let normalized = variant.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(Error::Config(format!("empty variant under '{canonical}'")));
    }
    if normalized != variant || variant.chars().any(char::is_uppercase) {
        return Err(Error::Config(format!(
            "variant \"{variant}\" under '{canonical}' must be lowercase single-spaced"
        )));
    }
    if variant.split(' ').next() == Some(PREFIX_WORD) {
        return Err(Error::Config(format!(
            "variant \"{variant}\" under '{canonical}' starts with \"{PREFIX_WORD}\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_range() {
        assert_eq!(Letter::new('a').map(Letter::as_char), Some('a'));
        assert_eq!(Letter::new('Q').map(Letter::as_char), Some('q'));
        assert!(Letter::new('1').is_none());
        assert!(Letter::new('é').is_none());
        assert_eq!(Letter::all().count(), 26);
        assert_eq!(Letter::new('z').map(Letter::index), Some(25));
    }

    #[test]
    fn test_builtin_covers_alphabet() {
        let table = PhraseTable::builtin();
        let letters: Vec<Letter> = table.letters().map(|(l, _)| l).collect();
        assert_eq!(letters, Letter::all().collect::<Vec<_>>());
        assert_eq!(table.commands().count(), 1);
    }

    #[test]
    fn test_builtin_is_unambiguous() {
        let table = PhraseTable::builtin();
        let index = table.variant_index().unwrap();
        let total: usize = table.entries().iter().map(|e| e.variants().len()).sum();
        assert_eq!(index.len(), total);
    }

    #[test]
    fn test_every_letter_accepts_its_bare_name() {
        let table = PhraseTable::builtin();
        for (letter, entry) in table.letters() {
            assert!(
                entry.variants().contains(&letter.to_string()),
                "missing bare form for {letter}"
            );
        }
    }

    #[test]
    fn test_cross_entry_duplicate_is_ambiguous() {
        let c = Letter::new('c').unwrap();
        let s = Letter::new('s').unwrap();
        let table = PhraseTable::new(vec![
            PhraseEntry::new(Canonical::Letter(c), &["cee", "see"]),
            PhraseEntry::new(Canonical::Letter(s), &["ess", "see"]),
        ]);

        match table.variant_index() {
            Err(Error::AmbiguousVariant {
                variant,
                first,
                second,
            }) => {
                assert_eq!(variant, "see");
                assert_eq!(first, "c");
                assert_eq!(second, "s");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_letter_and_command_collision_is_ambiguous() {
        let s = Letter::new('s').unwrap();
        let table = PhraseTable::new(vec![
            PhraseEntry::new(Canonical::Letter(s), &["stop"]),
            PhraseEntry::new(Canonical::Command(Command::Exit), &["stop"]),
        ]);
        assert!(matches!(
            table.variant_index(),
            Err(Error::AmbiguousVariant { .. })
        ));
    }

    #[test]
    fn test_malformed_variants_rejected() {
        let a = Canonical::Letter(Letter::new('a').unwrap());
        for bad in ["", "Ay", " ay", "double  u", "letter a"] {
            let table = PhraseTable::new(vec![PhraseEntry::new(a, &[bad])]);
            assert!(
                matches!(table.variant_index(), Err(Error::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_repeated_variant_within_entry_rejected() {
        let a = Canonical::Letter(Letter::new('a').unwrap());
        let table = PhraseTable::new(vec![PhraseEntry::new(a, &["ay", "ay"])]);
        assert!(matches!(table.variant_index(), Err(Error::Config(_))));
    }
}
