//! Recognizer grammar derived from the phrase table

use std::collections::BTreeSet;

use super::table::{Canonical, PREFIX_WORD, PhraseTable};
use crate::Result;

/// Closed set of phrases the recognizer may emit
///
/// Contains every variant, every letter variant preceded by the prefix
/// word, and every command variant. Nothing outside the table is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    phrases: BTreeSet<String>,
}

impl Grammar {
    /// Derive the grammar from a phrase table
    ///
    /// # Errors
    ///
    /// Returns an error if the table is ambiguous or malformed
    pub fn build(table: &PhraseTable) -> Result<Self> {
        table.variant_index()?;

        let mut phrases = BTreeSet::new();
        for entry in table.entries() {
            let is_letter = matches!(entry.canonical(), Canonical::Letter(_));
            for variant in entry.variants() {
                phrases.insert(variant.clone());
                if is_letter {
                    phrases.insert(format!("{PREFIX_WORD} {variant}"));
                }
            }
        }

        tracing::debug!(phrases = phrases.len(), "recognition grammar built");
        Ok(Self { phrases })
    }

    #[must_use]
    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrases in sorted order
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{Command, Letter, PhraseEntry};

    #[test]
    fn test_builtin_grammar_contents() {
        let grammar = Grammar::build(&PhraseTable::builtin()).unwrap();

        assert!(grammar.contains("bee"));
        assert!(grammar.contains("letter bee"));
        assert!(grammar.contains("double you"));
        assert!(grammar.contains("letter double you"));
        assert!(grammar.contains("exit"));
        assert!(!grammar.contains("letter exit"));
        assert!(!grammar.contains("letter"));
        assert!(!grammar.contains("banana"));
    }

    #[test]
    fn test_rebuild_yields_same_grammar() {
        let table = PhraseTable::builtin();
        let first = Grammar::build(&table).unwrap();
        let second = Grammar::build(&table).unwrap();

        assert_eq!(first, second);
        assert!(first.phrases().eq(second.phrases()));
    }

    #[test]
    fn test_size_is_letters_twice_plus_commands() {
        let table = PhraseTable::builtin();
        let letter_variants: usize = table.letters().map(|(_, e)| e.variants().len()).sum();
        let command_variants: usize = table.commands().map(|(_, e)| e.variants().len()).sum();

        let grammar = Grammar::build(&table).unwrap();
        assert_eq!(grammar.len(), letter_variants * 2 + command_variants);
    }

    #[test]
    fn test_ambiguous_table_has_no_grammar() {
        let b = Letter::new('b').unwrap();
        let table = PhraseTable::new(vec![
            PhraseEntry::new(Canonical::Letter(b), &["bee", "quit"]),
            PhraseEntry::new(Canonical::Command(Command::Exit), &["quit"]),
        ]);
        assert!(Grammar::build(&table).is_err());
    }
}
