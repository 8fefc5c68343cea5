//! Vocabulary and braille table integration tests

use braille_tutor::braille::{format_binary, render_grid};
use braille_tutor::vocab::{Canonical, Command, PhraseEntry};
use braille_tutor::{Error, Grammar, Intent, IntentResolver, Letter, PhraseTable, pattern_for};

fn letter(c: char) -> Letter {
    Letter::new(c).unwrap()
}

#[test]
fn test_every_table_variant_resolves_to_its_entry() {
    let table = PhraseTable::builtin();
    let resolver = IntentResolver::new(&table).unwrap();

    for entry in table.entries() {
        let expected = match entry.canonical() {
            Canonical::Letter(l) => Intent::Letter(l),
            Canonical::Command(Command::Exit) => Intent::Exit,
        };
        for variant in entry.variants() {
            assert_eq!(resolver.resolve(variant), expected, "{variant}");
            assert_eq!(
                resolver.resolve(&variant.to_uppercase()),
                expected,
                "{variant} uppercased"
            );
        }
    }
}

#[test]
fn test_prefixed_letters_resolve_for_every_letter() {
    let table = PhraseTable::builtin();
    let resolver = IntentResolver::new(&table).unwrap();

    for (l, entry) in table.letters() {
        for variant in entry.variants() {
            let phrase = format!("letter {variant}");
            assert_eq!(resolver.resolve(&phrase), Intent::Letter(l), "{phrase}");
        }
    }
}

#[test]
fn test_grammar_and_resolver_agree() {
    let table = PhraseTable::builtin();
    let grammar = Grammar::build(&table).unwrap();
    let resolver = IntentResolver::new(&table).unwrap();

    assert!(!grammar.is_empty());
    for phrase in grammar.phrases() {
        assert_ne!(resolver.resolve(phrase), Intent::Unknown, "{phrase}");
    }
}

#[test]
fn test_common_misrecognitions() {
    let resolver = IntentResolver::new(&PhraseTable::builtin()).unwrap();

    let cases = [
        ("hey", 'a'),
        ("me", 'b'),
        ("she", 'c'),
        ("the", 'd'),
        ("okay", 'k'),
        ("zero", 'o'),
        ("hour", 'r'),
        ("yes", 's'),
        ("two", 't'),
        ("you", 'u'),
        ("why", 'y'),
    ];
    for (heard, expected) in cases {
        assert_eq!(resolver.resolve(heard), Intent::Letter(letter(expected)), "{heard}");
    }
}

#[test]
fn test_ambiguous_table_rejected_at_startup() {
    let table = PhraseTable::new(vec![
        PhraseEntry::new(Canonical::Letter(letter('c')), &["see"]),
        PhraseEntry::new(Canonical::Letter(letter('s')), &["see"]),
    ]);

    assert!(matches!(
        IntentResolver::new(&table),
        Err(Error::AmbiguousVariant { .. })
    ));
    assert!(matches!(
        Grammar::build(&table),
        Err(Error::AmbiguousVariant { .. })
    ));
}

#[test]
fn test_custom_table() {
    let table = PhraseTable::new(vec![
        PhraseEntry::new(Canonical::Letter(letter('a')), &["alpha"]),
        PhraseEntry::new(Canonical::Command(Command::Exit), &["done"]),
    ]);
    let resolver = IntentResolver::new(&table).unwrap();
    let grammar = Grammar::build(&table).unwrap();

    assert_eq!(resolver.resolve("Alpha"), Intent::Letter(letter('a')));
    assert_eq!(resolver.resolve("letter alpha"), Intent::Letter(letter('a')));
    assert_eq!(resolver.resolve("done"), Intent::Exit);
    assert_eq!(resolver.resolve("a"), Intent::Unknown);
    assert_eq!(
        grammar.phrases().collect::<Vec<_>>(),
        vec!["alpha", "done", "letter alpha"]
    );
}

#[test]
fn test_rendered_cells() {
    let cases = [
        ('a', "O .\n. .\n. .", "100000"),
        ('b', "O .\nO .\n. .", "110000"),
        ('k', "O .\n. .\nO .", "101000"),
        ('w', ". O\nO O\n. O", "010111"),
        ('z', "O .\n. O\nO O", "101011"),
    ];
    for (c, grid, binary) in cases {
        let pattern = pattern_for(letter(c));
        assert_eq!(render_grid(pattern), grid, "{c}");
        assert_eq!(format_binary(pattern), binary, "{c}");
    }
}
