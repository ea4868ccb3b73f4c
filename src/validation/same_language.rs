use itertools::{Itertools, repeat_n};

use crate::automaton::{Language, Letter};

fn sorted_alphabet<S: Letter>(automaton: &impl Language<Letter = S>) -> Vec<S> {
    let mut alphabet = automaton.alphabet().to_vec();
    alphabet.sort();
    alphabet
}

/// Enumerates every word over the alphabet with a length below the limit,
/// shortest first. The empty word is included.
fn words_below<S: Letter>(alphabet: &[S], max_word_length: usize) -> Vec<Vec<S>> {
    let mut words = vec![vec![]];

    for length in 1..max_word_length {
        for word in repeat_n(alphabet.iter(), length).multi_cartesian_product() {
            words.push(word.into_iter().cloned().collect_vec());
        }
    }

    words
}

/// Checks if two automata accept the same language.
/// This is done by checking if the alphabets are the same and then checking
/// if the automata accept the same words up to a certain length.
pub fn same_language<S: Letter>(
    a: &impl Language<Letter = S>,
    b: &impl Language<Letter = S>,
    max_word_length: usize,
) -> bool {
    if sorted_alphabet(a) != sorted_alphabet(b) {
        return false;
    }

    words_below(a.alphabet(), max_word_length)
        .into_iter()
        .all(|word| a.accepts(&word) == b.accepts(&word))
}

/// Asserts that two automata accept the same words up to a certain length,
/// panicking with the first distinguishing word.
pub fn assert_same_language<S: Letter>(
    a: &impl Language<Letter = S>,
    b: &impl Language<Letter = S>,
    max_word_length: usize,
) {
    assert_eq!(
        sorted_alphabet(a),
        sorted_alphabet(b),
        "Alphabets are not the same"
    );

    for word in words_below(a.alphabet(), max_word_length) {
        match (a.accepts(&word), b.accepts(&word)) {
            (true, false) => {
                panic!(
                    "{:?} is accepted by automaton `a` but not by automaton `b`. Thus their languages are not equal.",
                    word
                );
            }
            (false, true) => {
                panic!(
                    "{:?} is accepted by automaton `b` but not by automaton `a`. Thus their languages are not equal.",
                    word
                );
            }
            _ => {}
        }
    }
}

/// Asserts that the language accepted by automaton `a` is the inverse of the
/// language accepted by automaton `b`. Meaning no word is accepted by both
/// and no word is accepted by none.
pub fn assert_inverse_language<S: Letter>(
    a: &impl Language<Letter = S>,
    b: &impl Language<Letter = S>,
    max_word_length: usize,
) {
    assert_eq!(
        sorted_alphabet(a),
        sorted_alphabet(b),
        "Alphabets are not the same"
    );

    for word in words_below(a.alphabet(), max_word_length) {
        match (a.accepts(&word), b.accepts(&word)) {
            (true, true) => {
                panic!(
                    "{:?} is accepted by automaton `a` and by automaton `b`. Thus their languages are not inverse.",
                    word
                );
            }
            (false, false) => {
                panic!(
                    "{:?} is accepted by neither automaton `a` nor automaton `b`. Thus their languages are not inverse.",
                    word
                );
            }
            _ => {}
        }
    }
}

/// Asserts that the language accepted by automaton `a` is a subset of the
/// language accepted by automaton `b`.
pub fn assert_subset_language<S: Letter>(
    a: &impl Language<Letter = S>,
    b: &impl Language<Letter = S>,
    max_word_length: usize,
) {
    assert_eq!(
        sorted_alphabet(a),
        sorted_alphabet(b),
        "Alphabets are not the same"
    );

    for word in words_below(a.alphabet(), max_word_length) {
        if a.accepts(&word) && !b.accepts(&word) {
            panic!(
                "{:?} is accepted by automaton `a` but not by automaton `b`. Thus the language of `a` is not a subset of `b`.",
                word
            );
        }
    }
}
