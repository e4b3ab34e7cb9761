//! Term sets for knowledge relevance scoring.

use campus_search::tokenizer::is_cjk;
use std::collections::HashSet;

/// Distinct CJK characters and distinct lower-cased ASCII alphabetic words.
///
/// Digits are separators here, so "cs101" contributes "cs". Repeated
/// occurrences collapse into one term.
pub fn extract_terms(text: &str) -> HashSet<String> {
    let mut terms = HashSet::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            word.push(c.to_ascii_lowercase());
            continue;
        }

        if !word.is_empty() {
            terms.insert(std::mem::take(&mut word));
        }

        if is_cjk(c) {
            terms.insert(c.to_string());
        }
    }

    if !word.is_empty() {
        terms.insert(word);
    }

    terms
}

/// Number of terms shared by two sets.
pub fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}
