//! Mixed Chinese/English tokenization.
//!
//! Text is lower-cased, then maximal runs of CJK ideographs and maximal runs of
//! ASCII alphanumerics are extracted; everything else is discarded. CJK runs are
//! exploded into single-character tokens while ASCII runs stay whole words.
//! Character-level Chinese tokens approximate word matching without a
//! segmenter, at the cost of over-matching on single shared characters.

/// Whether `c` lies in the CJK Unified Ideographs block (U+4E00..=U+9FFF).
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Split `text` into ordered scorable tokens. Empty input yields no tokens.
///
/// # Example
/// ```
/// use campus_search::tokenize;
///
/// assert_eq!(tokenize("图书馆"), vec!["图", "书", "馆"]);
/// assert_eq!(tokenize("Library Research"), vec!["library", "research"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in lower.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c);
            continue;
        }

        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }

        if is_cjk(c) {
            tokens.push(c.to_string());
        }
    }

    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

/// Whether a token is a purely alphabetic ASCII word.
pub fn is_ascii_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic())
}
