//! Sentence-based splitting of knowledge content into bounded snippets.

/// Characters that end a sentence.
fn is_sentence_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '.' | '!' | '?' | '\n')
}

/// Split `content` into snippets of at most roughly `chunk_size` characters.
///
/// Sentences are accumulated greedily; a sentence that would push the current
/// snippet past `chunk_size` starts a new one. Every accumulated sentence is
/// terminated with "。". A single sentence longer than `chunk_size` becomes its
/// own snippet. When no sentence survives, the first `chunk_size` characters
/// of the raw content are returned. Empty content yields no snippets.
pub fn split_content(content: &str, chunk_size: usize) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in content.split(is_sentence_end) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > chunk_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current).trim().to_string());
            current_len = 0;
        }

        current.push_str(sentence);
        current.push('。');
        current_len += sentence_len + 1;
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    if chunks.is_empty() {
        chunks.push(content.chars().take(chunk_size).collect());
    }

    tracing::debug!(
        "Split {} chars into {} chunks (size: {})",
        content.chars().count(),
        chunks.len(),
        chunk_size
    );

    chunks
}
