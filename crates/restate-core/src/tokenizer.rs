//! Word tokenizer used by the local overlap scorer.

/// Minimum number of letters for a run to count as a word.
pub const MIN_WORD_CHARS: usize = 2;

/// Split `text` into lower-cased word tokens.
///
/// A token is a maximal run of at least [`MIN_WORD_CHARS`] alphabetic
/// characters. Digits, underscores, punctuation and whitespace all separate
/// tokens and are dropped. Duplicates are kept, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphabetic() {
            current.push(ch);
            current_len += 1;
        } else {
            flush(&mut words, &mut current, &mut current_len);
        }
    }
    flush(&mut words, &mut current, &mut current_len);

    words
}

fn flush(words: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
    if *current_len >= MIN_WORD_CHARS {
        words.push(std::mem::take(current));
    } else {
        current.clear();
    }
    *current_len = 0;
}
