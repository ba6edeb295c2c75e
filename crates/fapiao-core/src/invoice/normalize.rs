//! Punctuation normalization and whitespace tokenization.

/// Map ASCII punctuation to its full-width form.
///
/// Every mapping is one char to one char, so char offsets in the
/// normalized string line up with the input.
pub fn normalize(s: &str) -> String {
    s.chars().map(to_full_width).collect()
}

fn to_full_width(c: char) -> char {
    match c {
        '(' => '（',
        ')' => '）',
        ':' => '：',
        ',' => '，',
        other => other,
    }
}

/// Split strings that contain whitespace into separate tokens.
///
/// Strings without whitespace pass through untouched; order is preserved.
pub fn tokenize<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(texts.len());
    for text in texts {
        let text = text.as_ref();
        if text.chars().any(char::is_whitespace) {
            tokens.extend(text.split_whitespace().map(str::to_string));
        } else {
            tokens.push(text.to_string());
        }
    }
    tokens
}
