#![forbid(unsafe_code)]

//! Punctuation classification for IME passthrough.
//!
//! The arbiter only cares about text that carries punctuation an IME may
//! commit in either halfwidth or fullwidth form. Everything else is ignored
//! before any state is touched.

/// Halfwidth punctuation keys that prefer the native `input` event path,
/// paired with the fullwidth form a CJK IME typically commits for them.
///
/// Only the keys drive behavior (see [`is_passthrough_key`]); the fullwidth
/// column is exposed for hosts that want to display or normalize the pairing.
pub const HALFWIDTH_TO_FULLWIDTH: [(char, char); 14] = [
    (',', '，'),
    ('.', '。'),
    ('?', '？'),
    ('!', '！'),
    (':', '：'),
    (';', '；'),
    ('\'', '\''),
    ('(', '（'),
    (')', '）'),
    ('[', '【'),
    (']', '】'),
    ('<', '《'),
    ('>', '》'),
    ('\\', '、'),
];

/// Returns `true` for a single character in the passthrough punctuation set.
#[must_use]
pub const fn is_ime_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '，' | '。'
            | '、'
            | '？'
            | '！'
            | '：'
            | '；'
            | '（'
            | '）'
            | '【'
            | '】'
            | '《'
            | '》'
            | ','
            | '.'
            | '?'
            | '!'
            | ':'
            | ';'
            | '('
            | ')'
            | '['
            | ']'
            | '<'
            | '>'
            | '\\'
    )
}

/// Returns `true` when `text` contains at least one passthrough punctuation
/// character.
///
/// IME commits can carry a punctuation mark together with other text (for
/// example `"好，"`), so membership of any character is enough.
#[must_use]
pub fn contains_ime_punctuation(text: &str) -> bool {
    text.chars().any(is_ime_punctuation)
}

/// Fullwidth counterpart of a halfwidth punctuation key, if it has one.
#[must_use]
pub fn fullwidth_for(halfwidth: char) -> Option<char> {
    HALFWIDTH_TO_FULLWIDTH
        .iter()
        .find(|(half, _)| *half == halfwidth)
        .map(|(_, full)| *full)
}

/// Returns `true` when a DOM `key` value names a halfwidth punctuation key
/// whose keydown may resolve into an IME-committed punctuation character.
#[must_use]
pub fn is_passthrough_key(dom_key: &str) -> bool {
    let mut chars = dom_key.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => fullwidth_for(ch).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfwidth_and_fullwidth_marks_qualify() {
        for text in [",", "，", "。", "、", "\\", "【", ">", "?"] {
            assert!(contains_ime_punctuation(text), "{text:?} should qualify");
        }
    }

    #[test]
    fn letters_digits_and_empty_do_not_qualify() {
        for text in ["", "a", "あ", "你好", "1", " ", "-", "'"] {
            assert!(!contains_ime_punctuation(text), "{text:?} should not qualify");
        }
    }

    #[test]
    fn mixed_commit_qualifies_on_any_mark() {
        assert!(contains_ime_punctuation("好，"));
        assert!(contains_ime_punctuation("end."));
    }

    #[test]
    fn fullwidth_lookup() {
        assert_eq!(fullwidth_for(','), Some('，'));
        assert_eq!(fullwidth_for('\\'), Some('、'));
        assert_eq!(fullwidth_for('a'), None);
    }

    #[test]
    fn passthrough_keys_are_single_table_chars() {
        assert!(is_passthrough_key(","));
        assert!(is_passthrough_key("'"));
        assert!(!is_passthrough_key("Process"));
        assert!(!is_passthrough_key(""));
        assert!(!is_passthrough_key("a"));
    }
}
