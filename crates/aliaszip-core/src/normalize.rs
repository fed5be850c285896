//! Text canonicalization for name comparison.
//!
//! [`normalize`] lower-cases its input and drops separators, brackets,
//! quotes, common ASCII/CJK punctuation, and the kana long-vowel mark, so that
//! `"Do-Re Mi!"`, `"doremi"`, and `"ド・レ・ミー"`-style spellings collapse to
//! comparable forms.

/// Characters removed by [`normalize`].
const STRIP_CHARS: &[char] = &[
    // whitespace and separators
    ' ', '\t', '\n', '\r', '\u{3000}', '-', '_', '/', '\\', '|',
    // brackets
    '(', ')', '[', ']', '{', '}', '<', '>', '（', '）', '［', '］', '【', '】', '「', '」', '『',
    '』', '〈', '〉', '《', '》',
    // quotes
    '\'', '"', '`', '‘', '’', '“', '”',
    // punctuation
    '.', ',', '!', '?', ':', ';', '~', '&', '+', '*', '#', '@', '・', '、', '。', '，', '．', '！',
    '？', '：', '；', '〜', '～', '♪', '☆', '★',
    // long-vowel marks
    'ー', 'ｰ',
];

fn is_stripped(c: char) -> bool {
    STRIP_CHARS.contains(&c)
}

/// Canonicalize `text` for comparison.
///
/// Pure and total: empty input yields an empty string, which callers treat as
/// "no query".
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !is_stripped(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_case_and_spaces() {
        assert_eq!(normalize("Do Re Mi"), "doremi");
        assert_eq!(normalize("  DOREMI  "), "doremi");
    }

    #[test]
    fn test_punctuation_and_brackets() {
        assert_eq!(normalize("Hello, World! (Remix)"), "helloworldremix");
        assert_eq!(normalize("a_b-c/d\\e"), "abcde");
        assert_eq!(normalize("【初音ミク】「歌」"), "初音ミク歌");
    }

    #[test]
    fn test_long_vowel_mark_removed() {
        assert_eq!(normalize("スーパー"), "スパ");
        assert_eq!(normalize("ｽｰﾊﾟｰ"), "ｽﾊﾟ");
    }

    #[test]
    fn test_full_width_space() {
        assert_eq!(normalize("ど\u{3000}れみ"), "どれみ");
    }

    #[test]
    fn test_idempotent() {
        for s in ["Do Re Mi", "【どれみ】", "哆来咪 ~ Remix", "ABC!?"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
