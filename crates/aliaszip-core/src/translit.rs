//! Script transliteration: Han → Pinyin, kana → Romaji, Hiragana ↔ Katakana.
//!
//! The transliterators are "best signal" transforms. A text with nothing to
//! transliterate, or a transform that fails internally, yields an empty
//! string rather than an error; callers treat empty as "no signal".

use std::panic::{self, AssertUnwindSafe};

use pinyin::ToPinyin;
use wana_kana::ConvertJapanese;

use crate::normalize::normalize;

const HIRAGANA_START: u32 = 0x3041;
const HIRAGANA_END: u32 = 0x3096;
const KATAKANA_START: u32 = 0x30A1;
const KATAKANA_END: u32 = 0x30F6;
const KANA_OFFSET: u32 = 0x60;

/// Both kana-converted forms of one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanaForms {
    pub to_katakana: String,
    pub to_hiragana: String,
}

pub fn is_hiragana(c: char) -> bool {
    (HIRAGANA_START..=HIRAGANA_END).contains(&(c as u32))
}

pub fn is_katakana(c: char) -> bool {
    (KATAKANA_START..=KATAKANA_END).contains(&(c as u32))
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c)
}

pub fn contains_kana(text: &str) -> bool {
    text.chars().any(is_kana)
}

/// CJK Unified Ideographs, Extension A, and Compatibility Ideographs.
pub fn is_han(c: char) -> bool {
    matches!(c as u32, 0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF)
}

/// Shift Hiragana into the Katakana block and vice versa.
///
/// Characters outside the two blocks pass through unchanged.
pub fn convert_kana(text: &str) -> KanaForms {
    let to_katakana = text
        .chars()
        .map(|c| {
            if is_hiragana(c) {
                char::from_u32(c as u32 + KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect();
    let to_hiragana = text
        .chars()
        .map(|c| {
            if is_katakana(c) {
                char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect();
    KanaForms {
        to_katakana,
        to_hiragana,
    }
}

/// Run a transform, turning a panic inside a third-party converter into
/// an empty result.
pub(crate) fn guarded<F: FnOnce() -> String>(label: &str, text: &str, f: F) -> String {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(out) => out,
        Err(_) => {
            tracing::warn!(transform = label, input = text, "transliteration failed");
            String::new()
        }
    }
}

/// Convert Han characters to unaccented, lower-cased Pinyin.
///
/// Syllables are concatenated without separators; non-Han characters are kept
/// in place. Returns an empty string when `text` has no Han characters.
pub fn to_pinyin(text: &str) -> String {
    if !text.chars().any(is_han) {
        return String::new();
    }
    guarded("pinyin", text, || {
        let mut out = String::with_capacity(text.len() * 2);
        for (c, py) in text.chars().zip(text.to_pinyin()) {
            match py {
                Some(p) => out.push_str(p.plain()),
                None => out.push(c),
            }
        }
        out.to_lowercase()
    })
}

/// Romanize kana and normalize the result.
///
/// Returns an empty string when `text` contains no kana.
pub fn to_romaji(text: &str) -> String {
    if !contains_kana(text) {
        return String::new();
    }
    guarded("romaji", text, || normalize(&text.to_romaji()))
}
