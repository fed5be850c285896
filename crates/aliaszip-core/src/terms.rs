//! Search-term generation.
//!
//! A term set is every normalized surface form a string might be typed as:
//! the original, its Pinyin, its Romaji, its Katakana and Hiragana variants,
//! and the Romaji of those variants. The same expansion is applied to the
//! query and to every candidate, which is what makes matching symmetric across
//! scripts.
//!
//! [`generate_search_terms`] is the pure expansion. [`TermCache`] memoizes it
//! (and its building blocks) per source string.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::normalize::normalize;
use crate::translit::{contains_kana, convert_kana, to_pinyin, to_romaji};

/// Normalized surface forms derived from one source string. Never contains
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTermSet {
    terms: BTreeSet<String>,
}

impl SearchTermSet {
    fn insert(&mut self, term: String) {
        if !term.is_empty() {
            self.terms.insert(term);
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// True if any term of `self` is a substring of any term of `other`.
    pub fn any_within(&self, other: &SearchTermSet) -> bool {
        self.iter()
            .any(|needle| other.iter().any(|hay| hay.contains(needle)))
    }

    /// Merge `other` into `self`.
    pub fn extend(&mut self, other: &SearchTermSet) {
        self.terms.extend(other.terms.iter().cloned());
    }
}

/// Expand `text` into its term set, uncached.
pub fn generate_search_terms(text: &str) -> SearchTermSet {
    let mut set = SearchTermSet::default();
    set.insert(normalize(text));
    set.insert(normalize(&to_pinyin(text)));
    set.insert(to_romaji(text));

    let forms = convert_kana(text);
    set.insert(normalize(&forms.to_katakana));
    set.insert(normalize(&forms.to_hiragana));

    if contains_kana(text) {
        set.insert(to_romaji(&forms.to_katakana));
        set.insert(to_romaji(&forms.to_hiragana));
    }
    set
}

/// Session-lifetime memoization of normalization, transliteration, and term
/// sets, keyed by the raw input string.
///
/// `limit == 0` means unbounded. Otherwise each cache is cleared when it
/// reaches `limit` entries, before the next insert.
pub struct TermCache {
    limit: usize,
    normalized: RwLock<HashMap<String, String>>,
    pinyin: RwLock<HashMap<String, String>>,
    romaji: RwLock<HashMap<String, String>>,
    terms: RwLock<HashMap<String, Arc<SearchTermSet>>>,
}

impl TermCache {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            normalized: RwLock::new(HashMap::new()),
            pinyin: RwLock::new(HashMap::new()),
            romaji: RwLock::new(HashMap::new()),
            terms: RwLock::new(HashMap::new()),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    fn memo<V: Clone>(
        &self,
        cache: &RwLock<HashMap<String, V>>,
        key: &str,
        compute: impl FnOnce() -> V,
    ) -> V {
        if let Some(v) = cache.read().get(key) {
            return v.clone();
        }
        let value = compute();
        let mut guard = cache.write();
        if self.limit > 0 && guard.len() >= self.limit {
            guard.clear();
        }
        guard.insert(key.to_string(), value.clone());
        value
    }

    pub fn normalize(&self, text: &str) -> String {
        self.memo(&self.normalized, text, || normalize(text))
    }

    /// Memoized [`to_pinyin`]. Failed conversions are cached as empty too.
    pub fn pinyin(&self, text: &str) -> String {
        self.memo(&self.pinyin, text, || to_pinyin(text))
    }

    pub fn romaji(&self, text: &str) -> String {
        self.memo(&self.romaji, text, || to_romaji(text))
    }

    /// Memoized [`generate_search_terms`], built from the memoized pieces.
    pub fn search_terms(&self, text: &str) -> Arc<SearchTermSet> {
        self.memo(&self.terms, text, || {
            let mut set = SearchTermSet::default();
            set.insert(self.normalize(text));
            let pinyin = self.pinyin(text);
            set.insert(self.normalize(&pinyin));
            set.insert(self.romaji(text));

            let forms = convert_kana(text);
            set.insert(self.normalize(&forms.to_katakana));
            set.insert(self.normalize(&forms.to_hiragana));

            if contains_kana(text) {
                set.insert(self.romaji(&forms.to_katakana));
                set.insert(self.romaji(&forms.to_hiragana));
            }
            Arc::new(set)
        })
    }

    /// Number of cached term sets.
    pub fn len(&self) -> usize {
        self.terms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.read().is_empty()
    }
}

impl Default for TermCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        generate_search_terms(text)
            .iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_latin_only() {
        assert_eq!(terms("Do Re Mi"), vec!["doremi"]);
        assert_eq!(generate_search_terms("Do Re Mi").len(), 1);
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        assert!(generate_search_terms("").is_empty());
        assert!(generate_search_terms(" - ").is_empty());
    }

    #[test]
    fn test_hiragana_expansion() {
        let set = generate_search_terms("どれみ");
        assert!(set.contains("どれみ"));
        assert!(set.contains("ドレミ"));
        assert!(set.contains("doremi"));
        assert!(!set.contains(""));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_katakana_expansion() {
        let set = generate_search_terms("ドレミ");
        assert!(set.contains("ドレミ"));
        assert!(set.contains("どれみ"));
        assert!(set.contains("doremi"));
    }

    #[test]
    fn test_han_expansion() {
        let set = generate_search_terms("中文");
        assert!(set.contains("中文"));
        assert!(set.contains("zhongwen"));
    }

    #[test]
    fn test_normalized_input_overlaps_raw() {
        for raw in ["Do Re Mi", "【ドレミ】", "中文 Song", "どれみ!"] {
            let norm = normalize(raw);
            let a = generate_search_terms(raw);
            let b = generate_search_terms(&norm);
            assert!(a.contains(&norm), "raw set misses normalized form of {:?}", raw);
            assert!(b.contains(&norm), "normalized set misses itself for {:?}", raw);
        }
    }

    #[test]
    fn test_any_within_is_substring() {
        let q = generate_search_terms("rem");
        let c = generate_search_terms("Doremi");
        assert!(q.any_within(&c));
        assert!(!c.any_within(&q));
    }

    #[test]
    fn test_cache_matches_uncached() {
        let cache = TermCache::unbounded();
        for text in ["どれみ", "Do Re Mi", "中文", "ミク 初音", ""] {
            assert_eq!(*cache.search_terms(text), generate_search_terms(text));
        }
    }

    #[test]
    fn test_cache_memoizes() {
        let cache = TermCache::unbounded();
        let a = cache.search_terms("どれみ");
        let b = cache.search_terms("どれみ");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_limit_clears() {
        let cache = TermCache::new(2);
        cache.search_terms("a");
        cache.search_terms("b");
        assert_eq!(cache.len(), 2);
        cache.search_terms("c");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_conversion_is_cached() {
        use crate::translit::guarded;

        let cache = TermCache::unbounded();
        let failed = cache.memo(&cache.pinyin, "中文", || {
            guarded("pinyin", "中文", || panic!("converter blew up"))
        });
        assert_eq!(failed, "");

        assert_eq!(cache.pinyin("中文"), "");
        let set = cache.search_terms("中文");
        assert!(set.contains("中文"));
        assert!(!set.contains("zhongwen"));
    }
}
