//! Query matching over the alias table.
//!
//! A query matches a resource when any term generated from the query is a
//! substring of any term generated from the resource key or one of its
//! aliases. There is no scoring: [`Matcher::filter_keys`] keeps table order.

use crate::models::AliasTable;
use crate::terms::{SearchTermSet, TermCache};

/// Matching service. Owns the term caches for the session, so one instance
/// should be shared for all queries against the same table.
#[derive(Default)]
pub struct Matcher {
    cache: TermCache,
}

impl Matcher {
    pub fn new(cache_limit: usize) -> Self {
        Self {
            cache: TermCache::new(cache_limit),
        }
    }

    pub fn cache(&self) -> &TermCache {
        &self.cache
    }

    /// Does `query` match the candidate identified by `key` and `aliases`?
    ///
    /// Always false for a query that normalizes to the empty string.
    pub fn matches<S: AsRef<str>>(&self, query: &str, key: &str, aliases: &[S]) -> bool {
        if self.cache.normalize(query).is_empty() {
            return false;
        }
        let query_terms = self.cache.search_terms(query);

        let mut candidate = SearchTermSet::default();
        candidate.extend(&self.cache.search_terms(key));
        for alias in aliases {
            candidate.extend(&self.cache.search_terms(alias.as_ref()));
        }
        query_terms.any_within(&candidate)
    }

    /// Keys of `table` matched by `query`, in table order.
    pub fn filter_keys<'a>(&self, query: &str, table: &'a AliasTable) -> Vec<&'a str> {
        if self.cache.normalize(query).is_empty() {
            return Vec::new();
        }
        table
            .iter()
            .filter(|(key, entry)| self.matches(query, key, entry.alias.as_slice()))
            .map(|(key, _)| key)
            .collect()
    }
}
