use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::index::CategoryIndex;
use crate::models::Snippet;
use crate::store::{Matching, SearchField, SnippetStore};

const MAX_RECENT_SEARCHES: usize = 20;

/// A quoted phrase or a run of characters that are neither whitespace nor commas
static KEYWORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"|([^\s,"]+)"#).expect("keyword pattern is valid"));

/// What gets uppercased when a search is case-insensitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseFolding {
    /// Keywords and the compared field are both uppercased
    #[default]
    Both,
    /// Only the keywords are uppercased. A lower-case field can then never
    /// match a case-insensitive search.
    KeywordsOnly,
}

/// Which snippet fields a search looks into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    pub code: bool,
    pub name: bool,
    pub comment: bool,
    pub tags: bool,
}

impl Default for FieldMask {
    fn default() -> Self {
        Self::all()
    }
}

impl FieldMask {
    pub fn all() -> Self {
        Self {
            code: true,
            name: true,
            comment: true,
            tags: true,
        }
    }

    pub fn none() -> Self {
        Self {
            code: false,
            name: false,
            comment: false,
            tags: false,
        }
    }

    #[cfg(test)]
    pub fn only(fields: &[SearchField]) -> Self {
        let mut mask = Self::none();
        for field in fields {
            mask.set(*field, true);
        }
        mask
    }

    /// Parses a list such as `"name,tags"`. Unknown field names are rejected.
    pub fn parse(list: &str) -> Result<Self> {
        let mut mask = Self::none();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let field = SearchField::from_name(part)
                .ok_or_else(|| IndexError::invalid(format!("unknown search field '{part}'")))?;
            mask.set(field, true);
        }
        Ok(mask)
    }

    pub fn set(&mut self, field: SearchField, enabled: bool) {
        match field {
            SearchField::Code => self.code = enabled,
            SearchField::Name => self.name = enabled,
            SearchField::Comment => self.comment = enabled,
            SearchField::Tags => self.tags = enabled,
        }
    }

    pub fn is_enabled(&self, field: SearchField) -> bool {
        match field {
            SearchField::Code => self.code,
            SearchField::Name => self.name,
            SearchField::Comment => self.comment,
            SearchField::Tags => self.tags,
        }
    }

    pub fn enabled(&self) -> Vec<SearchField> {
        SearchField::ALL
            .into_iter()
            .filter(|field| self.is_enabled(*field))
            .collect()
    }
}

/// A keyword search over one or more snippet fields
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub fields: FieldMask,
    pub case_sensitive: bool,
    pub folding: CaseFolding,
}

impl SearchQuery {
    pub fn new<I, T>(keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            fields: FieldMask::all(),
            case_sensitive: false,
            folding: CaseFolding::default(),
        }
    }

    pub fn fields(mut self, fields: FieldMask) -> Self {
        self.fields = fields;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn folding(mut self, folding: CaseFolding) -> Self {
        self.folding = folding;
        self
    }

    /// Keywords joined back into a single display string
    pub fn display(&self) -> String {
        self.keywords
            .iter()
            .map(|k| {
                if k.chars().any(|c| c.is_whitespace() || c == ',') {
                    format!("\"{k}\"")
                } else {
                    k.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Query-local keywords: blanks dropped and, for a case-insensitive
    /// search, uppercased. The caller's keywords are left untouched.
    fn normalized_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| {
                if self.case_sensitive {
                    k.clone()
                } else {
                    k.to_uppercase()
                }
            })
            .collect()
    }

    fn matching(&self) -> Matching {
        match (self.case_sensitive, self.folding) {
            (false, CaseFolding::Both) => Matching::FoldField,
            _ => Matching::Exact,
        }
    }
}

/// Splits raw user input into keywords. Double-quoted phrases stay whole.
pub fn parse_keywords(input: &str) -> Vec<String> {
    KEYWORD_PATTERN
        .captures_iter(input)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|k| !k.trim().is_empty())
        .collect()
}

/// Runs `query` against the store and materializes the matches into a fresh
/// Category Index. Only reads from the store.
pub fn search<S: SnippetStore + ?Sized>(store: &S, query: &SearchQuery) -> Result<CategoryIndex> {
    let keywords = query.normalized_keywords();
    if keywords.is_empty() {
        return Err(IndexError::invalid("no keywords to search for"));
    }

    let fields = query.fields.enabled();
    if fields.is_empty() {
        return Err(IndexError::invalid("no search field is enabled"));
    }

    let matching = query.matching();
    let mut matches: BTreeMap<String, Snippet> = BTreeMap::new();

    for field in fields {
        let hits = store.search_field(field, &keywords, matching)?;
        log::debug!("Search field {} matched {} snippets", field, hits.len());
        for snippet in hits {
            matches.entry(snippet.name.clone()).or_insert(snippet);
        }
    }

    log::info!(
        "Search for '{}' found {} snippets",
        query.display(),
        matches.len()
    );

    Ok(CategoryIndex::from_snippets(matches.into_values()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentSearchEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

impl RecentSearchEntry {
    pub fn new(query: String, result_count: usize) -> Self {
        Self {
            query,
            timestamp: Utc::now(),
            result_count,
        }
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Most recent searches first, without repeated queries
#[derive(Debug, Clone, Default)]
pub struct RecentSearches {
    entries: Vec<RecentSearchEntry>,
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a search query to the front of the list. Empty queries are ignored.
    pub fn record(&mut self, query: &str, result_count: usize) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.entries.retain(|entry| entry.query != query);
        self.entries
            .insert(0, RecentSearchEntry::new(query.to_string(), result_count));
        self.entries.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn entries(&self) -> &[RecentSearchEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonSnippetStore;

    fn sample_store() -> JsonSnippetStore {
        JsonSnippetStore::from_snippets([
            Snippet::new("Foo.java", "A").with_code("public class Foo {}"),
            Snippet::new("bar.py", "B")
                .with_code("print('bar')")
                .with_tags(["script"]),
            Snippet::new("QUUX.sh", "B").with_comment("prints QUUX"),
        ])
    }

    fn names(index: &CategoryIndex, category: &str) -> Vec<String> {
        index
            .snippets_in(category)
            .into_iter()
            .map(|s| s.name)
            .collect()
    }

    #[test]
    fn test_case_insensitive_name_search() {
        let store = sample_store();
        let query = SearchQuery::new(["foo"]).fields(FieldMask::only(&[SearchField::Name]));
        let index = search(&store, &query).unwrap();

        assert_eq!(index.categories(), vec!["A"]);
        assert_eq!(names(&index, "A"), vec!["Foo.java"]);
        assert_eq!(query.keywords, vec!["foo"]);
    }

    #[test]
    fn test_keywords_only_folding_misses_mixed_case_fields() {
        let store = sample_store();
        let query = SearchQuery::new(["foo"])
            .fields(FieldMask::only(&[SearchField::Name]))
            .folding(CaseFolding::KeywordsOnly);
        assert!(search(&store, &query).unwrap().is_empty());

        // An already uppercase field still matches under the reference folding
        let query = SearchQuery::new(["quux"])
            .fields(FieldMask::only(&[SearchField::Name]))
            .folding(CaseFolding::KeywordsOnly);
        assert_eq!(names(&search(&store, &query).unwrap(), "B"), vec!["QUUX.sh"]);
    }

    #[test]
    fn test_case_sensitive_search() {
        let store = sample_store();
        let fields = FieldMask::only(&[SearchField::Name]);
        let lower = SearchQuery::new(["foo"]).fields(fields).case_sensitive(true);
        assert!(search(&store, &lower).unwrap().is_empty());

        let exact = SearchQuery::new(["Foo"]).fields(fields).case_sensitive(true);
        assert_eq!(search(&store, &exact).unwrap().count(), 1);
    }

    #[test]
    fn test_any_field_and_any_keyword_matches_once() {
        let store = sample_store();
        let query = SearchQuery::new(["bar", "script", "quux"]);
        let index = search(&store, &query).unwrap();

        assert_eq!(index.count(), 2);
        assert_eq!(names(&index, "B"), vec!["QUUX.sh", "bar.py"]);
    }

    #[test]
    fn test_tag_search_only_matches_own_tags() {
        let store = sample_store();
        let query = SearchQuery::new(["script"]).fields(FieldMask::only(&[SearchField::Tags]));
        let index = search(&store, &query).unwrap();
        assert_eq!(index.count(), 1);
        assert!(index.contains("bar.py"));
    }

    #[test]
    fn test_rejects_empty_keywords_and_fields() {
        let store = sample_store();
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            search(&store, &SearchQuery::new(empty)),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            search(&store, &SearchQuery::new(["  "])),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            search(&store, &SearchQuery::new(["foo"]).fields(FieldMask::none())),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_keywords(r#"foo, bar  "hello world" baz"#),
            vec!["foo", "bar", "hello world", "baz"]
        );
        assert!(parse_keywords(" , ").is_empty());
    }

    #[test]
    fn test_field_mask_parse() {
        let mask = FieldMask::parse("name, tags").unwrap();
        assert_eq!(mask.enabled(), vec![SearchField::Name, SearchField::Tags]);
        assert!(FieldMask::parse("title").is_err());
    }

    #[test]
    fn test_recent_searches_dedup_and_limit() {
        let mut recent = RecentSearches::new();
        for i in 0..25 {
            recent.record(&format!("query {i}"), i);
        }
        recent.record("query 10", 1);
        recent.record("   ", 0);

        assert_eq!(recent.entries().len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent.entries()[0].query, "query 10");
        assert_eq!(
            recent
                .entries()
                .iter()
                .filter(|e| e.query == "query 10")
                .count(),
            1
        );
    }
}
