//! Snippet Store
//!
//! The durable record of every snippet. The dispatcher only talks to the
//! store through [`SnippetStore`]; [`JsonSnippetStore`] is the implementation
//! used by the binary, keeping all snippets in a name-ordered map and writing
//! the whole database back to disk after every mutation.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};

use crate::models::storage::SnippetDatabase;
use crate::models::tags::reconcile_tags;
use crate::models::snippet::{normalize_category, sort_categories};
use crate::models::{Snippet, StorageManager};

/// Fields a keyword search can look into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchField {
    Code,
    Name,
    Comment,
    Tags,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Code,
        SearchField::Name,
        SearchField::Comment,
        SearchField::Tags,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "code" => Some(SearchField::Code),
            "name" => Some(SearchField::Name),
            "comment" | "comments" => Some(SearchField::Comment),
            "tag" | "tags" => Some(SearchField::Tags),
            _ => None,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchField::Code => "code",
            SearchField::Name => "name",
            SearchField::Comment => "comment",
            SearchField::Tags => "tags",
        };
        f.write_str(name)
    }
}

/// How keywords and fields are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Matching {
    #[default]
    Exact,
    /// Uppercases the field before comparing. Keywords are expected to be
    /// uppercased by the caller already.
    FoldField,
}

/// Durable CRUD and search over snippets keyed by unique name
pub trait SnippetStore {
    /// Distinct categories, alphabetical, with the uncategorized sentinel last
    fn categories(&self) -> Result<Vec<String>>;

    fn snippets_by_category(&self, category: &str) -> Result<Vec<Snippet>>;

    fn snippet(&self, name: &str) -> Result<Option<Snippet>>;

    fn insert(&mut self, snippet: Snippet) -> Result<()>;

    /// Replaces the record stored under `old.name` with `new`, reconciling
    /// the persisted tag list against `new.tags`
    fn update(&mut self, old: &Snippet, new: &Snippet) -> Result<()>;

    fn remove(&mut self, snippet: &Snippet) -> Result<()>;

    fn remove_batch(&mut self, snippets: &[Snippet]) -> Result<()>;

    fn set_category(&mut self, snippets: &[Snippet], category: &str) -> Result<()>;

    fn set_syntax(&mut self, snippets: &[Snippet], syntax: &str) -> Result<()>;

    fn set_locked(&mut self, name: &str, locked: bool) -> Result<()>;

    /// Snippets whose `field` contains any of `keywords`
    fn search_field(
        &self,
        field: SearchField,
        keywords: &[String],
        matching: Matching,
    ) -> Result<Vec<Snippet>>;

    fn count_snippets(&self) -> Result<usize>;
}

/// File-backed snippet store
#[derive(Debug, Default)]
pub struct JsonSnippetStore {
    snippets: BTreeMap<String, Snippet>,
    storage: Option<StorageManager>,
}

impl JsonSnippetStore {
    /// Opens the database managed by `storage`, creating it on first save
    pub fn open(storage: StorageManager) -> Result<Self> {
        let database = storage.load_database()?;
        let snippets = keyed_by_name(database.snippets);

        log::info!(
            "Loaded {} snippets from {}",
            snippets.len(),
            storage.database_path().display()
        );

        Ok(Self {
            snippets,
            storage: Some(storage),
        })
    }

    /// Store that never touches the disk
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_snippets(snippets: impl IntoIterator<Item = Snippet>) -> Self {
        Self {
            snippets: keyed_by_name(snippets),
            storage: None,
        }
    }

    /// Writes `next` to disk and only then makes it the current state. A
    /// failed write leaves the store as it was.
    fn commit(&mut self, next: BTreeMap<String, Snippet>) -> Result<()> {
        if let Some(storage) = &self.storage {
            let database = SnippetDatabase {
                snippets: next.values().cloned().collect(),
                ..SnippetDatabase::default()
            };
            storage.save_database(&database)?;
        }

        self.snippets = next;
        Ok(())
    }

    fn update_each<F>(&mut self, snippets: &[Snippet], mut apply: F) -> Result<()>
    where
        F: FnMut(&mut Snippet),
    {
        let mut next = self.snippets.clone();
        let mut touched = 0;
        for target in snippets {
            if let Some(stored) = next.get_mut(&target.name) {
                apply(stored);
                touched += 1;
            }
        }

        if touched == 0 {
            return Ok(());
        }
        self.commit(next)
    }
}

fn keyed_by_name(snippets: impl IntoIterator<Item = Snippet>) -> BTreeMap<String, Snippet> {
    snippets
        .into_iter()
        .map(|mut snippet| {
            snippet.category = normalize_category(&snippet.category);
            (snippet.name.clone(), snippet)
        })
        .collect()
}

fn field_matches(snippet: &Snippet, field: SearchField, keyword: &str, matching: Matching) -> bool {
    let contains = |text: &str| match matching {
        Matching::Exact => text.contains(keyword),
        Matching::FoldField => text.to_uppercase().contains(keyword),
    };

    match field {
        SearchField::Code => contains(snippet.code.as_str()),
        SearchField::Name => contains(snippet.name.as_str()),
        SearchField::Comment => contains(snippet.comment.as_str()),
        SearchField::Tags => snippet.tags.iter().any(|tag| contains(tag.as_str())),
    }
}

impl SnippetStore for JsonSnippetStore {
    fn categories(&self) -> Result<Vec<String>> {
        let mut categories: Vec<String> = self
            .snippets
            .values()
            .map(|s| s.category.clone())
            .collect();
        sort_categories(&mut categories);
        Ok(categories)
    }

    fn snippets_by_category(&self, category: &str) -> Result<Vec<Snippet>> {
        Ok(self
            .snippets
            .values()
            .filter(|s| s.category == category)
            .cloned()
            .collect())
    }

    fn snippet(&self, name: &str) -> Result<Option<Snippet>> {
        Ok(self.snippets.get(name).cloned())
    }

    fn insert(&mut self, mut snippet: Snippet) -> Result<()> {
        if self.snippets.contains_key(&snippet.name) {
            bail!("A snippet named '{}' already exists", snippet.name);
        }

        snippet.category = normalize_category(&snippet.category);
        let mut next = self.snippets.clone();
        next.insert(snippet.name.clone(), snippet);
        self.commit(next)
    }

    fn update(&mut self, old: &Snippet, new: &Snippet) -> Result<()> {
        if old.name != new.name && self.snippets.contains_key(&new.name) {
            bail!("A snippet named '{}' already exists", new.name);
        }

        let mut next = self.snippets.clone();
        let Some(mut stored) = next.remove(&old.name) else {
            return Ok(());
        };

        let mut tags = std::mem::take(&mut stored.tags);
        reconcile_tags(&mut tags, &new.tags);

        let mut merged = new.clone();
        merged.tags = tags;
        merged.category = normalize_category(&merged.category);
        merged.created_at = stored.created_at;
        merged.touch();

        next.insert(merged.name.clone(), merged);
        self.commit(next)
    }

    fn remove(&mut self, snippet: &Snippet) -> Result<()> {
        if !self.snippets.contains_key(&snippet.name) {
            return Ok(());
        }

        let mut next = self.snippets.clone();
        next.remove(&snippet.name);
        self.commit(next)
    }

    fn remove_batch(&mut self, snippets: &[Snippet]) -> Result<()> {
        let mut next = self.snippets.clone();
        for snippet in snippets {
            next.remove(&snippet.name);
        }

        if next.len() == self.snippets.len() {
            return Ok(());
        }
        self.commit(next)
    }

    fn set_category(&mut self, snippets: &[Snippet], category: &str) -> Result<()> {
        self.update_each(snippets, |s| s.set_category(category))
    }

    fn set_syntax(&mut self, snippets: &[Snippet], syntax: &str) -> Result<()> {
        self.update_each(snippets, |s| s.set_syntax(syntax))
    }

    fn set_locked(&mut self, name: &str, locked: bool) -> Result<()> {
        match self.snippets.get(name) {
            Some(stored) if stored.locked != locked => {
                let mut next = self.snippets.clone();
                if let Some(stored) = next.get_mut(name) {
                    stored.set_locked(locked);
                }
                self.commit(next)
            }
            _ => Ok(()),
        }
    }

    fn search_field(
        &self,
        field: SearchField,
        keywords: &[String],
        matching: Matching,
    ) -> Result<Vec<Snippet>> {
        Ok(self
            .snippets
            .values()
            .filter(|s| {
                keywords
                    .iter()
                    .any(|keyword| field_matches(s, field, keyword, matching))
            })
            .cloned()
            .collect())
    }

    fn count_snippets(&self) -> Result<usize> {
        Ok(self.snippets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNCATEGORIZED;
    use tempfile::tempdir;

    fn sample_store() -> JsonSnippetStore {
        JsonSnippetStore::from_snippets([
            Snippet::new("Foo.java", "Java")
                .with_code("class Foo {}")
                .with_tags(["oop"]),
            Snippet::new("bar.py", "Python").with_comment("prints bar"),
            Snippet::new("misc.txt", ""),
        ])
    }

    #[test]
    fn test_categories_put_uncategorized_last() {
        let store = sample_store();
        assert_eq!(
            store.categories().unwrap(),
            vec!["Java", "Python", UNCATEGORIZED]
        );
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let mut store = sample_store();
        assert!(store.insert(Snippet::new("bar.py", "Other")).is_err());
        assert_eq!(store.count_snippets().unwrap(), 3);
    }

    #[test]
    fn test_update_reconciles_tags() {
        let mut store = JsonSnippetStore::in_memory();
        let old = Snippet::new("s", "A").with_tags(["t1", "t2"]);
        store.insert(old.clone()).unwrap();

        let new = old.clone().with_tags(["t2", "t3"]);
        store.update(&old, &new).unwrap();

        let stored = store.snippet("s").unwrap().unwrap();
        assert_eq!(stored.tags, vec!["t2", "t3"]);
    }

    #[test]
    fn test_update_can_rename_to_free_name() {
        let mut store = sample_store();
        let old = store.snippet("bar.py").unwrap().unwrap();
        let mut new = old.clone();
        new.name = "baz.py".to_string();
        store.update(&old, &new).unwrap();

        assert!(store.snippet("bar.py").unwrap().is_none());
        assert_eq!(store.snippet("baz.py").unwrap().unwrap().created_at, old.created_at);

        let taken = store.snippet("Foo.java").unwrap().unwrap();
        let mut clash = new.clone();
        clash.name = taken.name.clone();
        assert!(store.update(&new, &clash).is_err());
    }

    #[test]
    fn test_search_field_tags_only_looks_at_own_tags() {
        let store = sample_store();
        let hits = store
            .search_field(SearchField::Tags, &["oop".to_string()], Matching::Exact)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Foo.java");
    }

    #[test]
    fn test_search_field_fold() {
        let store = sample_store();
        let keywords = vec!["FOO".to_string()];
        assert!(
            store
                .search_field(SearchField::Name, &keywords, Matching::Exact)
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            store
                .search_field(SearchField::Name, &keywords, Matching::FoldField)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = tempdir().unwrap();
        let storage = StorageManager::with_data_dir(temp.path()).unwrap();

        let mut store = JsonSnippetStore::open(storage.clone()).unwrap();
        store
            .insert(Snippet::new("hello.rs", "Rust").with_code("fn main() {}"))
            .unwrap();
        store.set_locked("hello.rs", true).unwrap();

        let reopened = JsonSnippetStore::open(storage).unwrap();
        let snippet = reopened.snippet("hello.rs").unwrap().unwrap();
        assert!(snippet.locked);
        assert_eq!(snippet.code, "fn main() {}");
    }

    #[test]
    fn test_from_snippets_normalizes_categories() {
        let store = JsonSnippetStore::from_snippets([Snippet {
            category: "  ".to_string(),
            ..Snippet::new("blank.txt", "Misc")
        }]);
        assert_eq!(store.categories().unwrap(), vec![UNCATEGORIZED]);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let temp = tempdir().unwrap();
        let data_dir = temp.path().join("data");
        let storage = StorageManager::with_data_dir(&data_dir).unwrap();

        let mut store = JsonSnippetStore::open(storage).unwrap();
        store.insert(Snippet::new("foo.rs", "Rust")).unwrap();
        store.insert(Snippet::new("food.rs", "Rust")).unwrap();
        let foo = store.snippet("foo.rs").unwrap().unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        assert!(store.remove(&foo).is_err());
        assert!(store.remove_batch(&[foo.clone()]).is_err());
        assert!(store.insert(Snippet::new("bar.rs", "Rust")).is_err());
        assert!(store.set_category(&[foo.clone()], "Other").is_err());
        assert!(store.set_locked("foo.rs", true).is_err());

        let mut renamed = foo.clone();
        renamed.name = "baz.rs".to_string();
        assert!(store.update(&foo, &renamed).is_err());

        assert_eq!(store.count_snippets().unwrap(), 2);
        assert_eq!(store.snippet("foo.rs").unwrap(), Some(foo));
        assert!(store.snippet("bar.rs").unwrap().is_none());
    }
}
