//! Category Index
//!
//! The in-memory view materialized by a search: snippets partitioned by
//! category, each bucket ordered by snippet name. The index is a disposable
//! projection of the store and never the system of record.

use std::collections::{BTreeMap, HashMap};

use crate::models::Snippet;
use crate::models::snippet::normalize_category;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    buckets: BTreeMap<String, BTreeMap<String, Snippet>>,
    /// snippet name -> category of the bucket holding it
    locations: HashMap<String, String>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from search results. A repeated name keeps the last
    /// snippet seen.
    pub fn from_snippets(snippets: impl IntoIterator<Item = Snippet>) -> Self {
        let mut index = Self::new();
        for snippet in snippets {
            index.insert_or_replace(snippet);
        }
        index
    }

    /// Members of `category` ordered by name, empty if the category is absent
    pub fn snippets_in(&self, category: &str) -> Vec<Snippet> {
        self.buckets
            .get(category)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Snippet> {
        let category = self.locations.get(name)?;
        self.buckets.get(category)?.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Places `snippet` in the bucket of its category, first taking any
    /// snippet with the same name out of whichever bucket holds it.
    /// Returns the replaced snippet.
    pub fn insert_or_replace(&mut self, snippet: Snippet) -> Option<Snippet> {
        let previous = self.remove_by_name(&snippet.name);

        self.locations
            .insert(snippet.name.clone(), snippet.category.clone());
        self.buckets
            .entry(snippet.category.clone())
            .or_default()
            .insert(snippet.name.clone(), snippet);

        previous
    }

    pub fn remove(&mut self, snippet: &Snippet) -> Option<Snippet> {
        self.remove_by_name(&snippet.name)
    }

    pub fn remove_by_name(&mut self, name: &str) -> Option<Snippet> {
        let category = self.locations.remove(name)?;
        let bucket = self.buckets.get_mut(&category)?;
        let removed = bucket.remove(name);

        if bucket.is_empty() {
            self.buckets.remove(&category);
        }

        removed
    }

    /// Moves every member of `old_name` into `new_name`, merging with any
    /// members `new_name` already has. Returns the moved snippets with their
    /// category rewritten.
    pub fn rename_category(&mut self, old_name: &str, new_name: &str) -> Vec<Snippet> {
        let new_name = normalize_category(new_name);
        if old_name == new_name {
            return Vec::new();
        }

        let Some(bucket) = self.buckets.remove(old_name) else {
            return Vec::new();
        };

        let target = self.buckets.entry(new_name.clone()).or_default();
        let mut moved = Vec::with_capacity(bucket.len());

        for (name, mut snippet) in bucket {
            snippet.set_category(&new_name);
            self.locations.insert(name.clone(), snippet.category.clone());
            moved.push(snippet.clone());
            target.insert(name, snippet);
        }

        moved
    }

    /// Drops the bucket for `category` and returns its members
    pub fn remove_category(&mut self, category: &str) -> Vec<Snippet> {
        let Some(bucket) = self.buckets.remove(category) else {
            return Vec::new();
        };

        bucket
            .into_values()
            .inspect(|snippet| {
                self.locations.remove(&snippet.name);
            })
            .collect()
    }

    /// Sets `syntax` on every member of `category` except the one named
    /// `excluded`. Returns the snippets that changed.
    pub fn set_syntax(
        &mut self,
        category: &str,
        syntax: &str,
        excluded: Option<&str>,
    ) -> Vec<Snippet> {
        let Some(bucket) = self.buckets.get_mut(category) else {
            return Vec::new();
        };

        bucket
            .values_mut()
            .filter(|snippet| Some(snippet.name.as_str()) != excluded)
            .map(|snippet| {
                snippet.set_syntax(syntax);
                snippet.clone()
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.locations.len()
    }

    pub fn count_categories(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(name: &str, category: &str) -> Snippet {
        Snippet::new(name, category)
    }

    fn names(snippets: &[Snippet]) -> Vec<&str> {
        snippets.iter().map(|s| s.name.as_str()).collect()
    }

    fn assert_consistent(index: &CategoryIndex) {
        let mut total = 0;
        for category in index.categories() {
            let members = index.snippets_in(&category);
            assert!(!members.is_empty(), "empty bucket {category}");
            assert!(members.windows(2).all(|w| w[0].name < w[1].name));
            for member in &members {
                assert_eq!(member.category, category);
                assert_eq!(index.get(&member.name), Some(member));
            }
            total += members.len();
        }
        assert_eq!(total, index.count());
    }

    #[test]
    fn test_buckets_stay_sorted_without_duplicates() {
        let mut index = CategoryIndex::new();
        index.insert_or_replace(snippet("b", "X"));
        index.insert_or_replace(snippet("a", "X"));
        index.insert_or_replace(snippet("C", "X"));
        index.insert_or_replace(snippet("a", "X"));
        index.insert_or_replace(snippet("d", "Y"));
        index.remove(&snippet("b", "X"));
        index.insert_or_replace(snippet("b", "X"));
        index.remove_by_name("missing");

        assert_eq!(names(&index.snippets_in("X")), vec!["C", "a", "b"]);
        assert_eq!(index.count(), 4);
        assert_consistent(&index);
    }

    #[test]
    fn test_random_insert_move_remove_sequences() {
        const NAMES: [&str; 8] = ["a", "B", "c", "dd", "D", "e1", "e10", "z"];
        const CATEGORIES: [&str; 4] = ["X", "Y", "Z", ""];

        for seed in 0..50u64 {
            let mut rng = oorandom::Rand32::new(seed);
            let mut index = CategoryIndex::new();
            let mut expected: BTreeMap<String, String> = BTreeMap::new();

            for _ in 0..200 {
                let name = NAMES[rng.rand_range(0..NAMES.len() as u32) as usize];
                match rng.rand_range(0..3) {
                    0 | 1 => {
                        let category =
                            CATEGORIES[rng.rand_range(0..CATEGORIES.len() as u32) as usize];
                        let added = snippet(name, category);
                        expected.insert(name.to_string(), added.category.clone());
                        index.insert_or_replace(added);
                    }
                    _ => {
                        let removed = index.remove_by_name(name);
                        assert_eq!(removed.is_some(), expected.remove(name).is_some());
                    }
                }

                assert_consistent(&index);
                assert_eq!(index.count(), expected.len());
                for (name, category) in &expected {
                    assert_eq!(index.get(name).map(|s| s.category.as_str()), Some(category.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_insert_moves_between_categories() {
        let mut index = CategoryIndex::from_snippets([snippet("a", "X"), snippet("b", "X")]);
        let previous = index.insert_or_replace(snippet("a", "Y"));

        assert_eq!(previous.map(|s| s.category), Some("X".to_string()));
        assert_eq!(names(&index.snippets_in("X")), vec!["b"]);
        assert_eq!(names(&index.snippets_in("Y")), vec!["a"]);
        assert_consistent(&index);
    }

    #[test]
    fn test_removal_prunes_empty_bucket() {
        let mut index = CategoryIndex::from_snippets([snippet("a", "X"), snippet("b", "Y")]);
        index.remove(&snippet("a", "X"));

        assert_eq!(index.categories(), vec!["Y"]);
        assert!(index.snippets_in("X").is_empty());
        assert_eq!(index.count_categories(), 1);
    }

    #[test]
    fn test_rename_merges_into_existing_bucket() {
        let mut index = CategoryIndex::from_snippets([
            snippet("c", "A"),
            snippet("a", "A"),
            snippet("b", "B"),
        ]);
        let moved = index.rename_category("A", "B");

        assert_eq!(names(&moved), vec!["a", "c"]);
        assert!(moved.iter().all(|s| s.category == "B"));
        assert_eq!(index.categories(), vec!["B"]);
        assert_eq!(names(&index.snippets_in("B")), vec!["a", "b", "c"]);
        assert_consistent(&index);
    }

    #[test]
    fn test_rename_to_new_category() {
        let mut index = CategoryIndex::from_snippets([snippet("a", "A")]);
        index.rename_category("A", "Z");

        assert_eq!(index.categories(), vec!["Z"]);
        assert_eq!(names(&index.snippets_in("Z")), vec!["a"]);
        assert!(index.rename_category("missing", "Z").is_empty());
        assert!(index.rename_category("Z", "Z").is_empty());
        assert_consistent(&index);
    }

    #[test]
    fn test_remove_category_returns_members() {
        let mut index = CategoryIndex::from_snippets([
            snippet("a", "A"),
            snippet("b", "A"),
            snippet("c", "C"),
        ]);
        let removed = index.remove_category("A");

        assert_eq!(names(&removed), vec!["a", "b"]);
        assert!(!index.contains("a"));
        assert_eq!(index.count(), 1);
        assert!(index.remove_category("A").is_empty());
        assert_consistent(&index);
    }

    #[test]
    fn test_set_syntax_skips_excluded() {
        let mut index = CategoryIndex::from_snippets([
            snippet("a", "A"),
            snippet("b", "A"),
            snippet("c", "C"),
        ]);
        let changed = index.set_syntax("A", "Rust", Some("a"));

        assert_eq!(names(&changed), vec!["b"]);
        assert_eq!(index.get("b").map(|s| s.syntax.as_str()), Some("Rust"));
        assert_ne!(index.get("a").map(|s| s.syntax.as_str()), Some("Rust"));
        assert_ne!(index.get("c").map(|s| s.syntax.as_str()), Some("Rust"));
    }
}
