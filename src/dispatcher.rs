//! Mode Dispatcher
//!
//! Routes every read and write either to the snippet store (browse mode) or
//! to the Category Index produced by the last search (search mode). In
//! search mode each mutation is applied to the index and then mirrored into
//! the store within the same call; if the store rejects the write the index
//! change is undone so the overlay never holds state the store lacks.

use crate::error::{IndexError, Result};
use crate::index::CategoryIndex;
use crate::models::snippet::normalize_category;
use crate::models::{Snippet, UNCATEGORIZED};
use crate::search::{self, SearchQuery};
use crate::store::SnippetStore;

/// The two dispatcher states. The index only exists while searching.
#[derive(Debug, Default)]
pub enum Mode {
    #[default]
    Browse,
    Searching(CategoryIndex),
}

impl Mode {
    pub fn is_searching(&self) -> bool {
        matches!(self, Mode::Searching(_))
    }
}

/// Owns the store and the current mode. One instance per application,
/// passed to whatever front end drives it.
#[derive(Debug)]
pub struct Dispatcher<S: SnippetStore> {
    store: S,
    mode: Mode,
}

impl<S: SnippetStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mode: Mode::Browse,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_search_active(&self) -> bool {
        self.mode.is_searching()
    }

    pub fn active_index(&self) -> Option<&CategoryIndex> {
        match &self.mode {
            Mode::Searching(index) => Some(index),
            Mode::Browse => None,
        }
    }

    /// Enters search mode with `index` as the overlay, replacing any
    /// previous result set
    pub fn set_active_result_set(&mut self, index: CategoryIndex) {
        log::info!(
            "Search mode active: {} snippets in {} categories",
            index.count(),
            index.count_categories()
        );
        self.mode = Mode::Searching(index);
    }

    /// Runs `query` against the store and activates its result set.
    /// Returns the number of matches. On error the current mode is left as
    /// it was.
    pub fn search(&mut self, query: &SearchQuery) -> Result<usize> {
        let index = search::search(&self.store, query)?;
        let found = index.count();
        self.set_active_result_set(index);
        Ok(found)
    }

    /// Drops the overlay and goes back to browse mode
    pub fn clear_search(&mut self) {
        if self.is_search_active() {
            log::info!("Search cleared, back to browse mode");
        }
        self.mode = Mode::Browse;
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        match &self.mode {
            Mode::Searching(index) => Ok(index.categories()),
            Mode::Browse => Ok(self.store.categories()?),
        }
    }

    /// Every category in the store, whatever the mode
    pub fn all_categories(&self) -> Result<Vec<String>> {
        Ok(self.store.categories()?)
    }

    pub fn snippets_in(&self, category: &str) -> Result<Vec<Snippet>> {
        match &self.mode {
            Mode::Searching(index) => Ok(index.snippets_in(category)),
            Mode::Browse => Ok(self.store.snippets_by_category(category)?),
        }
    }

    pub fn get_snippet(&self, name: &str) -> Result<Option<Snippet>> {
        Ok(self.store.snippet(name)?)
    }

    pub fn category_of(&self, name: &str) -> Result<Option<String>> {
        Ok(self.store.snippet(name)?.map(|s| s.category))
    }

    /// Adds a new snippet to the store. The search overlay is not touched:
    /// it only ever shows search results.
    pub fn insert_snippet(&mut self, snippet: Snippet) -> Result<()> {
        if self.store.snippet(&snippet.name)?.is_some() {
            return Err(IndexError::invalid(format!(
                "a snippet named '{}' already exists",
                snippet.name
            )));
        }

        log::debug!("Inserting snippet '{}'", snippet.name);
        self.store.insert(snippet)?;
        Ok(())
    }

    pub fn lock_snippet(&mut self, name: &str, locked: bool) -> Result<()> {
        self.store.set_locked(name, locked)?;

        if let Mode::Searching(index) = &mut self.mode {
            if let Some(mut snippet) = index.get(name).cloned() {
                snippet.set_locked(locked);
                index.insert_or_replace(snippet);
            }
        }
        Ok(())
    }

    pub fn remove_snippet(&mut self, snippet: &Snippet) -> Result<()> {
        match &mut self.mode {
            Mode::Searching(index) => {
                let Some(removed) = index.remove(snippet) else {
                    return Ok(());
                };

                log::debug!("Removing snippet '{}' from results and store", removed.name);
                if let Err(err) = self.store.remove(&removed) {
                    log::warn!("Store rejected removal of '{}', restoring", removed.name);
                    index.insert_or_replace(removed);
                    return Err(err.into());
                }
                Ok(())
            }
            Mode::Browse => {
                log::debug!("Removing snippet '{}' from store", snippet.name);
                self.store.remove(snippet)?;
                Ok(())
            }
        }
    }

    pub fn update_snippet(&mut self, old: &Snippet, new: &Snippet) -> Result<()> {
        let mut new = new.clone();
        new.category = normalize_category(&new.category);

        if old.name != new.name && self.store.snippet(&new.name)?.is_some() {
            return Err(IndexError::invalid(format!(
                "a snippet named '{}' already exists",
                new.name
            )));
        }

        match &mut self.mode {
            Mode::Searching(index) => {
                let previous = index.remove(old);
                index.insert_or_replace(new.clone());

                log::debug!("Updating snippet '{}' in results and store", old.name);
                if let Err(err) = self.store.update(old, &new) {
                    log::warn!("Store rejected update of '{}', restoring", old.name);
                    index.remove(&new);
                    if let Some(previous) = previous {
                        index.insert_or_replace(previous);
                    }
                    return Err(err.into());
                }

                // keep the overlay identical to what the store now holds
                if let Some(stored) = self.store.snippet(&new.name)? {
                    index.insert_or_replace(stored);
                }
                Ok(())
            }
            Mode::Browse => {
                log::debug!("Updating snippet '{}' in store", old.name);
                self.store.update(old, &new)?;
                Ok(())
            }
        }
    }

    /// Search mode deletes every member of the category from the store.
    /// Browse mode only moves the members to the uncategorized sentinel.
    pub fn remove_category(&mut self, name: &str) -> Result<()> {
        match &mut self.mode {
            Mode::Searching(index) => {
                let removed = index.remove_category(name);
                if removed.is_empty() {
                    return Ok(());
                }

                log::debug!(
                    "Deleting {} snippets of category '{}' from results and store",
                    removed.len(),
                    name
                );
                if let Err(err) = self.store.remove_batch(&removed) {
                    log::warn!("Store rejected deletion of category '{}', restoring", name);
                    for snippet in removed {
                        index.insert_or_replace(snippet);
                    }
                    return Err(err.into());
                }
                Ok(())
            }
            Mode::Browse => {
                if name == UNCATEGORIZED {
                    return Ok(());
                }

                let members = self.store.snippets_by_category(name)?;
                log::debug!(
                    "Moving {} snippets of category '{}' to {}",
                    members.len(),
                    name,
                    UNCATEGORIZED
                );
                self.store.set_category(&members, UNCATEGORIZED)?;
                Ok(())
            }
        }
    }

    pub fn rename_category(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = normalize_category(new_name);

        match &mut self.mode {
            Mode::Searching(index) => {
                let before = index.snippets_in(old_name);
                let moved = index.rename_category(old_name, &new_name);
                if moved.is_empty() {
                    return Ok(());
                }

                log::debug!(
                    "Renaming category '{}' to '{}' for {} snippets in results and store",
                    old_name,
                    new_name,
                    moved.len()
                );
                if let Err(err) = self.store.set_category(&moved, &new_name) {
                    log::warn!("Store rejected category rename '{}', restoring", old_name);
                    for snippet in before {
                        index.insert_or_replace(snippet);
                    }
                    return Err(err.into());
                }
                Ok(())
            }
            Mode::Browse => {
                if old_name == new_name {
                    return Ok(());
                }

                let members = self.store.snippets_by_category(old_name)?;
                log::debug!(
                    "Renaming category '{}' to '{}' for {} snippets in store",
                    old_name,
                    new_name,
                    members.len()
                );
                self.store.set_category(&members, &new_name)?;
                Ok(())
            }
        }
    }

    /// Sets `syntax` on every snippet of `category` except `excluded`
    pub fn set_syntax(&mut self, syntax: &str, category: &str, excluded: Option<&str>) -> Result<()> {
        match &mut self.mode {
            Mode::Searching(index) => {
                let before = index.snippets_in(category);
                let changed = index.set_syntax(category, syntax, excluded);
                if changed.is_empty() {
                    return Ok(());
                }

                log::debug!(
                    "Setting syntax '{}' on {} snippets of '{}' in results and store",
                    syntax,
                    changed.len(),
                    category
                );
                if let Err(err) = self.store.set_syntax(&changed, syntax) {
                    log::warn!("Store rejected syntax change in '{}', restoring", category);
                    for snippet in before {
                        index.insert_or_replace(snippet);
                    }
                    return Err(err.into());
                }
                Ok(())
            }
            Mode::Browse => {
                let targets: Vec<Snippet> = self
                    .store
                    .snippets_by_category(category)?
                    .into_iter()
                    .filter(|s| Some(s.name.as_str()) != excluded)
                    .collect();

                log::debug!(
                    "Setting syntax '{}' on {} snippets of '{}' in store",
                    syntax,
                    targets.len(),
                    category
                );
                self.store.set_syntax(&targets, syntax)?;
                Ok(())
            }
        }
    }

    pub fn count_snippets(&self) -> Result<usize> {
        match &self.mode {
            Mode::Searching(index) => Ok(index.count()),
            Mode::Browse => Ok(self.store.count_snippets()?),
        }
    }

    pub fn count_categories(&self) -> Result<usize> {
        match &self.mode {
            Mode::Searching(index) => Ok(index.count_categories()),
            Mode::Browse => Ok(self.store.categories()?.len()),
        }
    }
}
