//! Shared reference data: dynasties, categories and the poem being viewed
//!
//! Populated by whichever command fetched them last so other commands can
//! reuse them without another round trip. No derived state.

use std::sync::Mutex;

use crate::api::models::{Category, Dynasty, Work};
use crate::storage::lock;

#[derive(Debug, Default)]
struct ReferenceData {
    dynasties: Vec<Dynasty>,
    categories: Vec<Category>,
    current_poem: Option<Work>,
    loading: bool,
}

/// Process-lifetime cache of catalog reference data
#[derive(Debug, Default)]
pub struct ReferenceStore {
    data: Mutex<ReferenceData>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dynasties(&self) -> Vec<Dynasty> {
        lock(&self.data).dynasties.clone()
    }

    pub fn set_dynasties(&self, dynasties: Vec<Dynasty>) {
        lock(&self.data).dynasties = dynasties;
    }

    pub fn categories(&self) -> Vec<Category> {
        lock(&self.data).categories.clone()
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        lock(&self.data).categories = categories;
    }

    pub fn current_poem(&self) -> Option<Work> {
        lock(&self.data).current_poem.clone()
    }

    pub fn set_current_poem(&self, poem: Option<Work>) {
        lock(&self.data).current_poem = poem;
    }

    pub fn loading(&self) -> bool {
        lock(&self.data).loading
    }

    pub fn set_loading(&self, loading: bool) {
        lock(&self.data).loading = loading;
    }

    /// Display name for a category key, falling back to the key itself
    pub fn category_label(&self, name: &str) -> String {
        lock(&self.data)
            .categories
            .iter()
            .find(|c| c.name == name)
            .filter(|c| !c.display_name.is_empty())
            .map(|c| c.display_name.clone())
            .unwrap_or_else(|| name.to_string())
    }
}
