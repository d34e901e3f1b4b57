//! Full-text search hook

use crate::api::models::{PageParams, SearchResults, Work};
use crate::api::PoetryApi;

use super::{Hook, HookError, HookState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchData {
    pub results: Vec<Work>,
    pub total: u64,
}

pub struct SearchHook {
    api: PoetryApi,
    hook: Hook<SearchData>,
}

impl SearchHook {
    pub fn new(api: PoetryApi) -> Self {
        Self {
            api,
            hook: Hook::new(),
        }
    }

    pub fn state(&self) -> HookState<SearchData> {
        self.hook.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<HookState<SearchData>> {
        self.hook.subscribe()
    }

    pub fn results(&self) -> Vec<Work> {
        self.hook.snapshot().data.results
    }

    pub fn total(&self) -> u64 {
        self.hook.snapshot().data.total
    }

    pub fn loading(&self) -> bool {
        self.hook.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.hook.error()
    }

    /// Search poems and authors
    ///
    /// A blank query clears the results and returns `Ok(None)` without
    /// contacting the backend; it also cancels any search still in flight.
    /// A failed search empties the results as well.
    pub async fn search(&self, query: &str, paging: &PageParams) -> Result<Option<SearchResults>, HookError> {
        if query.trim().is_empty() {
            self.hook.reset(|data| *data = SearchData::default());
            return Ok(None);
        }

        self.hook
            .run_with(
                "search failed",
                self.api.search(query, paging),
                |data, found| {
                    data.results = found.works.clone();
                    data.total = found.total;
                },
                |data| *data = SearchData::default(),
            )
            .await
            .map(Some)
    }
}
