//! Author catalog hooks

use crate::api::models::{Author, AuthorCollection, AuthorQuery};
use crate::api::PoetryApi;

use super::{Hook, HookError, HookState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorData {
    pub authors: Vec<Author>,
    pub current_author: Option<Author>,
}

pub struct AuthorHooks {
    api: PoetryApi,
    hook: Hook<AuthorData>,
}

impl AuthorHooks {
    pub fn new(api: PoetryApi) -> Self {
        Self {
            api,
            hook: Hook::new(),
        }
    }

    pub fn state(&self) -> HookState<AuthorData> {
        self.hook.snapshot()
    }

    pub fn authors(&self) -> Vec<Author> {
        self.hook.snapshot().data.authors
    }

    pub fn current_author(&self) -> Option<Author> {
        self.hook.snapshot().data.current_author
    }

    pub async fn fetch_authors(&self, query: &AuthorQuery) -> Result<AuthorCollection, HookError> {
        self.hook
            .run("failed to load authors", self.api.authors(query), |data, page| {
                data.authors = page.authors.clone();
            })
            .await
    }

    pub async fn fetch_author(&self, name: &str) -> Result<Author, HookError> {
        self.hook
            .run("failed to load author", self.api.author(name), |data, author| {
                data.current_author = Some(author.clone());
            })
            .await
    }
}
