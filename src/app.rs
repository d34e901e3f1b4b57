//! Composition root: wires storage, session, HTTP client, stores and router

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::account::Account;
use crate::api::{PoetryApi, UserApi};
use crate::config::Config;
use crate::hooks::{AuthorHooks, HookError, PoetryHooks, SearchHook};
use crate::http::{ApiClient, ApiError};
use crate::router::Router;
use crate::storage::{FileStore, KeyValueStore};
use crate::store::{ReferenceStore, SessionStore, SharedSession};

pub struct App {
    pub config: Config,
    pub session: SharedSession,
    pub reference: Arc<ReferenceStore>,
    pub router: Arc<Router>,
    pub poetry: PoetryApi,
    pub account: Account,
}

impl App {
    /// Build the application over an explicit storage backend
    pub fn new(config: Config, storage: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let session = SessionStore::load(storage).shared();
        let client = ApiClient::new(config.api.clone(), session.clone())?;

        Ok(Self {
            poetry: PoetryApi::new(client.clone()),
            account: Account::new(UserApi::new(client), session.clone()),
            router: Arc::new(Router::new(session.clone())),
            reference: Arc::new(ReferenceStore::new()),
            session,
            config,
        })
    }

    /// Build the application with the session file named in `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = FileStore::open(&config.session_file).with_context(|| {
            format!("Cannot open session file {}", config.session_file.display())
        })?;
        tracing::debug!("Session file: {}", storage.path().display());

        Ok(Self::new(config, Arc::new(storage))?)
    }

    /// Route session expiry to the router for the lifetime of the app
    pub fn spawn_session_watcher(&self) -> JoinHandle<()> {
        tokio::spawn(self.router.clone().watch_session(self.session.subscribe()))
    }

    pub fn poetry_hooks(&self) -> PoetryHooks {
        PoetryHooks::new(self.poetry.clone())
    }

    pub fn search_hook(&self) -> SearchHook {
        SearchHook::new(self.poetry.clone())
    }

    pub fn author_hooks(&self) -> AuthorHooks {
        AuthorHooks::new(self.poetry.clone())
    }

    /// Fill the reference store with dynasties and categories
    pub async fn load_reference_data(&self) -> Result<(), HookError> {
        self.reference.set_loading(true);
        let (dynasties, categories) = tokio::join!(self.poetry.dynasties(), self.poetry.categories());
        self.reference.set_loading(false);

        let dynasties = dynasties?
            .into_result("failed to load dynasties")
            .map_err(HookError::Failed)?;
        let categories = categories?
            .into_result("failed to load categories")
            .map_err(HookError::Failed)?;

        tracing::debug!(
            "Loaded {} dynasties, {} categories",
            dynasties.len(),
            categories.len()
        );
        self.reference.set_dynasties(dynasties);
        self.reference.set_categories(categories);
        Ok(())
    }
}
