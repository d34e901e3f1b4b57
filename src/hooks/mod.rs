//! Reactive data hooks
//!
//! A hook wraps one family of API operations and exposes their outcome as
//! observable state: the latest data, whether a request is in flight, and
//! the last error message. Consumers either poll `snapshot()` or
//! `subscribe()` to a `tokio::sync::watch` receiver.
//!
//! Every operation bumps a generation counter before it starts. When a
//! response arrives for a generation that is no longer current it is
//! dropped without touching the state and the caller gets
//! `HookError::Superseded`, so a slow early request can never overwrite a
//! faster later one.

mod author;
mod poetry;
mod search;

pub use author::{AuthorData, AuthorHooks};
pub use poetry::{PoetryData, PoetryHooks};
pub use search::{SearchData, SearchHook};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;

use crate::api::Envelope;
use crate::http::ApiError;

// ─────────────────────────────────────────────────────────────────────────────
// State and errors
// ─────────────────────────────────────────────────────────────────────────────

/// Observable state of a hook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum HookError {
    /// The backend answered `success: false`, or `success: true` without data
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// A newer call on the same hook started before this one finished
    #[error("request superseded by a newer one")]
    Superseded,
}

impl HookError {
    /// Text stored in `HookState::error`
    pub fn message(&self) -> String {
        match self {
            HookError::Failed(message) => message.clone(),
            HookError::Api(e) => e.user_message(),
            HookError::Superseded => self.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook core
// ─────────────────────────────────────────────────────────────────────────────

/// Watch-backed state cell shared by the concrete hooks
#[derive(Debug)]
pub struct Hook<T> {
    state: watch::Sender<HookState<T>>,
    generation: AtomicU64,
}

impl<T: Default> Default for Hook<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Hook<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(HookState::default());
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }
}

impl<T: Clone> Hook<T> {
    pub fn subscribe(&self) -> watch::Receiver<HookState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> HookState<T> {
        self.state.borrow().clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Invalidate any in-flight call and overwrite the state directly
    pub(crate) fn reset(&self, modify: impl FnOnce(&mut T)) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.loading = false;
            state.error = None;
            modify(&mut state.data);
        });
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
        });
        generation
    }

    /// Run one request, leaving the data untouched on failure
    pub(crate) async fn run<R, F>(
        &self,
        default_message: &str,
        request: F,
        on_success: impl FnOnce(&mut T, &R),
    ) -> Result<R, HookError>
    where
        F: Future<Output = Result<Envelope<R>, ApiError>>,
    {
        self.run_with(default_message, request, on_success, |_| {})
            .await
    }

    /// Run one request through the hook contract
    ///
    /// The generation check and the state write happen under the watch
    /// lock, so a call that starts concurrently either sees this result
    /// applied or makes it stale.
    pub(crate) async fn run_with<R, F>(
        &self,
        default_message: &str,
        request: F,
        on_success: impl FnOnce(&mut T, &R),
        on_failure: impl FnOnce(&mut T),
    ) -> Result<R, HookError>
    where
        F: Future<Output = Result<Envelope<R>, ApiError>>,
    {
        let generation = self.begin();

        let result = match request.await {
            Ok(envelope) => envelope
                .into_result(default_message)
                .map_err(HookError::Failed),
            Err(e) => Err(HookError::Api(e)),
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.loading = false;
            match &result {
                Ok(value) => on_success(&mut state.data, value),
                Err(e) => {
                    state.error = Some(e.message());
                    on_failure(&mut state.data);
                }
            }
            true
        });

        if !applied {
            tracing::debug!("Discarding superseded response (generation {})", generation);
            return Err(HookError::Superseded);
        }

        if let Err(e) = &result {
            tracing::warn!("{}: {}", default_message, e.message());
        }
        result
    }
}
