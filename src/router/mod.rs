//! URL-to-view routing with session-based navigation guards
//!
//! `navigate` resolves a target path to a `View`, applies the route guard
//! against the shared session and records the final location. Redirects
//! (catch-all, guard redirects) are followed iteratively up to
//! `MAX_REDIRECTS`.
//!
//! The router also owns the reaction to a server-side logout: it listens
//! for `SessionEvent::Expired` and moves to `/login`, remembering where the
//! user was.

mod location;

pub use location::{Location, PathPattern};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::storage::lock;
use crate::store::{SessionEvent, SharedSession};

/// Redirect hops allowed before navigation gives up
const MAX_REDIRECTS: usize = 5;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Screens of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Catalog,
    AuthorsCatalog,
    PoemDetail,
    Author,
    Search,
    Login,
    Register,
    Profile,
}

/// Guard flags attached to a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_guest: bool,
}

impl RouteMeta {
    const PUBLIC: Self = Self {
        requires_auth: false,
        requires_guest: false,
    };
    const AUTH: Self = Self {
        requires_auth: true,
        requires_guest: false,
    };
    const GUEST: Self = Self {
        requires_auth: false,
        requires_guest: true,
    };
}

#[derive(Debug, Clone)]
pub struct Route {
    pub view: View,
    pub pattern: PathPattern,
    pub meta: RouteMeta,
}

impl Route {
    fn new(view: View, pattern: &str, meta: RouteMeta) -> Self {
        Self {
            view,
            pattern: PathPattern::new(pattern),
            meta,
        }
    }
}

/// Application route table
pub fn routes() -> Vec<Route> {
    vec![
        Route::new(View::Home, "/", RouteMeta::PUBLIC),
        Route::new(View::Catalog, "/catalog", RouteMeta::PUBLIC),
        Route::new(View::AuthorsCatalog, "/authors", RouteMeta::PUBLIC),
        Route::new(View::PoemDetail, "/poem/:id", RouteMeta::PUBLIC),
        Route::new(View::Author, "/author/:name", RouteMeta::PUBLIC),
        Route::new(View::Search, "/search", RouteMeta::PUBLIC),
        Route::new(View::Login, "/login", RouteMeta::GUEST),
        Route::new(View::Register, "/register", RouteMeta::GUEST),
        Route::new(View::Profile, "/profile", RouteMeta::AUTH),
    ]
}

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub view: View,
    pub location: Location,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("too many redirects navigating to {0}")]
    RedirectLoop(String),
}

enum Decision {
    Proceed(ResolvedRoute),
    Redirect(Location),
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub struct Router {
    routes: Vec<Route>,
    session: SharedSession,
    current: Mutex<Option<ResolvedRoute>>,
}

impl Router {
    pub fn new(session: SharedSession) -> Self {
        Self {
            routes: routes(),
            session,
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<ResolvedRoute> {
        lock(&self.current).clone()
    }

    /// Resolve `target`, applying guards and following redirects
    pub fn navigate(&self, target: &str) -> Result<ResolvedRoute, RouterError> {
        let mut location = Location::parse(target);

        for _ in 0..=MAX_REDIRECTS {
            match self.decide(location) {
                Decision::Proceed(resolved) => {
                    tracing::debug!("Navigated to {} ({:?})", resolved.location, resolved.view);
                    *lock(&self.current) = Some(resolved.clone());
                    return Ok(resolved);
                }
                Decision::Redirect(next) => {
                    tracing::debug!("Redirecting to {}", next);
                    location = next;
                }
            }
        }

        tracing::warn!("Redirect limit reached for {}", target);
        Err(RouterError::RedirectLoop(target.to_string()))
    }

    fn decide(&self, location: Location) -> Decision {
        let matched = self
            .routes
            .iter()
            .find_map(|route| route.pattern.matches(&location).map(|params| (route, params)));

        // Catch-all
        let Some((route, params)) = matched else {
            return Decision::Redirect(Location::parse(HOME_PATH));
        };

        let authenticated = self.session.is_authenticated();
        if route.meta.requires_auth && !authenticated {
            let back = location.to_string();
            return Decision::Redirect(Location::parse(LOGIN_PATH).with_query("redirect", &back));
        }
        if route.meta.requires_guest && authenticated {
            return Decision::Redirect(Location::parse(HOME_PATH));
        }

        Decision::Proceed(ResolvedRoute {
            view: route.view,
            location,
            params,
        })
    }

    /// React to a session change; only expiry causes navigation
    pub fn handle_event(&self, event: SessionEvent) -> Option<ResolvedRoute> {
        if event != SessionEvent::Expired {
            return None;
        }

        let target = match self.current() {
            Some(current) if current.view != View::Login => Location::parse(LOGIN_PATH)
                .with_query("redirect", &current.location.to_string())
                .to_string(),
            _ => LOGIN_PATH.to_string(),
        };

        tracing::info!("Session expired, returning to login");
        self.navigate(&target).ok()
    }

    /// Follow session events until the session store goes away
    pub async fn watch_session(self: Arc<Self>, mut events: broadcast::Receiver<SessionEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_event(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Expiry is idempotent; acting on the latest state is enough
                    tracing::debug!("Session watcher skipped {} events", skipped);
                    if !self.session.is_authenticated() {
                        self.handle_event(SessionEvent::Expired);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
