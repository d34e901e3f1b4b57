//! Login session: bearer token plus the current user's profile
//!
//! The session is shared by reference (`SharedSession`) between the HTTP
//! client, the account operations and the router. Every mutation is mirrored
//! synchronously to durable storage under the keys `token` and `currentUser`
//! and announced on a broadcast channel so interested components (the router
//! in particular) can react without the transport layer knowing about them.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::storage::{lock, KeyValueStore, MemoryStore, StorageError};

/// Durable key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Durable key holding the JSON-serialized current user
pub const CURRENT_USER_KEY: &str = "currentUser";

const EVENT_CAPACITY: usize = 16;

/// Session handle shared across the application
pub type SharedSession = Arc<SessionStore>;

/// Change notifications emitted by the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// `set_auth` stored a new token and user
    Authenticated,
    /// `update_user` merged new profile fields
    UserUpdated,
    /// `clear_auth` was called (logout)
    Cleared,
    /// The server rejected the token (HTTP 401) and the session was torn down
    Expired,
}

#[derive(Debug, Default)]
struct SessionState {
    token: String,
    current_user: Option<Value>,
}

/// Token and user holder mirrored to durable storage
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionStore {
    /// Restore the session persisted in `storage`
    ///
    /// A `currentUser` value that is not valid JSON is treated as absent.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let token = storage.get(TOKEN_KEY).unwrap_or_default();
        let current_user = storage
            .get(CURRENT_USER_KEY)
            .and_then(|raw| match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Null) => None,
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable stored user: {}", e);
                    None
                }
            });

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            storage,
            state: Mutex::new(SessionState {
                token,
                current_user,
            }),
            events,
        }
    }

    /// Session backed by a throwaway in-memory store
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::new()))
    }

    /// Wrap in an `Arc` for sharing
    pub fn shared(self) -> SharedSession {
        Arc::new(self)
    }

    /// Current token (empty when logged out)
    pub fn token(&self) -> String {
        lock(&self.state).token.clone()
    }

    /// Token to send as `Authorization: Bearer`, if any
    pub fn bearer_token(&self) -> Option<String> {
        let state = lock(&self.state);
        (!state.token.is_empty()).then(|| state.token.clone())
    }

    /// Raw JSON of the current user
    pub fn current_user(&self) -> Option<Value> {
        lock(&self.state).current_user.clone()
    }

    /// Current user decoded into a typed profile
    pub fn current_user_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.current_user()
            .and_then(|user| serde_json::from_value(user).ok())
    }

    /// True iff the token is non-empty
    pub fn is_authenticated(&self) -> bool {
        !lock(&self.state).token.is_empty()
    }

    /// Receive change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Store a fresh login
    ///
    /// Both durable keys are written before the in-memory session changes;
    /// on a storage error the session is left as it was.
    pub fn set_auth(&self, token: impl Into<String>, user: Value) -> Result<(), StorageError> {
        let token = token.into();
        let user_json = user.to_string();

        let mut state = lock(&self.state);
        self.storage.set(TOKEN_KEY, &token)?;
        if let Err(e) = self.storage.set(CURRENT_USER_KEY, &user_json) {
            // Keep the two keys in agreement with what is still in memory
            let restored = if state.token.is_empty() {
                self.storage.remove(TOKEN_KEY)
            } else {
                self.storage.set(TOKEN_KEY, &state.token)
            };
            if let Err(restore) = restored {
                tracing::error!("Failed to restore persisted token: {}", restore);
            }
            return Err(e);
        }
        state.token = token;
        state.current_user = (!user.is_null()).then_some(user);
        drop(state);

        tracing::info!("Session authenticated");
        self.notify(SessionEvent::Authenticated);
        Ok(())
    }

    /// Forget the token and user (logout)
    pub fn clear_auth(&self) -> Result<(), StorageError> {
        self.reset()?;
        tracing::info!("Session cleared");
        self.notify(SessionEvent::Cleared);
        Ok(())
    }

    /// Shallow-merge `patch` into the current user and persist it
    ///
    /// Object fields in `patch` replace those of the stored user; a
    /// non-object patch replaces the user outright. Nothing changes in
    /// memory unless the merged user was written.
    pub fn update_user(&self, patch: Value) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        let merged = match (state.current_user.clone(), patch) {
            (Some(Value::Object(mut current)), Value::Object(patch)) => {
                current.extend(patch);
                Value::Object(current)
            }
            (_, patch) => patch,
        };

        self.storage.set(CURRENT_USER_KEY, &merged.to_string())?;
        state.current_user = Some(merged);
        drop(state);

        self.notify(SessionEvent::UserUpdated);
        Ok(())
    }

    /// Tear the session down after the server rejected it
    ///
    /// Storage failures are logged rather than returned: the in-memory
    /// session is dropped either way and the caller is already handling an
    /// authentication error.
    pub fn expire(&self) {
        if let Err(e) = self.reset() {
            tracing::error!("Failed to clear persisted session: {}", e);
            let mut state = lock(&self.state);
            state.token.clear();
            state.current_user = None;
        }
        tracing::warn!("Session expired");
        self.notify(SessionEvent::Expired);
    }

    /// Remove the durable keys, clearing each in memory only once it is gone
    fn reset(&self) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        self.storage.remove(TOKEN_KEY)?;
        state.token.clear();
        self.storage.remove(CURRENT_USER_KEY)?;
        state.current_user = None;
        Ok(())
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine - nobody is listening yet
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_with_store() -> (SessionStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionStore::load(store.clone()), store)
    }

    #[test]
    fn test_set_auth_persists_and_authenticates() {
        let (session, store) = session_with_store();
        assert!(!session.is_authenticated());

        let user = json!({"id": 7, "username": "libai"});
        session.set_auth("tok-1", user.clone()).unwrap();

        assert!(session.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        let stored: Value = serde_json::from_str(&store.get(CURRENT_USER_KEY).unwrap()).unwrap();
        assert_eq!(stored, user);
        assert_eq!(session.current_user(), Some(user));
    }

    #[test]
    fn test_clear_auth_removes_keys() {
        let (session, store) = session_with_store();
        session.set_auth("tok-1", json!({"id": 7})).unwrap();
        session.clear_auth().unwrap();

        assert!(!session.is_authenticated());
        assert!(!store.contains(TOKEN_KEY));
        assert!(!store.contains(CURRENT_USER_KEY));
        assert_eq!(session.current_user(), None);
        assert_eq!(session.bearer_token(), None);
    }

    #[test]
    fn test_update_user_merges_fields() {
        let (session, store) = session_with_store();
        session
            .set_auth("tok", json!({"id": 7, "nickname": "old", "level": 1}))
            .unwrap();

        session.update_user(json!({"nickname": "new"})).unwrap();

        let expected = json!({"id": 7, "nickname": "new", "level": 1});
        assert_eq!(session.current_user(), Some(expected.clone()));
        let stored: Value = serde_json::from_str(&store.get(CURRENT_USER_KEY).unwrap()).unwrap();
        assert_eq!(stored, expected);
    }

    #[test]
    fn test_update_user_without_existing_user() {
        let (session, _) = session_with_store();
        session.update_user(json!({"nickname": "guest"})).unwrap();
        assert_eq!(session.current_user(), Some(json!({"nickname": "guest"})));
        // Updating the profile does not log anyone in
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_load_restores_persisted_session() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "persisted").unwrap();
        store.set(CURRENT_USER_KEY, r#"{"username":"dufu"}"#).unwrap();

        let session = SessionStore::load(store);
        assert!(session.is_authenticated());
        assert_eq!(session.current_user(), Some(json!({"username": "dufu"})));
    }

    #[test]
    fn test_load_ignores_corrupt_user() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(CURRENT_USER_KEY, "{broken").unwrap();

        let session = SessionStore::load(store);
        assert!(session.is_authenticated());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_expire_clears_and_notifies() {
        let (session, store) = session_with_store();
        session.set_auth("tok", json!({"id": 1})).unwrap();
        let mut events = session.subscribe();

        session.expire();

        assert!(!session.is_authenticated());
        assert!(!store.contains(TOKEN_KEY));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    }

    /// Session over a file store whose parent directory can be replaced by a file
    fn session_on_disk(dir: &std::path::Path) -> (SessionStore, std::path::PathBuf) {
        let parent = dir.join("sub");
        let store = crate::storage::FileStore::open(parent.join("session.json")).unwrap();
        (SessionStore::load(Arc::new(store)), parent)
    }

    fn make_unwritable(parent: &std::path::Path) {
        if parent.exists() {
            std::fs::remove_dir_all(parent).unwrap();
        }
        std::fs::write(parent, "in the way").unwrap();
    }

    #[test]
    fn test_set_auth_failure_keeps_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let (session, parent) = session_on_disk(dir.path());
        let mut events = session.subscribe();
        make_unwritable(&parent);

        assert!(session.set_auth("tok", json!({"id": 1})).is_err());

        assert!(!session.is_authenticated());
        assert_eq!(session.bearer_token(), None);
        assert_eq!(session.current_user(), None);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_failed_writes_keep_existing_session() {
        let dir = tempfile::tempdir().unwrap();
        let (session, parent) = session_on_disk(dir.path());
        session.set_auth("tok", json!({"id": 1, "nickname": "old"})).unwrap();
        make_unwritable(&parent);

        assert!(session.update_user(json!({"nickname": "new"})).is_err());
        assert_eq!(
            session.current_user(),
            Some(json!({"id": 1, "nickname": "old"}))
        );

        assert!(session.clear_auth().is_err());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_expire_clears_memory_when_storage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (session, parent) = session_on_disk(dir.path());
        session.set_auth("tok", json!({"id": 1})).unwrap();
        make_unwritable(&parent);

        session.expire();

        assert!(!session.is_authenticated());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_events_follow_mutations() {
        let (session, _) = session_with_store();
        let mut events = session.subscribe();

        session.set_auth("tok", json!({})).unwrap();
        session.update_user(json!({"a": 1})).unwrap();
        session.clear_auth().unwrap();

        assert_eq!(events.try_recv().unwrap(), SessionEvent::Authenticated);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::UserUpdated);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Cleared);
    }
}
