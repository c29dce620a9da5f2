//! Write-through cache of the bearer token.
//!
//! Reads are served from memory after a single lazy load from durable
//! storage. Writes update memory immediately and are handed to a background
//! writer task, which applies them to durable storage in submission order.
//! Callers never wait on a durable write unless they ask to via `flush`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::events::SessionEvent;
use super::token::{normalize_token, redact, stored_token};
use crate::storage::{KeyValueStore, StorageResult};

/// Durable key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Durable key holding the signed-in user's university
pub const UNIVERSITY_ID_KEY: &str = "universityId";

/// Durable key holding the signed-in user's role
pub const USER_ROLE_KEY: &str = "userRole";

/// Durable key holding the sign-in timestamp (RFC 3339)
pub const SIGNED_IN_AT_KEY: &str = "signedInAt";

/// Everything removed when a session ends
const SESSION_KEYS: &[&str] = &[TOKEN_KEY, UNIVERSITY_ID_KEY, USER_ROLE_KEY, SIGNED_IN_AT_KEY];

/// Buffered session events per subscriber before the oldest are dropped
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// In-memory view of the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenState {
    /// Durable storage not consulted yet
    Unknown,
    Absent,
    Present(String),
}

impl TokenState {
    fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) => TokenState::Present(token),
            None => TokenState::Absent,
        }
    }

    /// `None` while unknown, otherwise the cached answer
    fn known(&self) -> Option<Option<String>> {
        match self {
            TokenState::Unknown => None,
            TokenState::Absent => Some(None),
            TokenState::Present(token) => Some(Some(token.clone())),
        }
    }
}

enum PersistOp {
    Set { key: &'static str, value: String },
    Remove(Vec<&'static str>),
    Flush(oneshot::Sender<()>),
}

/// Identifiers returned alongside the token at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProfile {
    pub university_id: Option<i64>,
    pub role: Option<String>,
    pub signed_in_at: Option<DateTime<Utc>>,
}

/// Single source of truth for the bearer token.
///
/// Construct one per process and share it by `Arc` with every `ApiClient`.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<TokenState>,
    // Serializes the one-time durable load across concurrent first readers
    load_gate: tokio::sync::Mutex<()>,
    writer: mpsc::UnboundedSender<PersistOp>,
    events: broadcast::Sender<SessionEvent>,
}

impl TokenStore {
    /// Create a token store over `storage` and start its background writer.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (writer, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(run_writer(Arc::clone(&storage), rx));

        Self {
            storage,
            state: Mutex::new(TokenState::Unknown),
            load_gate: tokio::sync::Mutex::new(()),
            writer,
            events,
        }
    }

    /// Store a new token (login or rotation).
    ///
    /// Subsequent reads see the normalized value immediately; the durable
    /// write happens in the background. A value that normalizes to nothing
    /// leaves the store without a token.
    pub fn set_token(&self, raw: &str) {
        match normalize_token(raw) {
            Some(token) => {
                debug!(token = %redact(&token), "Storing session token");
                *self.lock_state() = TokenState::Present(token.clone());
                self.persist(PersistOp::Set {
                    key: TOKEN_KEY,
                    value: token,
                });
                self.publish(SessionEvent::SignedIn);
            }
            None => {
                warn!("Ignoring empty session token");
                *self.lock_state() = TokenState::Absent;
                self.persist(PersistOp::Remove(vec![TOKEN_KEY]));
            }
        }
    }

    /// Current token, loading it from durable storage on first use.
    ///
    /// Durable storage is read at most once per store; the result, including
    /// "no token", is cached for every later call.
    pub async fn get_token(&self) -> Option<String> {
        let cached = self.lock_state().known();
        if let Some(known) = cached {
            return known;
        }

        let _gate = self.load_gate.lock().await;
        let cached = self.lock_state().known();
        if let Some(known) = cached {
            return known;
        }

        let loaded = match self.storage.get(TOKEN_KEY).await {
            Ok(raw) => raw.as_deref().and_then(stored_token),
            Err(e) => {
                warn!(backend = self.storage.backend_name(), error = %e, "Failed to load session token");
                None
            }
        };
        debug!(found = loaded.is_some(), "Loaded session token from storage");

        let mut state = self.lock_state();
        // A set or clear that landed during the load takes precedence
        if *state == TokenState::Unknown {
            *state = TokenState::from_token(loaded);
        }
        state.known().flatten()
    }

    /// True if a token is currently held
    pub async fn has_session(&self) -> bool {
        self.get_token().await.is_some()
    }

    /// Drop the token and its dependent identifiers (logout).
    ///
    /// The store stays initialized, so a lazy reload cannot bring the token back.
    pub fn clear_token(&self) {
        self.clear_with(SessionEvent::SignedOut);
    }

    /// Drop the session because the backend rejected the token.
    pub(crate) fn invalidate(&self, status: u16, path: &str) {
        self.clear_with(SessionEvent::Rejected {
            status,
            path: path.to_string(),
        });
    }

    fn clear_with(&self, event: SessionEvent) {
        info!(?event, "Clearing session");
        *self.lock_state() = TokenState::Absent;
        self.persist(PersistOp::Remove(SESSION_KEYS.to_vec()));
        self.publish(event);
    }

    /// Remember the identifiers returned at login.
    ///
    /// Fields that are `None` are removed so a previous user's values never linger.
    pub fn remember_profile(&self, profile: &SessionProfile) {
        let university_id = profile.university_id.map(|id| id.to_string());
        let signed_in_at = profile.signed_in_at.map(|at| at.to_rfc3339());
        let fields = [
            (UNIVERSITY_ID_KEY, university_id),
            (USER_ROLE_KEY, profile.role.clone()),
            (SIGNED_IN_AT_KEY, signed_in_at),
        ];

        let mut removed = Vec::new();
        for (key, value) in fields {
            match value {
                Some(value) => self.persist(PersistOp::Set { key, value }),
                None => removed.push(key),
            }
        }
        if !removed.is_empty() {
            self.persist(PersistOp::Remove(removed));
        }
    }

    /// Identifiers stored with the current session, after pending writes land
    pub async fn profile(&self) -> StorageResult<SessionProfile> {
        self.flush().await;

        let university_id = self
            .storage
            .get(UNIVERSITY_ID_KEY)
            .await?
            .and_then(|id| id.trim().parse().ok());
        let role = self
            .storage
            .get(USER_ROLE_KEY)
            .await?
            .filter(|role| !role.trim().is_empty());
        let signed_in_at = self
            .storage
            .get(SIGNED_IN_AT_KEY)
            .await?
            .and_then(|at| DateTime::parse_from_rfc3339(&at).ok())
            .map(|at| at.with_timezone(&Utc));

        Ok(SessionProfile {
            university_id,
            role,
            signed_in_at,
        })
    }

    /// Wait until every durable write queued so far has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.persist(PersistOp::Flush(done));
        let _ = wait.await;
    }

    /// Receive session lifecycle events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn persist(&self, op: PersistOp) {
        if self.writer.send(op).is_err() {
            warn!("Session writer has stopped; durable update dropped");
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_writer(storage: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<PersistOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            PersistOp::Set { key, value } => {
                if let Err(e) = storage.set(key, &value).await {
                    warn!(backend = storage.backend_name(), key, error = %e, "Failed to persist session entry");
                }
            }
            PersistOp::Remove(keys) => {
                if let Err(e) = storage.remove_many(&keys).await {
                    warn!(backend = storage.backend_name(), ?keys, error = %e, "Failed to remove session entries");
                }
            }
            PersistOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Session writer stopped");
}
