//! Shared server state: the engine plus an in-memory session table.
//!
//! Each request loads its session by the `authlane.session` cookie, runs the
//! handler against a [`RequestContext`], then writes the session back. A
//! destroyed session loses its id; a session that holds data after the
//! handler ran gets a fresh id if it had none. Ids the table does not know
//! are never adopted, and entries expire with the cookie.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use parking_lot::{Mutex, MutexGuard};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error};
use ulid::Ulid;

use crate::auth::{
    self, AuthLane, CookieJar, CookieStore, MemorySession, Params, Registry, RequestContext,
    DEFAULT_MAX_AGE_SECONDS,
};

use super::directory::{self, Directory};

/// Cookie carrying the server-side session id.
pub const SESSION_COOKIE: &str = "authlane.session";

/// How long a stored session lives after its last write. Matches the
/// `Max-Age` of the session cookie.
pub const SESSION_TTL: Duration = Duration::from_secs(DEFAULT_MAX_AGE_SECONDS.unsigned_abs());

#[derive(Debug)]
struct Entry {
    session: MemorySession,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct Sessions {
    inner: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl Sessions {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Lock the table with expired entries already evicted.
    fn live(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let before = inner.len();
        inner.retain(|_, entry| entry.expires_at > now);
        if inner.len() < before {
            debug!(evicted = before - inner.len(), "expired sessions evicted");
        }
        inner
    }

    fn load(&self, id: &str) -> Option<MemorySession> {
        self.live().get(id).map(|entry| entry.session.clone())
    }

    /// Store a session under an id minted by the server.
    fn insert(&self, id: String, session: MemorySession) {
        let expires_at = Instant::now() + self.ttl;
        self.live().insert(id, Entry { session, expires_at });
    }

    /// Overwrite a session that is still in the table. Returns `false` when
    /// the id is gone (destroyed or expired meanwhile); nothing is stored.
    fn replace(&self, id: &str, session: MemorySession) -> bool {
        let expires_at = Instant::now() + self.ttl;
        match self.live().get_mut(id) {
            Some(entry) => {
                *entry = Entry { session, expires_at };
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: &str) {
        self.inner.lock().remove(id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().is_empty()
    }
}

#[derive(Debug)]
pub struct AppState {
    lane: AuthLane,
    directory: Arc<Directory>,
    sessions: Sessions,
}

impl AppState {
    /// Build the state with the demo strategies installed on `registry`.
    #[must_use]
    pub fn new(registry: Registry, directory: Arc<Directory>) -> Self {
        let registry = directory::install(registry, directory.clone());
        Self {
            lane: AuthLane::new(Arc::new(registry)),
            directory,
            sessions: Sessions::default(),
        }
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = Sessions::new(ttl);
        self
    }

    #[must_use]
    pub fn lane(&self) -> &AuthLane {
        &self.lane
    }

    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    #[must_use]
    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Run `handler` against the session and cookies of one request.
    ///
    /// Engine errors become responses (redirects, 500s) and every cookie
    /// change is added to the response as a `Set-Cookie` header.
    pub fn exchange<F>(&self, headers: &HeaderMap, params: &Params, handler: F) -> Response
    where
        F: FnOnce(&AuthLane, &mut RequestContext<'_>) -> auth::Result<Response>,
    {
        let mut cookies = CookieJar::from_headers(headers);
        let loaded = cookies
            .get(SESSION_COOKIE)
            .and_then(|id| self.sessions.load(&id).map(|session| (id, session)));
        let (session_id, mut session) = match loaded {
            Some((id, session)) => (Some(id), session),
            None => (None, MemorySession::default()),
        };

        let outcome = {
            let mut context = RequestContext::new(&mut session, &mut cookies, params);
            handler(&self.lane, &mut context)
        };

        self.persist(session_id, session, &mut cookies);

        let mut response = outcome.unwrap_or_else(IntoResponse::into_response);
        if let Err(err) = cookies.write_headers(response.headers_mut()) {
            error!("Failed to write cookies: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        response
    }

    fn persist(
        &self,
        mut session_id: Option<String>,
        mut session: MemorySession,
        cookies: &mut CookieJar,
    ) {
        if session.take_destroyed() {
            if let Some(id) = session_id.take() {
                debug!("session destroyed");
                self.sessions.remove(&id);
            }
            cookies.delete(SESSION_COOKIE);
        }

        if session.is_empty() {
            return;
        }

        match session_id {
            Some(id) => {
                if !self.sessions.replace(&id, session) {
                    debug!("session ended during the request, write dropped");
                    cookies.delete(SESSION_COOKIE);
                }
            }
            None => {
                let id = Ulid::new().to_string();
                cookies.set(SESSION_COOKIE, &id);
                self.sessions.insert(id, session);
            }
        }
    }
}
