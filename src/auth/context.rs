//! Per-request view of the session and cookie stores.
//!
//! The engine never owns request state. Each call borrows a
//! [`RequestContext`] that points at the session and cookies of the request
//! being handled, plus the request parameters the strategies may need
//! (typically the submitted login form).

use secrecy::SecretString;
use serde_json::Value;
use std::collections::HashMap;

use super::user::SerializedUser;

/// Request parameters, e.g. decoded form fields.
pub type Params = HashMap<String, String>;

/// A value kept in the session.
#[derive(Clone, Debug)]
pub enum SessionValue {
    /// Credential record written by a login or a remembered login.
    User(SerializedUser),
    /// Any other application data.
    Json(Value),
}

impl From<SerializedUser> for SessionValue {
    fn from(user: SerializedUser) -> Self {
        Self::User(user)
    }
}

impl From<Value> for SessionValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Request-scoped key/value session storage.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<SessionValue>;
    fn set(&mut self, key: &str, value: SessionValue);
    /// Remove every key, not only the ones written by the engine.
    fn destroy(&mut self);
}

/// Small client-persisted key/value storage.
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str);
    fn delete(&mut self, name: &str);
}

/// In-memory session, used by the demo server and by tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    values: HashMap<String, SessionValue>,
    destroyed: bool,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether [`SessionStore::destroy`] was called since the session was loaded.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Read and reset the destroyed marker, once the owner has dropped the
    /// old session id.
    pub fn take_destroyed(&mut self) -> bool {
        std::mem::take(&mut self.destroyed)
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<SessionValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SessionValue) {
        self.values.insert(key.to_string(), value);
    }

    fn destroy(&mut self) {
        self.values.clear();
        self.destroyed = true;
    }
}

/// Everything a strategy can see about the current request.
pub struct RequestContext<'a> {
    session: &'a mut dyn SessionStore,
    cookies: &'a mut dyn CookieStore,
    params: &'a Params,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        session: &'a mut dyn SessionStore,
        cookies: &'a mut dyn CookieStore,
        params: &'a Params,
    ) -> Self {
        Self {
            session,
            cookies,
            params,
        }
    }

    pub fn session(&mut self) -> &mut dyn SessionStore {
        &mut *self.session
    }

    pub fn cookies(&mut self) -> &mut dyn CookieStore {
        &mut *self.cookies
    }

    /// Read a cookie without borrowing the context mutably.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name)
    }

    /// Read a cookie that holds a secret, such as a remember token.
    #[must_use]
    pub fn secret_cookie(&self, name: &str) -> Option<SecretString> {
        self.cookies.get(name).map(SecretString::from)
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        self.params
    }

    pub(crate) fn session_user(&self, key: &str) -> Option<SerializedUser> {
        match self.session.get(key)? {
            SessionValue::User(user) => Some(user),
            SessionValue::Json(_) => None,
        }
    }
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
