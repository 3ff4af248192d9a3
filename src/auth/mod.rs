//! Authorization engine.
//!
//! Flow Overview: a handler builds a [`RequestContext`] over the request's
//! session and cookies and asks [`AuthLane`] a question.
//!
//! - `is_authorized` reads the credential record from the session. On a miss
//!   it tries the remember strategy with the remember cookie, and a remembered
//!   user is written into the session right away (implicit login). With a
//!   record present, an optional role request is resolved against the named
//!   role strategies.
//! - `require_authorization` turns a negative answer into a redirect to the
//!   failed route.
//! - `login` runs the auth strategy and stores the serialized user.
//! - `logout` runs the forget strategy, deletes the remember cookie and
//!   destroys the whole session.
//!
//! The engine keeps no state of its own. The [`Registry`] is shared read-only
//! and everything else lives in the request's stores.

mod context;
mod cookie;
mod error;
mod identity;
mod registry;
mod role;
mod strategy;
mod user;

pub use context::{
    CookieStore, MemorySession, Params, RequestContext, SessionStore, SessionValue,
};
pub use cookie::{CookieJar, DEFAULT_MAX_AGE_SECONDS};
pub use error::{Error, Result, StrategyKind};
pub use identity::{Credentials, Identity, Model};
pub use registry::{
    DefaultRoleCheck, Registry, SerializeUser, DEFAULT_FAILED_ROUTE, DEFAULT_REMEMBER_COOKIE,
    DEFAULT_SESSION_KEY,
};
pub use role::{RoleRequest, DEFAULT_ROLE};
pub use strategy::{AuthStrategy, ForgetStrategy, RememberStrategy, RoleStrategy, UserSerializer};
pub use user::{SerializedUser, ID_FIELD};

use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone, Debug)]
pub struct AuthLane {
    registry: Arc<Registry>,
}

impl AuthLane {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether the caller is logged in and, if `role` is given, satisfies it.
    ///
    /// A session miss falls back to the remember strategy; a remembered user
    /// is stored in the session before the role check runs.
    ///
    /// # Errors
    /// Returns [`Error::Strategy`] when the remember or role strategy fails.
    #[instrument(skip_all, fields(role = role.map(RoleRequest::name)))]
    pub fn is_authorized(
        &self,
        context: &mut RequestContext<'_>,
        role: Option<&RoleRequest>,
    ) -> Result<bool> {
        let Some(user) = self.resolve_user(context)? else {
            debug!("no credentials in session and nothing remembered");
            return Ok(false);
        };

        match role {
            Some(role) => self.check_role(context, &user, role),
            None => match self.registry.default_role_check() {
                DefaultRoleCheck::Skip => Ok(true),
                DefaultRoleCheck::Enforce => {
                    self.check_role(context, &user, &RoleRequest::default_role())
                }
            },
        }
    }

    /// Like [`Self::is_authorized`], but an unauthorized caller becomes a
    /// redirect to the failed route.
    ///
    /// # Errors
    /// Returns [`Error::Redirect`] when the caller is not authorized, or
    /// [`Error::Strategy`] when a strategy fails.
    pub fn require_authorization(
        &self,
        context: &mut RequestContext<'_>,
        role: Option<&RoleRequest>,
    ) -> Result<()> {
        self.require_authorization_to(context, role, None)
    }

    /// Like [`Self::require_authorization`], redirecting to `failed_route`
    /// instead of the configured route when given.
    ///
    /// # Errors
    /// Returns [`Error::Redirect`] when the caller is not authorized, or
    /// [`Error::Strategy`] when a strategy fails.
    pub fn require_authorization_to(
        &self,
        context: &mut RequestContext<'_>,
        role: Option<&RoleRequest>,
        failed_route: Option<&str>,
    ) -> Result<()> {
        if self.is_authorized(context, role)? {
            return Ok(());
        }

        let location = failed_route.unwrap_or_else(|| self.registry.failed_route());
        debug!("not authorized, redirecting to {location}");
        Err(Error::redirect(location, StatusCode::FOUND))
    }

    /// Log the caller in with the auth strategy.
    ///
    /// A refused login stores nothing and redirects to the failed route with
    /// `303 See Other` so the login form is not resubmitted.
    ///
    /// # Errors
    /// Returns [`Error::Redirect`] when the auth strategy refuses, or
    /// [`Error::Strategy`] when it fails.
    #[instrument(skip_all)]
    pub fn login(&self, context: &mut RequestContext<'_>) -> Result<()> {
        let user = (self.registry.auth_strategy())(context)
            .map_err(Error::strategy(StrategyKind::Auth))?;

        let Some(user) = user else {
            debug!("auth strategy refused login");
            return Err(Error::redirect(
                self.registry.failed_route(),
                StatusCode::SEE_OTHER,
            ));
        };

        let record = self.registry.serialize(&user);
        debug!(id = ?record.id(), "logged in");
        context
            .session()
            .set(self.registry.session_key(), record.into());

        Ok(())
    }

    /// Log the caller out: forget the remember token, delete the remember
    /// cookie, and destroy the whole session. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns [`Error::Strategy`] when the forget strategy fails; the cookie
    /// and session are cleared either way.
    #[instrument(skip_all)]
    pub fn logout(&self, context: &mut RequestContext<'_>) -> Result<()> {
        let forgotten = match context.secret_cookie(self.registry.remember_cookie()) {
            Some(token) => (self.registry.forget_strategy())(context, &token)
                .map_err(Error::strategy(StrategyKind::Forget)),
            None => Ok(()),
        };

        context.cookies().delete(self.registry.remember_cookie());
        context.session().destroy();
        debug!("logged out");

        forgotten
    }

    /// The credential record currently in the session, without any check.
    /// Call [`Self::is_authorized`] first in the same request to make sure it
    /// is populated.
    #[must_use]
    pub fn current_user(&self, context: &RequestContext<'_>) -> Option<SerializedUser> {
        context.session_user(self.registry.session_key())
    }

    fn resolve_user(&self, context: &mut RequestContext<'_>) -> Result<Option<SerializedUser>> {
        if let Some(user) = self.current_user(context) {
            return Ok(Some(user));
        }

        let Some(token) = context.secret_cookie(self.registry.remember_cookie()) else {
            return Ok(None);
        };

        let remembered = (self.registry.remember_strategy())(context, &token)
            .map_err(Error::strategy(StrategyKind::Remember))?;

        let Some(user) = remembered else {
            debug!("remember token not recognized");
            return Ok(None);
        };

        let record = self.registry.serialize(&user);
        debug!(id = ?record.id(), "logged in from remember token");
        context
            .session()
            .set(self.registry.session_key(), record.clone().into());

        Ok(Some(record))
    }

    fn check_role(
        &self,
        context: &RequestContext<'_>,
        user: &SerializedUser,
        role: &RoleRequest,
    ) -> Result<bool> {
        let strategy = match self.registry.role_strategy(role.name()) {
            Ok(strategy) => strategy,
            Err(err) => {
                warn!("{err}, denying");
                return Ok(false);
            }
        };

        let allowed = strategy(context, user, role.argument())
            .map_err(Error::strategy(StrategyKind::Role))?;
        debug!(role = role.name(), allowed, "role check");

        Ok(allowed)
    }
}
