//! Strategy function types and their unconfigured defaults.
//!
//! Unconfigured deployments refuse authentication (auth and remember return
//! no user) but permit authorization (the default role strategy returns
//! `true` for any already logged in user).

use anyhow::Result;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;

use super::{context::RequestContext, identity::Credentials, user::SerializedUser};

/// Logs a user in from the request, e.g. by checking submitted form fields.
/// `Ok(None)` means the login was refused.
pub type AuthStrategy =
    Arc<dyn Fn(&mut RequestContext<'_>) -> Result<Option<Credentials>> + Send + Sync>;

/// Decides whether the logged in user satisfies a role, given an optional
/// argument from the role request.
pub type RoleStrategy = Arc<
    dyn Fn(&RequestContext<'_>, &SerializedUser, Option<&Value>) -> Result<bool> + Send + Sync,
>;

/// Resolves a remember-me token into a user. `Ok(None)` means the token
/// was not recognized.
pub type RememberStrategy = Arc<
    dyn Fn(&mut RequestContext<'_>, &SecretString) -> Result<Option<Credentials>> + Send + Sync,
>;

/// Invalidates a remember-me token on the backend at logout.
pub type ForgetStrategy =
    Arc<dyn Fn(&mut RequestContext<'_>, &SecretString) -> Result<()> + Send + Sync>;

/// Builds the record stored in the session from a strategy's user.
pub type UserSerializer = Arc<dyn Fn(&Credentials) -> SerializedUser + Send + Sync>;

pub(crate) fn refuse_auth() -> AuthStrategy {
    Arc::new(|_| Ok(None))
}

pub(crate) fn permit_role() -> RoleStrategy {
    Arc::new(|_, _, _| Ok(true))
}

pub(crate) fn refuse_remember() -> RememberStrategy {
    Arc::new(|_, _| Ok(None))
}

pub(crate) fn ignore_forget() -> ForgetStrategy {
    Arc::new(|_, _| Ok(()))
}
