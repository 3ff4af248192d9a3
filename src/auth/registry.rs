//! Strategy registry and engine settings.
//!
//! A [`Registry`] is built once at startup, wrapped in an `Arc`, and handed to
//! [`AuthLane::new`](super::AuthLane::new). Request handling only reads it.

use anyhow::Result;
use secrecy::SecretString;
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};

use super::{
    context::RequestContext,
    error::Error,
    identity::Credentials,
    role::DEFAULT_ROLE,
    strategy::{
        self, AuthStrategy, ForgetStrategy, RememberStrategy, RoleStrategy, UserSerializer,
    },
    user::{SerializedUser, ID_FIELD},
};

pub const DEFAULT_SESSION_KEY: &str = "authlane";
pub const DEFAULT_REMEMBER_COOKIE: &str = "authlane.token";
pub const DEFAULT_FAILED_ROUTE: &str = "/user/unauthorized";

/// How a strategy's user becomes the record kept in the session.
#[derive(Clone)]
pub enum SerializeUser {
    /// Copy these fields; an empty list keeps the whole user.
    Fields(Vec<String>),
    /// Hand the user to a custom serializer.
    With(UserSerializer),
}

impl Default for SerializeUser {
    fn default() -> Self {
        Self::Fields(vec![ID_FIELD.to_string()])
    }
}

impl fmt::Debug for SerializeUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::With(_) => f.write_str("With(..)"),
        }
    }
}

/// What to do when a check is made without a role request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefaultRoleCheck {
    /// Being logged in is enough.
    #[default]
    Skip,
    /// Ask the default role strategy with no argument.
    Enforce,
}

#[derive(Clone)]
pub struct Registry {
    session_key: String,
    remember_cookie: String,
    failed_route: String,
    serialize_user: SerializeUser,
    default_role_check: DefaultRoleCheck,
    auth_strategy: AuthStrategy,
    role_strategies: HashMap<String, RoleStrategy>,
    remember_strategy: RememberStrategy,
    forget_strategy: ForgetStrategy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        let mut role_strategies = HashMap::new();
        role_strategies.insert(DEFAULT_ROLE.to_string(), strategy::permit_role());

        Self {
            session_key: DEFAULT_SESSION_KEY.to_string(),
            remember_cookie: DEFAULT_REMEMBER_COOKIE.to_string(),
            failed_route: DEFAULT_FAILED_ROUTE.to_string(),
            serialize_user: SerializeUser::default(),
            default_role_check: DefaultRoleCheck::default(),
            auth_strategy: strategy::refuse_auth(),
            role_strategies,
            remember_strategy: strategy::refuse_remember(),
            forget_strategy: strategy::ignore_forget(),
        }
    }

    #[must_use]
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    #[must_use]
    pub fn with_remember_cookie(mut self, name: impl Into<String>) -> Self {
        self.remember_cookie = name.into();
        self
    }

    #[must_use]
    pub fn with_failed_route(mut self, route: impl Into<String>) -> Self {
        self.failed_route = route.into();
        self
    }

    /// Serialize only `fields` into the session. An empty list keeps the
    /// whole user.
    #[must_use]
    pub fn with_serialize_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.serialize_user = SerializeUser::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&Credentials) -> SerializedUser + Send + Sync + 'static,
    {
        self.serialize_user = SerializeUser::With(Arc::new(serializer));
        self
    }

    #[must_use]
    pub fn with_default_role_check(mut self, check: DefaultRoleCheck) -> Self {
        self.default_role_check = check;
        self
    }

    pub fn set_auth_strategy<F>(&mut self, f: F) -> AuthStrategy
    where
        F: Fn(&mut RequestContext<'_>) -> Result<Option<Credentials>> + Send + Sync + 'static,
    {
        self.auth_strategy = Arc::new(f);
        self.auth_strategy.clone()
    }

    /// Register the role strategy used for [`DEFAULT_ROLE`].
    pub fn set_role_strategy<F>(&mut self, f: F) -> RoleStrategy
    where
        F: Fn(&RequestContext<'_>, &SerializedUser, Option<&Value>) -> Result<bool>
            + Send
            + Sync
            + 'static,
    {
        self.set_named_role_strategy(DEFAULT_ROLE, f)
    }

    /// Insert or replace the role strategy registered under `name`.
    pub fn set_named_role_strategy<F>(&mut self, name: impl Into<String>, f: F) -> RoleStrategy
    where
        F: Fn(&RequestContext<'_>, &SerializedUser, Option<&Value>) -> Result<bool>
            + Send
            + Sync
            + 'static,
    {
        let strategy: RoleStrategy = Arc::new(f);
        self.role_strategies.insert(name.into(), strategy.clone());
        strategy
    }

    pub fn set_remember_strategy<F>(&mut self, f: F) -> RememberStrategy
    where
        F: Fn(&mut RequestContext<'_>, &SecretString) -> Result<Option<Credentials>>
            + Send
            + Sync
            + 'static,
    {
        self.remember_strategy = Arc::new(f);
        self.remember_strategy.clone()
    }

    pub fn set_forget_strategy<F>(&mut self, f: F) -> ForgetStrategy
    where
        F: Fn(&mut RequestContext<'_>, &SecretString) -> Result<()> + Send + Sync + 'static,
    {
        self.forget_strategy = Arc::new(f);
        self.forget_strategy.clone()
    }

    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    #[must_use]
    pub fn remember_cookie(&self) -> &str {
        &self.remember_cookie
    }

    #[must_use]
    pub fn failed_route(&self) -> &str {
        &self.failed_route
    }

    #[must_use]
    pub fn serialize_user(&self) -> &SerializeUser {
        &self.serialize_user
    }

    #[must_use]
    pub fn default_role_check(&self) -> DefaultRoleCheck {
        self.default_role_check
    }

    #[must_use]
    pub fn auth_strategy(&self) -> &AuthStrategy {
        &self.auth_strategy
    }

    /// Look up a role strategy by name.
    ///
    /// # Errors
    /// Returns [`Error::UnknownRole`] when nothing is registered under `name`.
    pub fn role_strategy(&self, name: &str) -> Result<&RoleStrategy, Error> {
        self.role_strategies
            .get(name)
            .ok_or_else(|| Error::UnknownRole(name.to_string()))
    }

    /// Registered role names, sorted.
    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.role_strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn remember_strategy(&self) -> &RememberStrategy {
        &self.remember_strategy
    }

    #[must_use]
    pub fn forget_strategy(&self) -> &ForgetStrategy {
        &self.forget_strategy
    }

    /// Build the session record for `user` using the configured selection.
    #[must_use]
    pub fn serialize(&self, user: &Credentials) -> SerializedUser {
        match &self.serialize_user {
            SerializeUser::Fields(fields) => SerializedUser::new(user.clone(), fields),
            SerializeUser::With(serializer) => serializer(user),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("session_key", &self.session_key)
            .field("remember_cookie", &self.remember_cookie)
            .field("failed_route", &self.failed_route)
            .field("serialize_user", &self.serialize_user)
            .field("default_role_check", &self.default_role_check)
            .field("role_strategies", &self.role_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        context::{MemorySession, Params},
        cookie::CookieJar,
    };
    use serde_json::json;

    #[test]
    fn defaults() {
        let registry = Registry::new();
        assert_eq!(registry.session_key(), "authlane");
        assert_eq!(registry.remember_cookie(), "authlane.token");
        assert_eq!(registry.failed_route(), "/user/unauthorized");
        assert_eq!(registry.default_role_check(), DefaultRoleCheck::Skip);
        assert_eq!(registry.role_names(), vec![DEFAULT_ROLE]);
        assert!(matches!(
            registry.serialize_user(),
            SerializeUser::Fields(fields) if fields == &vec!["id".to_string()]
        ));
    }

    #[test]
    fn builders_override_settings() {
        let registry = Registry::new()
            .with_session_key("user")
            .with_remember_cookie("remember")
            .with_failed_route("/login")
            .with_serialize_fields(["id", "rank"])
            .with_default_role_check(DefaultRoleCheck::Enforce);
        assert_eq!(registry.session_key(), "user");
        assert_eq!(registry.remember_cookie(), "remember");
        assert_eq!(registry.failed_route(), "/login");
        assert_eq!(registry.default_role_check(), DefaultRoleCheck::Enforce);
        assert!(matches!(
            registry.serialize_user(),
            SerializeUser::Fields(fields) if fields.len() == 2
        ));
    }

    #[test]
    fn setters_return_the_stored_strategy() {
        let mut registry = Registry::new();
        let mut session = MemorySession::new();
        let mut cookies = CookieJar::new();
        let params = Params::new();
        let mut context = RequestContext::new(&mut session, &mut cookies, &params);
        let token = SecretString::from("tok".to_string());

        let auth = registry.set_auth_strategy(|_| Ok(Some(Arc::new(json!({"id": 1})))));
        assert!(Arc::ptr_eq(&auth, registry.auth_strategy()));
        assert!(auth(&mut context).unwrap().is_some());

        let remember = registry.set_remember_strategy(|_, _| Ok(Some(Arc::new(json!({"id": 2})))));
        assert!(Arc::ptr_eq(&remember, registry.remember_strategy()));
        assert!(remember(&mut context, &token).unwrap().is_some());

        let forget = registry.set_forget_strategy(|_, _| Ok(()));
        assert!(Arc::ptr_eq(&forget, registry.forget_strategy()));
    }

    #[test]
    fn named_role_strategies_are_independent() {
        let mut registry = Registry::new();
        let ops = registry.set_named_role_strategy("ops", |_, _, _| Ok(false));
        registry.set_role_strategy(|_, _, _| Ok(true));

        assert_eq!(registry.role_names(), vec!["ops", "roles"]);
        assert!(Arc::ptr_eq(
            &ops,
            registry.role_strategy("ops").unwrap()
        ));
        assert!(matches!(
            registry.role_strategy("missing"),
            Err(Error::UnknownRole(name)) if name == "missing"
        ));
    }

    #[test]
    fn serialize_applies_field_selection() {
        let user: Credentials = Arc::new(json!({"id": 1, "name": "tester"}));

        let restricted = Registry::new().serialize(&user);
        assert_eq!(restricted.get("id"), Some(json!(1)));
        assert_eq!(restricted.get("name"), None);

        let whole = Registry::new()
            .with_serialize_fields(Vec::<String>::new())
            .serialize(&user);
        assert_eq!(whole.get("name"), Some(json!("tester")));
    }

    #[test]
    fn serialize_uses_custom_serializer() {
        let user: Credentials = Arc::new(json!({"id": 1, "name": "tester"}));
        let registry = Registry::new().with_serializer(|user| {
            SerializedUser::new(user.clone(), &["name"])
        });
        let record = registry.serialize(&user);
        assert_eq!(record.get("name"), Some(json!("tester")));
        assert_eq!(record.get("id"), None);
    }
}
