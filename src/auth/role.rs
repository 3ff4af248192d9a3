//! Role requests passed to the authorization checks.

use serde_json::Value;
use tracing::warn;

/// Name the default role strategy is registered under.
pub const DEFAULT_ROLE: &str = "roles";

/// A named permission check, optionally parameterized.
#[derive(Clone, Debug, PartialEq)]
pub enum RoleRequest {
    /// Check the role strategy `name` with no argument.
    Named(String),
    /// Check the role strategy `name`, passing it `argument`.
    WithArgument { name: String, argument: Value },
}

impl RoleRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn with_argument(name: impl Into<String>, argument: Value) -> Self {
        Self::WithArgument {
            name: name.into(),
            argument,
        }
    }

    /// The default role strategy with no argument.
    #[must_use]
    pub fn default_role() -> Self {
        Self::named(DEFAULT_ROLE)
    }

    /// Parse a role request from JSON: a bare string names a role, a
    /// single-entry object maps a role name to its argument.
    ///
    /// `null` means no role was asked for. Anything else, including objects
    /// naming several roles at once, is not a role request and yields `None`
    /// with a warning, so the caller skips the role check.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self::named(name.as_str())),
            Value::Object(map) if map.len() == 1 => map
                .iter()
                .next()
                .map(|(name, argument)| Self::with_argument(name.as_str(), argument.clone())),
            Value::Object(map) => {
                warn!(
                    "role request names {} roles; only one role is checked per call, skipping",
                    map.len()
                );
                None
            }
            Value::Null => None,
            other => {
                warn!("ignoring malformed role request: {other}");
                None
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::WithArgument { name, .. } => name,
        }
    }

    #[must_use]
    pub fn argument(&self) -> Option<&Value> {
        match self {
            Self::Named(_) => None,
            Self::WithArgument { argument, .. } => Some(argument),
        }
    }
}

impl From<&str> for RoleRequest {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for RoleRequest {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl<S: Into<String>> From<(S, Value)> for RoleRequest {
    fn from((name, argument): (S, Value)) -> Self {
        Self::with_argument(name, argument)
    }
}
