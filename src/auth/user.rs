//! Credential record stored in the session for a logged in user.
//!
//! A [`SerializedUser`] either copies a fixed set of fields out of the user
//! returned by a strategy, or keeps the whole user and reads through to it.
//! Both shapes answer lookups the same way, and both refuse writes to the
//! identifier field once built.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::identity::{Credentials, Identity};

/// Name of the identifier field. It can never be written after construction.
pub const ID_FIELD: &str = "id";

#[derive(Clone, Debug)]
enum Stored {
    /// The user as returned by the strategy, plus local writes layered on top.
    Whole {
        user: Credentials,
        overrides: Map<String, Value>,
    },
    /// Only the configured fields, copied at construction.
    Fields(Map<String, Value>),
}

/// Hash-like and attribute-like access to a logged in user's exposed data.
#[derive(Clone, Debug)]
pub struct SerializedUser {
    stored: Stored,
}

impl SerializedUser {
    /// Serialize `user`, keeping only `fields`. An empty field list keeps the
    /// whole user. Fields the user does not expose are stored as null.
    pub fn new<S: AsRef<str>>(user: Credentials, fields: &[S]) -> Self {
        if fields.is_empty() {
            return Self::whole(user);
        }

        let selected = fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                (
                    field.to_string(),
                    user.attribute(field).unwrap_or(Value::Null),
                )
            })
            .collect();

        Self {
            stored: Stored::Fields(selected),
        }
    }

    /// Keep `user` verbatim.
    #[must_use]
    pub fn whole(user: Credentials) -> Self {
        Self {
            stored: Stored::Whole {
                user,
                overrides: Map::new(),
            },
        }
    }

    /// Read a field. Missing and null fields both read as `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = match &self.stored {
            Stored::Fields(fields) => fields.get(key).cloned(),
            Stored::Whole { user, overrides } => overrides
                .get(key)
                .cloned()
                .or_else(|| user.attribute(key)),
        };
        value.filter(|value| !value.is_null())
    }

    /// Write a field. Writes to [`ID_FIELD`] are dropped.
    pub fn set(&mut self, key: &str, value: Value) {
        if key == ID_FIELD {
            debug!("ignoring write to immutable field `{ID_FIELD}`");
            return;
        }

        match &mut self.stored {
            Stored::Fields(fields) => {
                fields.insert(key.to_string(), value);
            }
            Stored::Whole { overrides, .. } => {
                overrides.insert(key.to_string(), value);
            }
        }
    }

    /// The identifier, if the user has one.
    #[must_use]
    pub fn id(&self) -> Option<Value> {
        self.get(ID_FIELD)
    }

    /// Dump every stored field into a string-keyed map.
    ///
    /// For a whole user this is the user's own attribute listing with local
    /// writes applied.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        match &self.stored {
            Stored::Fields(fields) => fields.clone(),
            Stored::Whole { user, overrides } => {
                let mut attributes = user.attributes();
                for (key, value) in overrides {
                    attributes.insert(key.clone(), value.clone());
                }
                attributes
            }
        }
    }

    /// Whether the record was restricted to a field list.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        matches!(self.stored, Stored::Fields(_))
    }
}

impl Identity for SerializedUser {
    fn attributes(&self) -> Map<String, Value> {
        self.to_map()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}

impl From<Credentials> for SerializedUser {
    fn from(user: Credentials) -> Self {
        Self::whole(user)
    }
}

impl From<Value> for SerializedUser {
    fn from(user: Value) -> Self {
        Self::whole(Arc::new(user))
    }
}
