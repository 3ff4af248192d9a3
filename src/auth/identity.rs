//! User representations accepted by the strategies.
//!
//! Strategies hand back whatever the user-storage layer produced. The engine
//! only needs two capabilities from it: read one attribute by name, and list
//! every attribute it exposes. Anything implementing [`Identity`] can be
//! serialized into a [`SerializedUser`](super::SerializedUser).

use serde::Serialize;
use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::debug;

/// Shared handle to a user as returned by the auth and remember strategies.
pub type Credentials = Arc<dyn Identity>;

/// Attribute access over an arbitrary user representation.
pub trait Identity: fmt::Debug + Send + Sync {
    /// Every externally visible attribute, keyed by name.
    fn attributes(&self) -> Map<String, Value>;

    /// Read a single attribute. `None` when the user does not expose it.
    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes().remove(name)
    }
}

impl Identity for Map<String, Value> {
    fn attributes(&self) -> Map<String, Value> {
        self.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Identity for HashMap<String, Value> {
    fn attributes(&self) -> Map<String, Value> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Only JSON objects expose attributes; scalars and arrays expose nothing.
impl Identity for Value {
    fn attributes(&self) -> Map<String, Value> {
        self.as_object().cloned().unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|object| object.get(name).cloned())
    }
}

/// Exposes the serialized fields of any `Serialize` model as its attributes.
///
/// ```
/// use authlane::auth::{Identity, Model};
///
/// #[derive(Debug, serde::Serialize)]
/// struct Account {
///     id: u64,
///     email: String,
/// }
///
/// let account = Model(Account { id: 7, email: "a@authlane.dev".into() });
/// assert_eq!(account.attribute("id"), Some(serde_json::json!(7)));
/// ```
#[derive(Clone, Debug)]
pub struct Model<T>(pub T);

impl<T> Identity for Model<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(&self.0) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                debug!("model serialized to a non-object value: {other}");
                Map::new()
            }
            Err(err) => {
                debug!("model could not be serialized: {err}");
                Map::new()
            }
        }
    }
}
