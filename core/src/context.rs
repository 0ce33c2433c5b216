//! Resource context identification.
//!
//! A context is the namespace that scopes every lifecycle event of one
//! resource type (`"users"`, `"posts"`, ...). Two resources sharing a store
//! must use distinct contexts, otherwise their reducers would react to each
//! other's events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Error type for `Context` validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The context name was empty.
    #[error("Context name cannot be empty")]
    Empty,

    /// The context name contains a character reserved by the wire format.
    #[error("Context name {name:?} contains reserved character {found:?}")]
    ReservedCharacter {
        /// The rejected name.
        name: String,
        /// The offending character.
        found: char,
    },
}

/// Namespace for the lifecycle events of one resource type.
///
/// Cloning is cheap: the name is shared behind an `Arc`.
///
/// # Validation
///
/// The wire identifier of an event is `@<context>:<ACTION>_<PHASE>`, so a
/// context may not be empty and may not contain `@`, `:` or whitespace.
///
/// # Examples
///
/// ```
/// use crud_store_core::context::Context;
///
/// let users = Context::new("users").unwrap();
/// assert_eq!(users.as_str(), "users");
///
/// assert!(Context::new("bad:name").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Context(Arc<str>);

impl Context {
    /// Create a new context, validating the name.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the name is empty or contains `@`, `:` or
    /// whitespace.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ContextError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(ContextError::Empty);
        }
        if let Some(found) = name
            .chars()
            .find(|c| *c == '@' || *c == ':' || c.is_whitespace())
        {
            return Err(ContextError::ReservedCharacter {
                name: name.to_string(),
                found,
            });
        }
        Ok(Self(Arc::from(name)))
    }

    /// Get the context name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Context {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Context {
    type Error = ContextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Context> for String {
    fn from(context: Context) -> Self {
        context.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        let context = Context::new("blog-posts").unwrap();
        assert_eq!(context.to_string(), "blog-posts");
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(Context::new(""), Err(ContextError::Empty));
    }

    #[test]
    fn rejects_reserved_characters() {
        for name in ["@users", "users:x", "my users"] {
            assert!(
                matches!(
                    Context::new(name),
                    Err(ContextError::ReservedCharacter { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<Context, _> = serde_json::from_str("\"users\"");
        assert!(ok.is_ok());

        let bad: Result<Context, _> = serde_json::from_str("\"a:b\"");
        assert!(bad.is_err());
    }
}
