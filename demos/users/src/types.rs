//! Record types of the demo.

use crud_store_core::record::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Assigned by the backend on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// Whether the user administers the site
    #[serde(default)]
    pub admin: bool,
    /// Set by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Set by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// A new, unsaved user
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

impl Record for User {
    fn id(&self) -> Option<RecordId> {
        self.id.clone()
    }
}

/// A blog post written by a user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Assigned by the backend on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Headline
    pub title: String,
    /// Id of the writing user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<RecordId>,
}

impl Post {
    /// A new, unsaved post
    #[must_use]
    pub fn new(title: impl Into<String>, author_id: Option<RecordId>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author_id,
        }
    }
}

impl Record for Post {
    fn id(&self) -> Option<RecordId> {
        self.id.clone()
    }
}
