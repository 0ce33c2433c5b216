//! Lifecycle events: the vocabulary shared by action creators and reducers.
//!
//! Every operation on a resource goes through three phases: a REQUEST event
//! is dispatched before the adapter is called, then exactly one of SUCCESS
//! or FAIL once it settles. A separate CLEAN event resets the resource.
//!
//! Inside the crate events are a closed enum. The string identifiers
//! `@<context>:<ACTION>_<PHASE>` only exist at the serialization boundary,
//! see [`WireEvent`].

use crate::context::{Context, ContextError};
use crate::record::{CountResponse, DeleteResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The operation an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    /// Create a record
    Create,
    /// Update a record
    Update,
    /// Delete a record
    Delete,
    /// Fetch a single record by id
    Fetch,
    /// List records
    List,
    /// Count records
    Count,
}

impl ActionKind {
    /// Every action kind, in wire order
    pub const ALL: [Self; 6] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Fetch,
        Self::List,
        Self::Count,
    ];

    /// Wire name of the action (`"CREATE"`, `"LIST"`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Fetch => "FETCH",
            Self::List => "LIST",
            Self::Count => "COUNT",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The operation started
    Request,
    /// The operation resolved
    Success,
    /// The operation rejected
    Fail,
}

impl Phase {
    /// Every phase, in wire order
    pub const ALL: [Self; 3] = [Self::Request, Self::Success, Self::Fail];

    /// Wire name of the phase
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried by a SUCCESS event, typed per action.
#[derive(Clone, Debug, PartialEq)]
pub enum SuccessPayload<T> {
    /// `CREATE_SUCCESS`: the created record
    Created(T),
    /// `FETCH_SUCCESS`: the fetched record
    Fetched(T),
    /// `UPDATE_SUCCESS`: the updated record
    Updated(T),
    /// `DELETE_SUCCESS`: the id of the removed record
    Deleted(DeleteResponse),
    /// `LIST_SUCCESS`: one page of records
    Listed(Vec<T>),
    /// `COUNT_SUCCESS`: the total count
    Counted(CountResponse),
}

impl<T> SuccessPayload<T> {
    /// The action this payload answers
    #[must_use]
    pub const fn action(&self) -> ActionKind {
        match self {
            Self::Created(_) => ActionKind::Create,
            Self::Fetched(_) => ActionKind::Fetch,
            Self::Updated(_) => ActionKind::Update,
            Self::Deleted(_) => ActionKind::Delete,
            Self::Listed(_) => ActionKind::List,
            Self::Counted(_) => ActionKind::Count,
        }
    }
}

impl<T: Serialize> SuccessPayload<T> {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Created(record) | Self::Fetched(record) | Self::Updated(record) => {
                serde_json::to_value(record)
            },
            Self::Deleted(deleted) => serde_json::to_value(deleted),
            Self::Listed(records) => serde_json::to_value(records),
            Self::Counted(count) => serde_json::to_value(count),
        }
    }
}

impl<T: DeserializeOwned> SuccessPayload<T> {
    fn from_json(action: ActionKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match action {
            ActionKind::Create => Self::Created(serde_json::from_value(value)?),
            ActionKind::Fetch => Self::Fetched(serde_json::from_value(value)?),
            ActionKind::Update => Self::Updated(serde_json::from_value(value)?),
            ActionKind::Delete => Self::Deleted(serde_json::from_value(value)?),
            ActionKind::List => Self::Listed(serde_json::from_value(value)?),
            ActionKind::Count => Self::Counted(serde_json::from_value(value)?),
        })
    }
}

/// What happened, without the context.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind<T> {
    /// An operation started
    Request(ActionKind),
    /// An operation resolved with data
    Success(SuccessPayload<T>),
    /// An operation rejected (error details stay with the error handler)
    Fail(ActionKind),
    /// Reset the resource to its initial state
    Clean,
}

/// A lifecycle event for one resource context.
///
/// # Example
///
/// ```
/// use crud_store_core::context::Context;
/// use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
///
/// let users = Context::new("users").unwrap();
/// let event = LifecycleEvent::<serde_json::Value>::request(users, ActionKind::Create);
/// assert_eq!(event.type_string(), "@users:CREATE_REQUEST");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleEvent<T> {
    /// Resource namespace
    pub context: Context,
    /// Phase and payload
    pub kind: EventKind<T>,
}

impl<T> LifecycleEvent<T> {
    /// `@<context>:<ACTION>_REQUEST`
    #[must_use]
    pub const fn request(context: Context, action: ActionKind) -> Self {
        Self {
            context,
            kind: EventKind::Request(action),
        }
    }

    /// `@<context>:<ACTION>_SUCCESS` with its payload
    #[must_use]
    pub const fn success(context: Context, payload: SuccessPayload<T>) -> Self {
        Self {
            context,
            kind: EventKind::Success(payload),
        }
    }

    /// `@<context>:<ACTION>_FAIL`
    #[must_use]
    pub const fn fail(context: Context, action: ActionKind) -> Self {
        Self {
            context,
            kind: EventKind::Fail(action),
        }
    }

    /// `@<context>:CLEAN`
    #[must_use]
    pub const fn clean(context: Context) -> Self {
        Self {
            context,
            kind: EventKind::Clean,
        }
    }

    /// The action this event belongs to (`None` for CLEAN)
    #[must_use]
    pub const fn action(&self) -> Option<ActionKind> {
        match &self.kind {
            EventKind::Request(action) | EventKind::Fail(action) => Some(*action),
            EventKind::Success(payload) => Some(payload.action()),
            EventKind::Clean => None,
        }
    }

    /// The phase of this event (`None` for CLEAN)
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match &self.kind {
            EventKind::Request(_) => Some(Phase::Request),
            EventKind::Success(_) => Some(Phase::Success),
            EventKind::Fail(_) => Some(Phase::Fail),
            EventKind::Clean => None,
        }
    }

    /// Whether this event is the given action in the given phase
    #[must_use]
    pub fn is(&self, action: ActionKind, phase: Phase) -> bool {
        self.action() == Some(action) && self.phase() == Some(phase)
    }

    /// The wire identifier, e.g. `@users:LIST_SUCCESS`
    #[must_use]
    pub fn type_string(&self) -> String {
        match (self.action(), self.phase()) {
            (Some(action), Some(phase)) => type_string(&self.context, action, phase),
            _ => format!("@{}:CLEAN", self.context),
        }
    }
}

impl<T: Serialize> LifecycleEvent<T> {
    /// Convert to the `{type, payload?}` wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Payload`] if the payload cannot be serialized.
    pub fn to_wire(&self) -> Result<WireEvent, WireError> {
        let payload = match &self.kind {
            EventKind::Success(payload) => Some(
                payload
                    .to_json()
                    .map_err(|e| WireError::Payload(e.to_string()))?,
            ),
            EventKind::Request(_) | EventKind::Fail(_) | EventKind::Clean => None,
        };

        Ok(WireEvent {
            event_type: self.type_string(),
            payload,
        })
    }
}

impl<T> fmt::Display for LifecycleEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_string())
    }
}

/// Build the wire identifier `@<context>:<ACTION>_<PHASE>`.
#[must_use]
pub fn type_string(context: &Context, action: ActionKind, phase: Phase) -> String {
    format!("@{context}:{action}_{phase}")
}

/// Errors decoding a [`WireEvent`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The identifier does not have the `@<context>:<NAME>` shape
    #[error("Malformed event type: {0}")]
    Malformed(String),

    /// The context part is invalid
    #[error("Invalid context in event type: {0}")]
    Context(#[from] ContextError),

    /// The action part is not a known action
    #[error("Unknown action {action:?} in event type {event_type}")]
    UnknownAction {
        /// The full identifier
        event_type: String,
        /// The unrecognized action
        action: String,
    },

    /// The phase part is not a known phase
    #[error("Unknown phase {phase:?} in event type {event_type}")]
    UnknownPhase {
        /// The full identifier
        event_type: String,
        /// The unrecognized phase
        phase: String,
    },

    /// A SUCCESS event arrived without payload
    #[error("Missing payload for {0}")]
    MissingPayload(String),

    /// The payload did not match the action's shape
    #[error("Payload error: {0}")]
    Payload(String),
}

/// Serialized form of a lifecycle event: `{ "type": ..., "payload": ... }`.
///
/// Decoding accepts both `CLEAN` and the older `CLEAR` reset identifier;
/// encoding always produces `CLEAN`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// `@<context>:<ACTION>_<PHASE>` or `@<context>:CLEAN`
    #[serde(rename = "type")]
    pub event_type: String,

    /// Payload of SUCCESS events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl WireEvent {
    /// Decode into a typed lifecycle event.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] when the identifier is malformed, names an
    /// unknown action or phase, or when a SUCCESS payload is missing or does
    /// not deserialize into the action's payload type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<LifecycleEvent<T>, WireError> {
        let malformed = || WireError::Malformed(self.event_type.clone());

        let rest = self.event_type.strip_prefix('@').ok_or_else(malformed)?;
        let (context, name) = rest.split_once(':').ok_or_else(malformed)?;
        let context = Context::new(context)?;

        if name == "CLEAN" || name == "CLEAR" {
            return Ok(LifecycleEvent::clean(context));
        }

        let (action, phase) = name.rsplit_once('_').ok_or_else(malformed)?;
        let action = ActionKind::parse(action).ok_or_else(|| WireError::UnknownAction {
            event_type: self.event_type.clone(),
            action: action.to_string(),
        })?;
        let phase = Phase::parse(phase).ok_or_else(|| WireError::UnknownPhase {
            event_type: self.event_type.clone(),
            phase: phase.to_string(),
        })?;

        Ok(match phase {
            Phase::Request => LifecycleEvent::request(context, action),
            Phase::Fail => LifecycleEvent::fail(context, action),
            Phase::Success => {
                let payload = self
                    .payload
                    .clone()
                    .ok_or_else(|| WireError::MissingPayload(self.event_type.clone()))?;
                let payload = SuccessPayload::from_json(action, payload)
                    .map_err(|e| WireError::Payload(e.to_string()))?;
                LifecycleEvent::success(context, payload)
            },
        })
    }
}
