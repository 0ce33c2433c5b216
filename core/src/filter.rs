//! Loopback-style filter objects.
//!
//! Filters are passed through to the adapter unchanged. The only place the
//! core looks inside one is [`LoopbackFilter::where_only`], used when a list
//! request fans out into a count request.

use serde::{Deserialize, Serialize};

/// Relations to include, either a single name or a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Include {
    /// A single relation
    One(String),
    /// Several relations
    Many(Vec<String>),
}

/// A Loopback filter: `{ where, order, include, limit, skip }`.
///
/// # Example
///
/// ```
/// use crud_store_core::filter::LoopbackFilter;
/// use serde_json::json;
///
/// let filter = LoopbackFilter::new()
///     .with_where(json!({"active": true}))
///     .with_order("name DESC")
///     .with_limit(10);
///
/// assert_eq!(
///     serde_json::to_value(&filter).unwrap(),
///     json!({"where": {"active": true}, "order": "name DESC", "limit": 10})
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopbackFilter {
    /// Restriction clause
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<serde_json::Value>,

    /// Sort order as `"field direction"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Relations to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Include>,

    /// Maximum number of records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Number of records to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl LoopbackFilter {
    /// Create an empty filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `where` clause
    #[must_use]
    pub fn with_where(mut self, clause: serde_json::Value) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Set the sort order (`"field direction"`)
    #[must_use]
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the included relations
    #[must_use]
    pub fn with_include(mut self, include: Include) -> Self {
        self.include = Some(include);
        self
    }

    /// Set the page size
    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset
    #[must_use]
    pub const fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// A filter keeping only the `where` clause.
    ///
    /// Ordering, pagination and includes mean nothing to a count, so they are
    /// dropped. Returns `None` when there is no `where` clause at all.
    #[must_use]
    pub fn where_only(&self) -> Option<Self> {
        self.where_clause.as_ref().map(|clause| Self {
            where_clause: Some(clause.clone()),
            ..Self::default()
        })
    }

    /// Parse the `order` field into a sort specification.
    #[must_use]
    pub fn order_spec(&self) -> Option<OrderSpec> {
        self.order.as_deref().and_then(OrderSpec::parse)
    }
}

/// Sort direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// A parsed `"field direction"` order clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSpec {
    /// Field to sort by
    pub field: String,
    /// Direction to sort in
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Parse `"field"`, `"field ASC"` or `"field DESC"` (case-insensitive
    /// direction, any whitespace). Returns `None` for an empty clause.
    #[must_use]
    pub fn parse(order: &str) -> Option<Self> {
        let mut parts = order.split_whitespace();
        let field = parts.next()?.to_string();
        let direction = match parts.next() {
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        Some(Self { field, direction })
    }
}
