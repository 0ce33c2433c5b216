//! # Crud Store Local
//!
//! An in-process reactive document database and a
//! [`RequestAdapter`](crud_store_core::adapter::RequestAdapter) over it, for
//! resources that live on the client instead of behind a REST API.
//!
//! ## Core Components
//!
//! - **[`LocalDatabase`]**: named collections of JSON documents keyed by `id`
//! - **[`Query`]**: `find` / `find_one` builder with `where_filter`, `sort`,
//!   `limit` and `skip`, evaluated by `exec` or kept live by `watch`
//! - **[`ChangeEvent`]**: every committed write, broadcast by
//!   [`Collection::changes`]
//! - **[`LocalAdapter`]**: maps Loopback filters and CRUD calls onto a
//!   collection, stamping ids and timestamps

pub mod adapter;
pub mod database;
pub mod error;
pub mod query;
pub mod selector;

pub use adapter::{DatabaseFuture, LocalAdapter};
pub use database::{ChangeEvent, Collection, Document, LocalDatabase};
pub use error::LocalError;
pub use query::Query;
