//! # Crud Store Loopback
//!
//! A [`RequestAdapter`](crud_store_core::adapter::RequestAdapter) speaking to a
//! Loopback-style REST API over `reqwest`.
//!
//! Filters travel as JSON in the `filter` query parameter; counts only
//! forward the `where` clause. Non-2xx answers become
//! [`AdapterError::Http`](crud_store_core::error::AdapterError::Http), transport
//! failures and timeouts become `Request`, and undecodable bodies `Decode`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use crud_store_core::actions::ActionCreator;
//! use crud_store_core::context::Context;
//! use crud_store_loopback::{LoopbackAdapter, LoopbackConfig};
//! use serde_json::Value;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = LoopbackAdapter::<Value>::new(LoopbackConfig::from_env()?)?;
//! let users = ActionCreator::builder(Context::new("users")?, Arc::new(adapter)).build();
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;

pub use adapter::LoopbackAdapter;
pub use config::{ConfigError, LoopbackConfig};
