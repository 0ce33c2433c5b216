//! Where the demo's records live.

use crud_store_core::adapter::RequestAdapter;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::record::Record;
use crud_store_local::{LocalAdapter, LocalDatabase};
use crud_store_loopback::{ConfigError, LoopbackAdapter, LoopbackConfig};
use std::fmt;
use std::sync::Arc;

/// Adapter type shared by every resource of the demo
pub type SharedAdapter<T> = Arc<dyn RequestAdapter<T, Filter = LoopbackFilter>>;

/// The backend all resources talk to.
#[derive(Clone, Debug)]
pub enum Backend {
    /// An in-process database
    Local(Arc<LocalDatabase>),
    /// A Loopback REST API; `base_url` is the API root, e.g. `http://host/api`
    Loopback(LoopbackConfig),
}

impl Backend {
    /// A fresh in-process database called `name`
    #[must_use]
    pub fn local(name: &str) -> Self {
        Self::Local(Arc::new(LocalDatabase::new(name)))
    }

    /// The REST API named by `CRUD_STORE_API_URL`, or a local database when
    /// the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the variables are set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        match LoopbackConfig::from_env() {
            Ok(config) => Ok(Self::Loopback(config)),
            Err(ConfigError::MissingEnv(var)) => {
                tracing::info!(var, "No API configured, using a local database");
                Ok(Self::local("users-demo"))
            },
            Err(error) => Err(error),
        }
    }

    /// Adapter for `collection` (`users`, `posts`, ...).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the Loopback client cannot be built.
    pub fn adapter<T: Record>(&self, collection: &str) -> Result<SharedAdapter<T>, ConfigError> {
        match self {
            Self::Local(database) => Ok(Arc::new(LocalAdapter::<T>::from_database(
                Arc::clone(database),
                collection,
            ))),
            Self::Loopback(api) => {
                let config = LoopbackConfig {
                    base_url: format!("{}/{collection}", api.base_url),
                    ..api.clone()
                };
                Ok(Arc::new(LoopbackAdapter::<T>::new(config)?))
            },
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(database) => write!(f, "local database '{}'", database.name()),
            Self::Loopback(api) => write!(f, "Loopback API at {}", api.base_url),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn local_adapters_share_one_database() {
        let backend = Backend::local("test");
        let writer = backend.adapter::<Value>("users").unwrap();
        let reader = backend.adapter::<Value>("users").unwrap();

        writer.create(json!({"name": "a"})).await.unwrap();

        assert_eq!(reader.count(None).await.unwrap().count, 1);
        assert_eq!(backend.adapter::<Value>("posts").unwrap().count(None).await.unwrap().count, 0);
    }

    #[test]
    fn loopback_adapters_append_the_collection() {
        let backend = Backend::Loopback(LoopbackConfig::new("http://localhost:3000/api/"));
        assert!(backend.adapter::<Value>("users").is_ok());
        assert_eq!(backend.to_string(), "Loopback API at http://localhost:3000/api");
    }
}
