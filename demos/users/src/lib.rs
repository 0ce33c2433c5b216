//! Users example for crud-store.
//!
//! Two resources, users and posts, share one store. Each gets an action
//! creator over the configured [`Backend`] and a resource reducer scoped to
//! its own field of [`AppState`].

pub mod backend;
pub mod types;

pub use backend::{Backend, SharedAdapter};
pub use types::{Post, User};

use crud_store_core::actions::ActionCreator;
use crud_store_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use crud_store_core::context::Context;
use crud_store_core::environment::Confirm;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::lifecycle::LifecycleEvent;
use crud_store_core::reducer::ResourceReducer;
use crud_store_core::state::ResourceState;
use crud_store_runtime::Store;
use futures::future::BoxFuture;
use std::future::ready;
use std::sync::Arc;

/// State of the whole application
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Users resource
    pub users: ResourceState<User>,
    /// Posts resource
    pub posts: ResourceState<Post>,
}

/// Every action the store accepts
#[derive(Clone, Debug)]
pub enum AppAction {
    /// Lifecycle event of the users resource
    Users(LifecycleEvent<User>),
    /// Lifecycle event of the posts resource
    Posts(LifecycleEvent<Post>),
}

impl From<LifecycleEvent<User>> for AppAction {
    fn from(event: LifecycleEvent<User>) -> Self {
        Self::Users(event)
    }
}

impl From<LifecycleEvent<Post>> for AppAction {
    fn from(event: LifecycleEvent<Post>) -> Self {
        Self::Posts(event)
    }
}

/// The demo store
pub type AppStore = Store<AppState, AppAction, CombinedReducer<AppState, AppAction>>;

/// Context and collection name of the users resource
pub const USERS: &str = "users";

/// Context and collection name of the posts resource
pub const POSTS: &str = "posts";

/// Root reducer: one resource reducer per field.
///
/// # Errors
///
/// Fails if a resource name is not a valid context.
pub fn app_reducer() -> anyhow::Result<CombinedReducer<AppState, AppAction>> {
    Ok(combine_reducers(vec![
        Box::new(scope_reducer(
            ResourceReducer::new(Context::new(USERS)?, User::default()),
            |s: &AppState| &s.users,
            |s: &mut AppState, users| s.users = users,
            |a: &AppAction| match a {
                AppAction::Users(event) => Some(event.clone()),
                AppAction::Posts(_) => None,
            },
        )),
        Box::new(scope_reducer(
            ResourceReducer::new(Context::new(POSTS)?, Post::default()),
            |s: &AppState| &s.posts,
            |s: &mut AppState, posts| s.posts = posts,
            |a: &AppAction| match a {
                AppAction::Posts(event) => Some(event.clone()),
                AppAction::Users(_) => None,
            },
        )),
    ]))
}

/// An empty store.
///
/// # Errors
///
/// See [`app_reducer`].
pub fn app_store() -> anyhow::Result<AppStore> {
    Ok(Store::new(AppState::default(), app_reducer()?))
}

/// Action creators of the demo.
#[derive(Clone)]
pub struct Resources {
    /// Users action creator
    pub users: ActionCreator<User, LoopbackFilter>,
    /// Posts action creator
    pub posts: ActionCreator<Post, LoopbackFilter>,
}

impl Resources {
    /// Build both action creators over `backend`.
    ///
    /// Transport errors are logged and redirects are logged as navigation.
    /// `confirm` answers confirmed deletes.
    ///
    /// # Errors
    ///
    /// Fails if an adapter cannot be built.
    pub fn new(backend: &Backend, confirm: Arc<dyn Confirm>) -> anyhow::Result<Self> {
        let users = ActionCreator::builder(Context::new(USERS)?, backend.adapter::<User>(USERS)?)
            .error_handler(|error, _| {
                tracing::warn!(%error, "Users request failed");
                ready(())
            })
            .on_redirect(|url, _| {
                tracing::info!(%url, "Navigate");
                ready(())
            })
            .confirm(Arc::clone(&confirm))
            .build();

        let posts = ActionCreator::builder(Context::new(POSTS)?, backend.adapter::<Post>(POSTS)?)
            .error_handler(|error, _| {
                tracing::warn!(%error, "Posts request failed");
                ready(())
            })
            .confirm(confirm)
            .build();

        Ok(Self { users, posts })
    }
}

/// Answers yes to every question, logging it.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm<'a>(&'a self, question: &'a str) -> BoxFuture<'a, bool> {
        tracing::info!(question, "Confirmed");
        Box::pin(ready(true))
    }
}
