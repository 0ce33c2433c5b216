//! Action creators: the side-effecting half of a resource.
//!
//! An [`ActionCreator`] wraps a [`RequestAdapter`] and turns each adapter
//! operation into a lifecycle: it dispatches REQUEST, awaits the adapter and
//! dispatches SUCCESS or FAIL. Successful mutations can notify a success
//! callback and trigger a redirect; failures run the error handler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use crud_store_core::actions::{ActionCreator, CallOptions, CreateConfig};
//! use crud_store_core::adapter::RequestAdapter;
//! use crud_store_core::context::Context;
//! use crud_store_core::dispatch::SharedDispatcher;
//! use crud_store_core::filter::LoopbackFilter;
//! use serde_json::{Value, json};
//!
//! async fn run(
//!     adapter: Arc<dyn RequestAdapter<Value, Filter = LoopbackFilter>>,
//!     dispatcher: SharedDispatcher<Value>,
//! ) {
//!     let users = ActionCreator::builder(Context::new("users").unwrap(), adapter)
//!         .on_redirect(|url, _dispatcher| async move { println!("navigate to {url}") })
//!         .build();
//!
//!     let config = CreateConfig::new().with_redirect("/users/:id");
//!     let created = users
//!         .create(&dispatcher, &config, json!({"name": "a"}), CallOptions::new())
//!         .await;
//!     println!("{created:?}");
//! }
//! ```

use crate::adapter::RequestAdapter;
use crate::context::Context;
use crate::dispatch::SharedDispatcher;
use crate::environment::Confirm;
use crate::error::{ActionError, AdapterError};
use crate::lifecycle::{ActionKind, LifecycleEvent, SuccessPayload};
use crate::record::{DeleteResponse, PartialRecord, Record, RecordId};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Called with the target URL after a successful mutation.
pub type RedirectHandler<T> =
    Arc<dyn Fn(String, SharedDispatcher<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Called with every transport error, after the FAIL event.
pub type ErrorHandler<T> =
    Arc<dyn Fn(AdapterError, SharedDispatcher<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Called after a successful create, update, fetch or delete.
pub type SuccessHandler<T> = Arc<
    dyn Fn(ActionKind, SharedDispatcher<T>, SuccessPayload<T>) -> BoxFuture<'static, ()>
        + Send
        + Sync,
>;

/// Transforms a request body before it reaches the adapter.
pub type Middleware<B, T> = Arc<
    dyn Fn(B, SharedDispatcher<T>) -> BoxFuture<'static, Result<B, AdapterError>> + Send + Sync,
>;

/// When the success callback runs relative to the SUCCESS event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuccessOrdering {
    /// Dispatch SUCCESS, then await the callback
    #[default]
    EventFirst,
    /// Await the callback, then dispatch SUCCESS
    CallbackFirst,
}

/// Per-call options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Redirect URL overriding the configured one (`:id` is substituted)
    pub redirect: Option<String>,
    /// Skip the redirect entirely
    pub skip_redirect: bool,
}

impl CallOptions {
    /// No override, redirect enabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect to `url` instead of the configured URL
    #[must_use]
    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect = Some(url.into());
        self
    }

    /// Do not redirect after this call
    #[must_use]
    pub const fn skip_redirect(mut self) -> Self {
        self.skip_redirect = true;
        self
    }

    fn redirect_target<'a>(&'a self, configured: Option<&'a str>) -> Option<&'a str> {
        if self.skip_redirect {
            return None;
        }
        self.redirect.as_deref().or(configured)
    }
}

/// Configuration of a create or update action.
///
/// `B` is the body type the middleware sees: the record for creates, a
/// [`PartialRecord`] for updates.
pub struct MutationConfig<B, T> {
    redirect: Option<String>,
    middleware: Option<Middleware<B, T>>,
    request_after_middleware: bool,
}

/// Configuration of a create action
pub type CreateConfig<T> = MutationConfig<T, T>;

/// Configuration of an update action
pub type UpdateConfig<T> = MutationConfig<PartialRecord, T>;

impl<B, T> MutationConfig<B, T> {
    /// No redirect, no middleware, REQUEST dispatched before the middleware
    #[must_use]
    pub const fn new() -> Self {
        Self {
            redirect: None,
            middleware: None,
            request_after_middleware: false,
        }
    }

    /// Redirect after success (`:id` is replaced by the record id)
    #[must_use]
    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect = Some(url.into());
        self
    }

    /// Run `middleware` on the body before calling the adapter.
    ///
    /// The middleware receives the dispatcher and may dispatch events of
    /// its own. An error takes the FAIL path.
    #[must_use]
    pub fn with_middleware<M, Fut>(mut self, middleware: M) -> Self
    where
        M: Fn(B, SharedDispatcher<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<B, AdapterError>> + Send + 'static,
    {
        self.middleware = Some(Arc::new(move |body: B, dispatcher: SharedDispatcher<T>| {
            middleware(body, dispatcher).boxed()
        }));
        self
    }

    /// Dispatch REQUEST only once the middleware has resolved
    #[must_use]
    pub const fn with_request_after_middleware(mut self, after: bool) -> Self {
        self.request_after_middleware = after;
        self
    }

    /// The configured redirect URL
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }
}

impl<B, T> Default for MutationConfig<B, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T> Clone for MutationConfig<B, T> {
    fn clone(&self) -> Self {
        Self {
            redirect: self.redirect.clone(),
            middleware: self.middleware.clone(),
            request_after_middleware: self.request_after_middleware,
        }
    }
}

/// Configuration of a delete action.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteConfig<F> {
    redirect: Option<String>,
    confirmation: Option<String>,
    refresh: Option<Option<F>>,
}

impl<F> DeleteConfig<F> {
    /// No redirect, no confirmation, no refresh
    #[must_use]
    pub const fn new() -> Self {
        Self {
            redirect: None,
            confirmation: None,
            refresh: None,
        }
    }

    /// Redirect after success (`:id` is replaced by the deleted id)
    #[must_use]
    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect = Some(url.into());
        self
    }

    /// Ask `question` before deleting
    #[must_use]
    pub fn with_confirmation(mut self, question: impl Into<String>) -> Self {
        self.confirmation = Some(question.into());
        self
    }

    /// Re-run list-and-count with `filter` after a successful delete
    #[must_use]
    pub fn with_refresh(mut self, filter: Option<F>) -> Self {
        self.refresh = Some(filter);
        self
    }
}

impl<F> Default for DeleteConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ActionCreator`].
pub struct ActionCreatorBuilder<T, F> {
    context: Context,
    adapter: Arc<dyn RequestAdapter<T, Filter = F>>,
    on_redirect: Option<RedirectHandler<T>>,
    error_handler: Option<ErrorHandler<T>>,
    on_success: Option<SuccessHandler<T>>,
    confirm: Option<Arc<dyn Confirm>>,
    suppress_reject: bool,
    success_ordering: SuccessOrdering,
}

impl<T, F> ActionCreatorBuilder<T, F>
where
    T: Record,
    F: Clone + Send + Sync + 'static,
{
    /// Handler invoked with the redirect URL after successful mutations
    #[must_use]
    pub fn on_redirect<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(String, SharedDispatcher<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_redirect = Some(Arc::new(move |url: String, dispatcher: SharedDispatcher<T>| {
            handler(url, dispatcher).boxed()
        }));
        self
    }

    /// Handler invoked with every transport error
    #[must_use]
    pub fn error_handler<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(AdapterError, SharedDispatcher<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.error_handler = Some(Arc::new(
            move |error: AdapterError, dispatcher: SharedDispatcher<T>| {
                handler(error, dispatcher).boxed()
            },
        ));
        self
    }

    /// Callback invoked after successful create, update, fetch and delete
    #[must_use]
    pub fn on_success<H, Fut>(mut self, handler: H) -> Self
    where
        H: Fn(ActionKind, SharedDispatcher<T>, SuccessPayload<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_success = Some(Arc::new(
            move |action: ActionKind, dispatcher: SharedDispatcher<T>, data: SuccessPayload<T>| {
                handler(action, dispatcher, data).boxed()
            },
        ));
        self
    }

    /// Capability asked before confirmed deletes
    #[must_use]
    pub fn confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Resolve failed creates and updates with `None` instead of an error
    #[must_use]
    pub const fn suppress_reject(mut self, suppress: bool) -> Self {
        self.suppress_reject = suppress;
        self
    }

    /// Choose when the success callback runs
    #[must_use]
    pub const fn success_ordering(mut self, ordering: SuccessOrdering) -> Self {
        self.success_ordering = ordering;
        self
    }

    /// Build the action creator
    #[must_use]
    pub fn build(self) -> ActionCreator<T, F> {
        ActionCreator {
            context: self.context,
            adapter: self.adapter,
            on_redirect: self.on_redirect,
            error_handler: self.error_handler,
            on_success: self.on_success,
            confirm: self.confirm,
            suppress_reject: self.suppress_reject,
            success_ordering: self.success_ordering,
        }
    }
}

/// Lifecycle-dispatching operations for one resource.
///
/// Cheap to clone: the adapter and handlers are shared.
pub struct ActionCreator<T, F> {
    context: Context,
    adapter: Arc<dyn RequestAdapter<T, Filter = F>>,
    on_redirect: Option<RedirectHandler<T>>,
    error_handler: Option<ErrorHandler<T>>,
    on_success: Option<SuccessHandler<T>>,
    confirm: Option<Arc<dyn Confirm>>,
    suppress_reject: bool,
    success_ordering: SuccessOrdering,
}

impl<T, F> Clone for ActionCreator<T, F> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            adapter: Arc::clone(&self.adapter),
            on_redirect: self.on_redirect.clone(),
            error_handler: self.error_handler.clone(),
            on_success: self.on_success.clone(),
            confirm: self.confirm.clone(),
            suppress_reject: self.suppress_reject,
            success_ordering: self.success_ordering,
        }
    }
}

impl<T, F> ActionCreator<T, F>
where
    T: Record,
    F: Clone + Send + Sync + 'static,
{
    /// Start building an action creator for `context` over `adapter`.
    #[must_use]
    pub fn builder(
        context: Context,
        adapter: Arc<dyn RequestAdapter<T, Filter = F>>,
    ) -> ActionCreatorBuilder<T, F> {
        ActionCreatorBuilder {
            context,
            adapter,
            on_redirect: None,
            error_handler: None,
            on_success: None,
            confirm: None,
            suppress_reject: false,
            success_ordering: SuccessOrdering::default(),
        }
    }

    /// The resource context
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// List records and, concurrently, count them.
    ///
    /// The count runs on its own task and settles independently; its failure
    /// never affects the list result.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Transport`] if listing fails.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the count is spawned
    /// onto the current runtime.
    #[tracing::instrument(skip_all, fields(context = %self.context))]
    pub async fn list_and_count(
        &self,
        dispatcher: &SharedDispatcher<T>,
        filter: Option<F>,
    ) -> Result<Vec<T>, ActionError> {
        self.request(dispatcher, ActionKind::List).await;
        self.request(dispatcher, ActionKind::Count).await;
        self.spawn_count(dispatcher, filter.clone());

        match self.adapter.get_all(filter).await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "Listed records");
                dispatcher
                    .dispatch(LifecycleEvent::success(
                        self.context.clone(),
                        SuccessPayload::Listed(records.clone()),
                    ))
                    .await;
                Ok(records)
            },
            Err(error) => Err(self.fail(dispatcher, ActionKind::List, error).await.into()),
        }
    }

    /// Fetch one record by id.
    ///
    /// Redirects only when `options` carries a redirect URL.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Transport`] if the adapter fails.
    #[tracing::instrument(skip_all, fields(context = %self.context, %id))]
    pub async fn fetch(
        &self,
        dispatcher: &SharedDispatcher<T>,
        id: RecordId,
        filter: Option<F>,
        options: CallOptions,
    ) -> Result<T, ActionError> {
        self.request(dispatcher, ActionKind::Fetch).await;

        match self.adapter.get_by_id(id, filter).await {
            Ok(record) => {
                let target = options.redirect_target(None);
                self.succeed(dispatcher, SuccessPayload::Fetched(record.clone()), target, record.id())
                    .await;
                Ok(record)
            },
            Err(error) => Err(self.fail(dispatcher, ActionKind::Fetch, error).await.into()),
        }
    }

    /// Create a record.
    ///
    /// Resolves with `None` when the adapter fails and rejections are
    /// suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Transport`] if the middleware or the adapter
    /// fails and rejections are not suppressed.
    #[tracing::instrument(skip_all, fields(context = %self.context))]
    pub async fn create(
        &self,
        dispatcher: &SharedDispatcher<T>,
        config: &CreateConfig<T>,
        body: T,
        options: CallOptions,
    ) -> Result<Option<T>, ActionError> {
        let result = match self
            .prepare_body(dispatcher, ActionKind::Create, config, body)
            .await
        {
            Ok(body) => self.adapter.create(body).await,
            Err(error) => Err(error),
        };
        self.settle_mutation(dispatcher, ActionKind::Create, config.redirect(), &options, result)
            .await
    }

    /// Apply a partial update to a record.
    ///
    /// Resolves with `None` when the adapter fails and rejections are
    /// suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Transport`] if the middleware or the adapter
    /// fails and rejections are not suppressed.
    #[tracing::instrument(skip_all, fields(context = %self.context, %id))]
    pub async fn update(
        &self,
        dispatcher: &SharedDispatcher<T>,
        config: &UpdateConfig<T>,
        id: RecordId,
        patch: PartialRecord,
        options: CallOptions,
    ) -> Result<Option<T>, ActionError> {
        let result = match self
            .prepare_body(dispatcher, ActionKind::Update, config, patch)
            .await
        {
            Ok(patch) => self.adapter.update(id, patch).await,
            Err(error) => Err(error),
        };
        self.settle_mutation(dispatcher, ActionKind::Update, config.redirect(), &options, result)
            .await
    }

    /// Delete a record, optionally after confirmation.
    ///
    /// A declined confirmation (or a confirmation question without a
    /// [`Confirm`] capability) dispatches nothing and never reaches the
    /// adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Cancelled`] if the delete was not confirmed and
    /// [`ActionError::Transport`] if the adapter fails.
    ///
    /// # Panics
    ///
    /// With a refresh configured, panics if called outside a Tokio runtime
    /// (see [`ActionCreator::list_and_count`]).
    #[tracing::instrument(skip_all, fields(context = %self.context, %id))]
    pub async fn delete(
        &self,
        dispatcher: &SharedDispatcher<T>,
        config: &DeleteConfig<F>,
        id: RecordId,
        options: CallOptions,
    ) -> Result<DeleteResponse, ActionError> {
        if let Some(question) = config.confirmation.as_deref() {
            let confirmed = match &self.confirm {
                Some(confirm) => confirm.confirm(question).await,
                None => {
                    tracing::warn!("Delete needs confirmation but no confirm capability is set");
                    false
                },
            };
            if !confirmed {
                tracing::warn!("Delete cancelled");
                return Err(ActionError::Cancelled);
            }
        }

        self.request(dispatcher, ActionKind::Delete).await;

        let deleted = match self.adapter.delete(id).await {
            Ok(deleted) => deleted,
            Err(error) => {
                return Err(self.fail(dispatcher, ActionKind::Delete, error).await.into());
            },
        };

        let target = options.redirect_target(config.redirect.as_deref());
        let deleted_id = deleted.id.clone();
        self.succeed(dispatcher, SuccessPayload::Deleted(deleted.clone()), target, Some(deleted_id))
            .await;

        if let Some(filter) = &config.refresh {
            if let Err(error) = self.list_and_count(dispatcher, filter.clone()).await {
                tracing::debug!(%error, "Refresh after delete failed");
            }
        }

        Ok(deleted)
    }

    /// The reset event for this resource.
    #[must_use]
    pub fn clean(&self) -> LifecycleEvent<T> {
        LifecycleEvent::clean(self.context.clone())
    }

    async fn request(&self, dispatcher: &SharedDispatcher<T>, action: ActionKind) {
        tracing::debug!(%action, "Dispatching request");
        dispatcher
            .dispatch(LifecycleEvent::request(self.context.clone(), action))
            .await;
    }

    fn spawn_count(&self, dispatcher: &SharedDispatcher<T>, filter: Option<F>) {
        let context = self.context.clone();
        let adapter = Arc::clone(&self.adapter);
        let error_handler = self.error_handler.clone();
        let dispatcher = Arc::clone(dispatcher);

        tokio::spawn(async move {
            match adapter.count(filter).await {
                Ok(count) => {
                    tracing::debug!(%context, count = count.count, "Counted records");
                    dispatcher
                        .dispatch(LifecycleEvent::success(context, SuccessPayload::Counted(count)))
                        .await;
                },
                Err(error) => {
                    report_failure(&context, &dispatcher, error_handler.as_ref(), ActionKind::Count, error)
                        .await;
                },
            }
        });
    }

    async fn prepare_body<B>(
        &self,
        dispatcher: &SharedDispatcher<T>,
        action: ActionKind,
        config: &MutationConfig<B, T>,
        body: B,
    ) -> Result<B, AdapterError> {
        if !config.request_after_middleware {
            self.request(dispatcher, action).await;
        }

        let body = match &config.middleware {
            Some(middleware) => middleware(body, Arc::clone(dispatcher)).await?,
            None => body,
        };

        if config.request_after_middleware {
            self.request(dispatcher, action).await;
        }
        Ok(body)
    }

    async fn settle_mutation(
        &self,
        dispatcher: &SharedDispatcher<T>,
        action: ActionKind,
        configured_redirect: Option<&str>,
        options: &CallOptions,
        result: Result<T, AdapterError>,
    ) -> Result<Option<T>, ActionError> {
        match result {
            Ok(record) => {
                let payload = if action == ActionKind::Create {
                    SuccessPayload::Created(record.clone())
                } else {
                    SuccessPayload::Updated(record.clone())
                };
                let target = options.redirect_target(configured_redirect);
                self.succeed(dispatcher, payload, target, record.id()).await;
                Ok(Some(record))
            },
            Err(error) => {
                let error = self.fail(dispatcher, action, error).await;
                if self.suppress_reject {
                    Ok(None)
                } else {
                    Err(error.into())
                }
            },
        }
    }

    async fn succeed(
        &self,
        dispatcher: &SharedDispatcher<T>,
        payload: SuccessPayload<T>,
        redirect: Option<&str>,
        id: Option<RecordId>,
    ) {
        let action = payload.action();
        let event = LifecycleEvent::success(self.context.clone(), payload.clone());

        match self.success_ordering {
            SuccessOrdering::EventFirst => {
                dispatcher.dispatch(event).await;
                self.notify_success(dispatcher, action, payload).await;
            },
            SuccessOrdering::CallbackFirst => {
                self.notify_success(dispatcher, action, payload).await;
                dispatcher.dispatch(event).await;
            },
        }

        if let (Some(url), Some(on_redirect)) = (redirect, &self.on_redirect) {
            let url = substitute_id(url, id.as_ref());
            tracing::debug!(%url, "Redirecting");
            on_redirect(url, Arc::clone(dispatcher)).await;
        }
    }

    async fn notify_success(
        &self,
        dispatcher: &SharedDispatcher<T>,
        action: ActionKind,
        payload: SuccessPayload<T>,
    ) {
        if let Some(on_success) = &self.on_success {
            on_success(action, Arc::clone(dispatcher), payload).await;
        }
    }

    async fn fail(
        &self,
        dispatcher: &SharedDispatcher<T>,
        action: ActionKind,
        error: AdapterError,
    ) -> AdapterError {
        report_failure(&self.context, dispatcher, self.error_handler.as_ref(), action, error).await
    }
}

async fn report_failure<T>(
    context: &Context,
    dispatcher: &SharedDispatcher<T>,
    error_handler: Option<&ErrorHandler<T>>,
    action: ActionKind,
    error: AdapterError,
) -> AdapterError {
    tracing::warn!(%context, %action, %error, "Request failed");
    dispatcher
        .dispatch(LifecycleEvent::fail(context.clone(), action))
        .await;
    if let Some(handler) = error_handler {
        handler(error.clone(), Arc::clone(dispatcher)).await;
    }
    error
}

/// Replace the first `:id` placeholder in `url`.
fn substitute_id(url: &str, id: Option<&RecordId>) -> String {
    match id {
        Some(id) => url.replacen(":id", &id.to_string(), 1),
        None => {
            if url.contains(":id") {
                tracing::warn!(%url, "Record has no id, redirect placeholder left as is");
            }
            url.to_string()
        },
    }
}
