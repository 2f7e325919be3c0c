//! Session management middleware for tower applications.
//!
//! This module provides [`SessionLayer`] for integrating
//! session management into tower applications.

use http::{Request, Response};
use tower::{Layer, Service};
use tower_cookies::{Cookie, Cookies};

use crate::backend::StorageBackend;
use crate::{CookieOptions, Id, SessionStore, session::Inner};
use cookie::time::Duration;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

/// A Tower Middleware to use `Session`.
#[derive(Debug)]
pub struct SessionService<S, B: StorageBackend> {
    inner: S,
    cookie_options: Arc<CookieOptions>,
    store: Arc<SessionStore<B>>,
}

impl<S, B> Clone for SessionService<S, B>
where
    S: Clone,
    B: StorageBackend,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cookie_options: Arc::clone(&self.cookie_options),
            store: Arc::clone(&self.store),
        }
    }
}

impl<ReqBody, ResBody, S, B> Service<Request<ReqBody>> for SessionService<S, B>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    B: StorageBackend,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, B, ResBody>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let inner_session = Inner::new(Arc::clone(&self.store), Arc::clone(&self.cookie_options));
        let inner_session = Arc::new(inner_session);
        req.extensions_mut().insert(inner_session.clone());

        ResponseFuture {
            future: self.inner.call(req),
            inner_session,
            response: None,
            touch: None,
        }
    }
}

/// Layer to apply [`SessionService`] middleware.
///
/// Besides handing each request a [`Session`](crate::Session), the service
/// writes back a session that was read but left unchanged, so any activity
/// slides its expiry. It closes the store after every response and, with the
/// chance configured by
/// [`SessionConfig::should_collect`](crate::SessionConfig::should_collect),
/// spawns a [`SessionStore::gc`] sweep on the tokio runtime.
///
/// # Example
///
/// ```rust
/// use sesh::{CookieOptions, SessionConfig, SessionLayer, SessionStore};
/// use sesh::backend::MemoryBackend;
/// use std::sync::Arc;
///
/// let config = SessionConfig::build().session_name("test_sess").ttl_seconds(60);
/// let store = SessionStore::new(Arc::new(MemoryBackend::new()), config);
///
/// let cookie_options = CookieOptions::build()
///         .name("test_sess")
///         .http_only(true)
///         .same_site(cookie::SameSite::Lax)
///         .secure(true)
///         .max_age(60)
///         .path("/");
///
/// let session_layer = SessionLayer::new(Arc::new(store))
///     .with_cookie_options(cookie_options);
/// ```
#[derive(Debug)]
pub struct SessionLayer<B: StorageBackend> {
    cookie_options: Arc<CookieOptions>,
    store: Arc<SessionStore<B>>,
}

impl<B> Clone for SessionLayer<B>
where
    B: StorageBackend,
{
    fn clone(&self) -> Self {
        Self {
            cookie_options: Arc::clone(&self.cookie_options),
            store: Arc::clone(&self.store),
        }
    }
}

impl<B> SessionLayer<B>
where
    B: StorageBackend,
{
    /// Create a new session layer; the cookie is named after the store's
    /// `session_name` and lives for its `ttl_seconds`.
    pub fn new(store: Arc<SessionStore<B>>) -> Self {
        Self {
            cookie_options: Arc::new(CookieOptions::from_config(store.config())),
            store,
        }
    }

    /// Set the cookie options for the session layer.
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie_options = Arc::new(options);
        self
    }
}

impl<S, B> Layer<S> for SessionLayer<B>
where
    B: StorageBackend,
{
    type Service = SessionService<S, B>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            cookie_options: Arc::clone(&self.cookie_options),
            store: Arc::clone(&self.store),
        }
    }
}

type TouchFuture = Pin<Box<dyn Future<Output = bool> + Send>>;

pin_project! {
    /// Response future for [`SessionService`].
    pub struct ResponseFuture<F, B: StorageBackend, ResBody> {
        #[pin]
        future: F,
        inner_session: Arc<Inner<B>>,
        response: Option<Response<ResBody>>,
        // pending write-back of a session read but not changed
        touch: Option<TouchFuture>,
    }
}

impl<F, ResBody, E, B> Future for ResponseFuture<F, B, ResBody>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    B: StorageBackend,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if this.response.is_none() {
            let res = ready!(this.future.poll(cx)?);
            *this.touch = update_cookie(this.inner_session);
            *this.response = Some(res);
        }

        if let Some(touch) = this.touch.as_mut() {
            ready!(touch.as_mut().poll(cx));
            *this.touch = None;
        }

        let store = &this.inner_session.store;
        store.close();
        maybe_collect(store);

        let res = this
            .response
            .take()
            .expect("`ResponseFuture` polled after completion");
        Poll::Ready(Ok(res))
    }
}

/// Sets or removes the session cookie for the finished request.
///
/// A session that was read but neither changed nor deleted is returned as a
/// write of its current payload, which slides the stored expiry along with
/// the cookie.
fn update_cookie<B: StorageBackend>(inner_session: &Inner<B>) -> Option<TouchFuture> {
    let cookie_options = &inner_session.cookie_options;
    let cookies = inner_session.get_cookies();

    if inner_session.is_deleted() {
        if let Some(cookies) = cookies {
            let mut cookie = Cookie::build((cookie_options.name.clone(), ""));
            if let Some(path) = &cookie_options.path {
                cookie = cookie.path(path.clone());
            }
            cookies.remove(cookie.build());
        }
        return None;
    }

    let id = (*inner_session.id.read())?;

    if inner_session.is_changed() {
        if let Some(cookies) = cookies {
            build_cookie(&id, cookie_options, &cookies);
        }
        return None;
    }

    let payload = {
        let state = inner_session.state.try_lock().ok()?;
        let state = state.as_ref().filter(|state| !state.is_empty())?;
        match state.encode() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(err = %err, "failed to encode session for write-back");
                return None;
            }
        }
    };

    if let Some(cookies) = cookies {
        build_cookie(&id, cookie_options, &cookies);
    }

    let store = Arc::clone(&inner_session.store);
    Some(Box::pin(async move { store.write(&id.to_string(), &payload).await }))
}

fn maybe_collect<B: StorageBackend>(store: &Arc<SessionStore<B>>) {
    if !store.config().should_collect(&mut rand::rng()) {
        return;
    }

    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("no tokio runtime available, skipping session gc");
        return;
    };

    let store = Arc::clone(store);
    handle.spawn(async move {
        store.gc(store.config().ttl_seconds).await;
    });
}

fn build_cookie(id: &Id, cookie_options: &CookieOptions, cookies: &Cookies) {
    let cookie_builder = Cookie::build((cookie_options.name.clone(), id.to_string()))
        .secure(cookie_options.secure)
        .http_only(cookie_options.http_only)
        .same_site(cookie_options.same_site)
        .max_age(Duration::seconds(cookie_options.max_age));

    let cookie_builder = if let Some(domain) = &cookie_options.domain {
        cookie_builder.domain(domain.clone())
    } else {
        cookie_builder
    };

    let cookie_builder = if let Some(path) = &cookie_options.path {
        cookie_builder.path(path.clone())
    } else {
        cookie_builder
    };

    cookies.add(cookie_builder.build());
}
