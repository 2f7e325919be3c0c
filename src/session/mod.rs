//! Request-scoped access to a session.
//!
//! [`Session`] is the handle a request handler works with. It drives the
//! [`SessionStore`] the way a host session manager would: the payload is read
//! lazily on first access, every mutation is written back through
//! [`SessionStore::write`], and logout goes through [`SessionStore::destroy`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::MappedMutexGuard;
use tower_cookies::Cookies;

use crate::SessionStore;
use crate::backend::StorageBackend;
use crate::store::WriteError;

mod cookie_options;
mod id;
mod state;

pub use cookie_options::CookieOptions;
pub use id::Id;
pub use state::SessionState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Encoding failed with: {0}")]
    Encode(String),

    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("session was not saved: {0}")]
    NotSaved(#[from] WriteError),
}

type Result<T> = std::result::Result<T, Error>;

/// A lazily loaded session bound to one request.
#[derive(Debug)]
pub struct Session<B: StorageBackend> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Session<B>
where
    B: StorageBackend,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> Session<B>
where
    B: StorageBackend,
{
    /// Creates a new `Session` instance.
    pub fn new(inner: Arc<Inner<B>>) -> Self {
        Self { inner }
    }

    /// Returns the session ID, if one has been received or generated.
    pub fn id(&self) -> Option<Id> {
        *self.inner.id.read()
    }

    /// Returns the cookie options for this session.
    pub fn cookie_options(&self) -> &CookieOptions {
        &self.inner.cookie_options
    }

    /// Retrieves a field from the session.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::{Router, routing::get};
    /// use sesh::Session;
    /// use sesh::backend::MemoryBackend;
    ///
    /// let _: Router<()> = Router::new()
    ///     .route("/whoami", get(|session: Session<MemoryBackend>| async move {
    ///         let uid: Option<i64> = session.get("uid").await.unwrap();
    ///         uid.map(|uid| uid.to_string()).unwrap_or_default()
    ///     }));
    /// ```
    #[tracing::instrument(name = "getting session field", skip(self))]
    pub async fn get<T>(&self, field: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.state().await.get(field).map_err(|err| {
            tracing::error!(err = %err, "failed to decode session field");
            err
        })
    }

    /// Returns a copy of every field in the session.
    pub async fn get_all(&self) -> SessionState {
        self.state().await.clone()
    }

    /// Sets `field` to `value` and writes the session back.
    ///
    /// A session ID is generated if the request did not carry one.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::{Router, routing::get};
    /// use sesh::Session;
    /// use sesh::backend::MemoryBackend;
    ///
    /// let _: Router<()> = Router::new()
    ///     .route("/login", get(|session: Session<MemoryBackend>| async move {
    ///         session.regenerate().await.unwrap();
    ///         session.insert("uid", &42_i64).await.unwrap();
    ///     }));
    /// ```
    #[tracing::instrument(name = "inserting session field", skip(self, value))]
    pub async fn insert<T>(&self, field: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let id = self.id_or_gen();
        let mut state = self.state().await;

        let mut next = state.clone();
        next.insert(field, value)?;
        self.persist(&id, &next).await?;

        *state = next;
        self.changed();
        Ok(())
    }

    /// Removes `field` from the session; the session is destroyed once no
    /// field is left.
    ///
    /// Returns `true` if the field was present.
    #[tracing::instrument(name = "removing session field", skip(self))]
    pub async fn remove(&self, field: &str) -> Result<bool> {
        let Some(id) = self.id() else {
            return Ok(false);
        };

        let mut state = self.state().await;
        if !state.contains(field) {
            return Ok(false);
        }

        let mut next = state.clone();
        next.remove(field);
        if next.is_empty() {
            self.inner.store.destroy(&id.to_string()).await;
            self.deleted();
        } else {
            self.persist(&id, &next).await?;
            self.changed();
        }

        *state = next;
        Ok(true)
    }

    /// Deletes the entire session from the store.
    ///
    /// Returns `true` if the request carried a session to delete.
    #[tracing::instrument(name = "deleting session", skip(self))]
    pub async fn delete(&self) -> bool {
        let Some(id) = self.id() else {
            return false;
        };

        let mut state = self.inner.state.lock().await;
        self.inner.store.destroy(&id.to_string()).await;
        *state = Some(SessionState::new());
        self.deleted();

        true
    }

    /// Moves the session to a freshly generated ID, so an ID known before a
    /// privilege change (like logging in) stops working afterwards.
    ///
    /// Returns the new ID.
    #[tracing::instrument(name = "regenerating the session id", skip(self))]
    pub async fn regenerate(&self) -> Result<Id> {
        let old_id = self.id();
        let new_id = Id::default();
        let state = self.state().await;

        if !state.is_empty() {
            self.persist(&new_id, &state).await?;
        }
        if let Some(old_id) = old_id {
            self.inner.store.destroy(&old_id.to_string()).await;
        }

        *self.inner.id.write() = Some(new_id);
        self.inner.deleted.store(false, Ordering::Relaxed);
        self.changed();

        Ok(new_id)
    }

    /// Locks the request's view of the session, reading it through the store
    /// on first use.
    async fn state(&self) -> MappedMutexGuard<'_, SessionState> {
        let mut guard = self.inner.state.lock().await;

        if guard.is_none() {
            let loaded = match self.id() {
                Some(id) => self.load(&id).await,
                None => SessionState::new(),
            };
            *guard = Some(loaded);
        }

        tokio::sync::MutexGuard::map(guard, |state| state.get_or_insert_default())
    }

    async fn load(&self, id: &Id) -> SessionState {
        let store = &self.inner.store;
        store.open("", &store.config().session_name);

        let payload = store.read(&id.to_string()).await;
        SessionState::decode(&payload).unwrap_or_else(|err| {
            tracing::warn!(err = %err, "discarding undecodable session payload");
            SessionState::new()
        })
    }

    async fn persist(&self, id: &Id, state: &SessionState) -> Result<()> {
        let payload = state.encode()?;
        self.inner
            .store
            .write_detailed(&id.to_string(), &payload)
            .await?;
        Ok(())
    }

    fn changed(&self) {
        self.inner.changed.store(true, Ordering::Relaxed);
    }

    fn deleted(&self) {
        self.inner.deleted.store(true, Ordering::Relaxed);
    }

    fn id_or_gen(&self) -> Id {
        let mut id_guard = self.inner.id.write();
        *id_guard.get_or_insert_with(Id::default)
    }
}

/// Per-request session state shared between the middleware and the handler.
#[derive(Debug)]
pub struct Inner<B: StorageBackend> {
    pub id: RwLock<Option<Id>>,
    // `None` until the payload has been read
    pub state: tokio::sync::Mutex<Option<SessionState>>,
    // set when the session was written under its current id
    pub changed: AtomicBool,
    // set when the session is deleted
    pub deleted: AtomicBool,
    pub cookie_options: Arc<CookieOptions>,
    pub cookies: Mutex<Option<Cookies>>,
    pub store: Arc<SessionStore<B>>,
}

impl<B> Inner<B>
where
    B: StorageBackend,
{
    pub fn new(store: Arc<SessionStore<B>>, cookie_options: Arc<CookieOptions>) -> Self {
        Self {
            id: RwLock::new(None),
            state: tokio::sync::Mutex::new(None),
            changed: AtomicBool::new(false),
            deleted: AtomicBool::new(false),
            cookie_options,
            cookies: Mutex::new(None),
            store,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::Relaxed)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Relaxed)
    }

    pub fn get_cookies(&self) -> Option<Cookies> {
        self.cookies.lock().clone()
    }
}
