//! # Sesh: persistence-backed sessions for tower applications
//!
//! `sesh` keeps server-side session records (an opaque payload, keyed by session
//! id, with an absolute expiry) in a pluggable storage backend, and exposes the
//! classic session handler contract on top of it: `open`, `read`, `write`,
//! `destroy`, `gc` and `close`.
//!
//! - Every `write` slides the record's expiry to now + `ttl_seconds`.
//! - Empty payloads are never stored; `write` reports them as `false`.
//! - `read`, `destroy` and `gc` never fail. A missing or expired session reads
//!   as an empty string.
//! - `gc` sweeps every record whose own expiry has passed.
//!
//! # Quick Start
//!
//! ```rust
//! use sesh::{SessionConfig, SessionStore};
//! use sesh::backend::MemoryBackend;
//! use sesh::clock::MockClock;
//! use std::sync::Arc;
//! use time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let clock = MockClock::default();
//! let store = SessionStore::new(Arc::new(MemoryBackend::new()), SessionConfig::default())
//!     .with_clock(Arc::new(clock.clone()));
//!
//! assert!(store.open("", "PHPSESSID"));
//! assert!(store.write("abc123", "uid=42").await);
//! assert_eq!(store.read("abc123").await, "uid=42");
//!
//! clock.advance(Duration::seconds(3601));
//! assert!(store.gc(0).await);
//! assert_eq!(store.read("abc123").await, "");
//! assert!(store.close());
//! # }
//! ```
//!
//! # With Axum
//!
//! [`SessionLayer`] drives the store for each request and hands handlers a
//! [`Session`]. It requires the `axum` feature (enabled by default).
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use sesh::{Session, SessionConfig, SessionLayer, SessionStore};
//! use sesh::backend::MemoryBackend;
//! use std::sync::Arc;
//! use tower_cookies::CookieManagerLayer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SessionConfig::build().session_name("SSOSESSID").gc_divisor(100);
//!     let store = SessionStore::new(Arc::new(MemoryBackend::new()), config);
//!
//!     let app = Router::new()
//!         .route("/", get(handler))
//!         .layer(SessionLayer::new(Arc::new(store)))
//!         .layer(CookieManagerLayer::new()); // CookieManagerLayer must be after
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//!
//! async fn handler(session: Session<MemoryBackend>) -> String {
//!     let count: Option<i32> = session.get("count").await.unwrap();
//!     let new_count = count.unwrap_or(0) + 1;
//!     session.insert("count", &new_count).await.unwrap();
//!     format!("You've visited this page {} times", new_count)
//! }
//! ```
//!
//! # Backends
//!
//! - [`MemoryBackend`](backend::MemoryBackend), always available, for tests and
//!   single-process deployments.
//! - `PostgresBackend`, with the `postgres-store` feature.
//! - `RedisBackend`, with the `redis-store` feature.
//!
//! Any type implementing [`StorageBackend`](backend::StorageBackend) can be
//! injected into a [`SessionStore`].
//!
//! ## Serialization
//!
//! [`Session`] encodes its fields into the opaque payload with one of:
//!
//! - [`bincode`](https://crates.io/crates/bincode) (default)
//! - [`rmp-serde`](https://crates.io/crates/rmp-serde) (MessagePack), with
//!   `default-features = false, features = ["axum", "messagepack"]`.
//!
//! # Important Notes
//!
//! ## Middleware Ordering
//! The `SessionLayer` must be applied **before** the `CookieManagerLayer`.

pub use cookie;

#[cfg(feature = "axum")]
mod extract;

#[cfg(feature = "redis-store")]
pub use fred;

#[cfg(feature = "postgres-store")]
pub use sqlx;

pub mod backend;
pub mod clock;

mod record;
pub use record::SessionRecord;

mod service;
pub use service::*;

mod session;
pub use session::*;

mod store;
pub use store::*;

pub use tower_cookies;
