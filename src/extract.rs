use std::sync::Arc;

use axum_core::extract::FromRequestParts;
use http::{StatusCode, request::Parts};
use tower_cookies::Cookies;

use crate::backend::StorageBackend;
use crate::session::Inner;
use crate::{Id, Session};

/// Axum Extractor for [`Session`].
impl<S, B> FromRequestParts<S> for Session<B>
where
    S: Sync + Send,
    B: StorageBackend,
{
    type Rejection = (StatusCode, &'static str);

    #[tracing::instrument(name = "session", skip(parts, _state))]
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let inner_session = parts
            .extensions
            .get::<Arc<Inner<B>>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("session layer not found in the request extensions");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session not found in the request",
                )
            })?;

        let cookies = parts.extensions.get::<Cookies>().cloned().ok_or_else(|| {
            tracing::error!("cookies not found in the request extensions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "cookies not found in the request",
            )
        })?;

        let session_id = cookies
            .get(&inner_session.cookie_options.name)
            .and_then(|cookie| {
                cookie
                    .value()
                    .parse::<Id>()
                    .map_err(|err| {
                        tracing::warn!(
                            err = %err,
                            "possibly suspicious activity: malformed session id"
                        )
                    })
                    .ok()
            });

        *inner_session.cookies.lock() = Some(cookies);

        // A second extraction in the same request must not clobber an id the
        // handler already generated or regenerated.
        let mut id = inner_session.id.write();
        if id.is_none() {
            *id = session_id;
        }
        drop(id);

        Ok(Session::new(inner_session))
    }
}
