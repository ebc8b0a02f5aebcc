//! Session cookie handling.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};

use super::AppState;
use crate::record::Draft;
use crate::session::SessionId;

/// The caller's session, resolved from the request cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Session named by a well-formed cookie, if any.
    pub id: Option<SessionId>,
    /// Current draft for that session, if one is held and not expired.
    pub draft: Option<Draft>,
}

impl SessionContext {
    /// The existing session id, or a freshly generated one.
    ///
    /// The flag is true when the id is new and a cookie has to be set.
    #[must_use]
    pub fn id_or_new(&self) -> (SessionId, bool) {
        match self.id {
            Some(id) => (id, false),
            None => (SessionId::new(), true),
        }
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = session_from_headers(&parts.headers, state.cookie_name());
        let draft = id.and_then(|id| state.drafts().get(id));
        Ok(Self { id, draft })
    }
}

/// Find the session id in the request's `Cookie` headers.
///
/// Unparseable values are ignored, so a stale or forged cookie behaves like
/// no cookie.
pub(crate) fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// `Set-Cookie` value binding the browser to `id`.
///
/// Returns `None` if `cookie_name` cannot appear in a header.
pub(crate) fn session_cookie(cookie_name: &str, id: SessionId) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{cookie_name}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}
