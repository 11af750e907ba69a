use crate::{
    config::SessionConfig,
    log::SESSION,
    session::SessionData,
    Portal,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use tracing::debug;

///
/// The visitor's session, looked up from the session cookie.
///
/// A request without a live session gets an empty one. Nothing is stored until the session is
/// first authenticated.
///
#[derive(Debug)]
pub struct Session {
    token: Option<String>,
    pub data: SessionData,
}

#[async_trait]
impl FromRequestParts<Portal> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, portal: &Portal) -> Result<Self, Self::Rejection> {
        let cookie_name = &portal.config.session.cookie_name;

        let Some(token) = cookie_value(&parts.headers, cookie_name) else {
            return Ok(Session::empty());
        };

        match portal.sessions.load(&token).await {
            Some(data) => Ok(Session {
                token: Some(token),
                data,
            }),
            None => {
                debug!(target: SESSION, msg = "Unknown or expired session cookie");
                Ok(Session::empty())
            }
        }
    }
}

impl Session {
    fn empty() -> Session {
        Session {
            token: None,
            data: SessionData::default(),
        }
    }

    ///
    /// Authenticate for exactly `record_id`.
    ///
    /// The session is stored under a fresh token and any previous one is dropped.
    /// Returns the `Set-Cookie` value for the new token.
    ///
    pub async fn authenticate(self, portal: &Portal, record_id: &str) -> String {
        if let Some(token) = &self.token {
            portal.sessions.destroy(token).await;
        }

        let token = portal
            .sessions
            .create(SessionData::authenticated_for(record_id))
            .await;

        set_cookie(&portal.config.session, &token)
    }

    ///
    /// Destroy the session. Returns the `Set-Cookie` value that clears the cookie.
    ///
    pub async fn destroy(self, portal: &Portal) -> String {
        if let Some(token) = &self.token {
            portal.sessions.destroy(token).await;
        }
        clear_cookie(&portal.config.session)
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn set_cookie(config: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, token, config.ttl
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    )
}
