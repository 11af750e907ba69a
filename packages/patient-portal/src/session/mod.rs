use crate::{config::SessionConfig, log::SESSION};
use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

const TOKEN_LEN: usize = 32;

///
/// Everything the server keeps about a visitor.
///
/// A new session is empty. A successful password check marks it authenticated for exactly
/// one record id.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionData {
    pub authenticated: bool,
    pub patient_id: Option<String>,
}

impl SessionData {
    pub fn authenticated_for(patient_id: &str) -> SessionData {
        SessionData {
            authenticated: true,
            patient_id: Some(patient_id.to_owned()),
        }
    }
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

///
/// Server-held sessions keyed by an opaque token.
///
/// Expired sessions are dropped when they are next looked up, and swept whenever a session is
/// written.
///
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> SessionStore {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl: config.ttl(),
        }
    }

    ///
    /// Store a new session and return its token
    ///
    pub async fn create(&self, data: SessionData) -> String {
        let token = generate_token();
        self.save(&token, data).await;
        debug!(target: SESSION, msg = "Session created");
        token
    }

    pub async fn load(&self, token: &str) -> Option<SessionData> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.data.clone()),
                Some(_) => (),
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(token)
            .is_some_and(|entry| entry.expires_at <= now)
        {
            sessions.remove(token);
            debug!(target: SESSION, msg = "Session expired");
        }
        None
    }

    ///
    /// Write the session and restart its lifetime
    ///
    pub async fn save(&self, token: &str, data: SessionData) {
        let now = Utc::now();
        let entry = Entry {
            data,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(target: SESSION, msg = "Expired sessions swept", swept);
        }

        sessions.insert(token.to_owned(), entry);
    }

    pub async fn destroy(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        debug!(target: SESSION, msg = "Session destroyed", removed);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: i64) -> SessionStore {
        SessionStore::new(&SessionConfig {
            ttl,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn saved_session_loads() {
        let sessions = store(60);
        let token = sessions.create(SessionData::default()).await;
        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(sessions.load(&token).await, Some(SessionData::default()));

        sessions
            .save(&token, SessionData::authenticated_for("abc"))
            .await;
        let data = sessions.load(&token).await.unwrap();
        assert!(data.authenticated);
        assert_eq!(data.patient_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let sessions = store(60);
        let a = sessions.create(SessionData::default()).await;
        let b = sessions.create(SessionData::default()).await;
        assert_ne!(a, b);
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test]
    async fn unknown_token_loads_nothing() {
        let sessions = store(60);
        assert_eq!(sessions.load("forged").await, None);
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let sessions = store(0);
        let token = sessions
            .create(SessionData::authenticated_for("abc"))
            .await;
        assert_eq!(sessions.load(&token).await, None);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn expired_sessions_are_swept_on_write() {
        let sessions = store(0);
        for _ in 0..100 {
            sessions.create(SessionData::default()).await;
        }
        // Each write sweeps everything that expired before it
        assert_eq!(sessions.len().await, 1);

        let live = store(60);
        for _ in 0..10 {
            live.create(SessionData::default()).await;
        }
        assert_eq!(live.len().await, 10);
    }

    #[tokio::test]
    async fn destroyed_session_is_gone() {
        let sessions = store(60);
        let token = sessions
            .create(SessionData::authenticated_for("abc"))
            .await;
        assert!(sessions.destroy(&token).await);
        assert_eq!(sessions.load(&token).await, None);
        assert!(!sessions.destroy(&token).await);
    }
}
