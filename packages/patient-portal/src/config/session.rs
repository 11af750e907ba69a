use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds, refreshed on every request that saves the session
    #[serde(default = "SessionConfig::default_ttl")]
    pub ttl: i64,

    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: SessionConfig::default_cookie_name(),
            ttl: SessionConfig::default_ttl(),
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    pub fn default_cookie_name() -> String {
        "portal_session".to_string()
    }

    // One day
    pub const fn default_ttl() -> i64 {
        60 * 60 * 24
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl)
    }
}
