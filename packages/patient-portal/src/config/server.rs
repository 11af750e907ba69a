use super::{DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT};
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,

    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,

    /// Public base URL used when building the link encoded into a patient code.
    /// Falls back to `http://localhost:{port}`.
    pub base_url: Option<String>,

    #[serde(default = "ServerConfig::default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: ServerConfig::default_host(),
            port: ServerConfig::default_port(),
            base_url: None,
            shutdown_timeout: ServerConfig::default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    pub fn default_port() -> u16 {
        DEFAULT_PORT
    }

    pub fn default_shutdown_timeout() -> u64 {
        DEFAULT_SHUTDOWN_TIMEOUT
    }

    pub fn to_socket_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout)
    }

    ///
    /// Base URL without a trailing slash
    ///
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    ///
    /// The canonical link to a patient record, as encoded into its code
    ///
    pub fn patient_url(&self, record_id: &str) -> String {
        format!("{}/patient/{}", self.base_url(), record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::ServerConfig;

    #[test]
    fn patient_url_defaults_to_localhost() {
        let server = ServerConfig {
            port: 8080,
            ..Default::default()
        };
        assert_eq!(
            server.patient_url("abc"),
            "http://localhost:8080/patient/abc"
        );
    }

    #[test]
    fn patient_url_strips_trailing_slash() {
        let server = ServerConfig {
            base_url: Some("https://portal.example.org/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            server.patient_url("abc"),
            "https://portal.example.org/patient/abc"
        );
    }
}
