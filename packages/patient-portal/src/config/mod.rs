mod database;
mod issuer;
mod log;
mod portal;
mod server;
mod session;

pub use database::{DatabaseConfig, StoreBackend};
pub use issuer::CodeIssuerConfig;
pub use log::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use portal::{PortalConfig, PrometheusConfig};
pub use server::ServerConfig;
pub use session::SessionConfig;

pub const PP_PREFIX: &str = "PP";
pub const DEFAULT_CONFIG_FILE_PATH: &str = "patient-portal.toml";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 2000;
