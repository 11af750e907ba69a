pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod gate;
pub mod http;
pub mod issuer;
pub mod log;
pub mod model;
pub mod password;
pub mod portal;
pub mod prometheus;
pub mod records;
pub mod session;
pub mod store;
pub mod tls;

pub use crate::cli::Args;
pub use crate::config::{DatabaseConfig, PortalConfig, ServerConfig};
pub use crate::log::init;
pub use crate::portal::Portal;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub mod test_helpers;
