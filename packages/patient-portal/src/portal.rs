use crate::{
    config::{PortalConfig, StoreBackend},
    error::Error,
    gate::AccessGate,
    http::Pages,
    issuer::{CodeIssuer, ScriptIssuer},
    log::{CONFIG, RECORDS},
    records::Records,
    session::SessionStore,
    store::{MemoryStore, PostgresStore, RecordStore},
};
use std::sync::Arc;
use tracing::{info, warn};

///
/// Shared application state handed to every request handler.
///
#[derive(Clone)]
pub struct Portal {
    pub config: Arc<PortalConfig>,
    pub records: Records,
    pub gate: AccessGate,
    pub sessions: Arc<SessionStore>,
    pub issuer: Arc<dyn CodeIssuer>,
    pub pages: Arc<Pages>,
}

impl Portal {
    ///
    /// Connect the configured record store and code issuer
    ///
    pub async fn init(config: PortalConfig) -> Result<Portal, Error> {
        let store: Arc<dyn RecordStore> = match config.database.backend {
            StoreBackend::Memory => {
                warn!(
                    target: CONFIG,
                    msg = "Using the in-memory record store. Records are lost on restart"
                );
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Postgres => {
                if config.database.with_tls && !config.database.with_tls_verification {
                    warn!(
                        msg = "Bypassing Transport Layer Security (TLS) verification for database connections"
                    );
                }

                let store = PostgresStore::connect(&config.database).await?;
                store.migrate().await?;
                info!(target: RECORDS, msg = "Database connected", database = %config.database);
                Arc::new(store)
            }
        };

        let issuer = Arc::new(ScriptIssuer::new(config.code_issuer.clone()));

        Portal::new(config, store, issuer)
    }

    pub fn new(
        config: PortalConfig,
        store: Arc<dyn RecordStore>,
        issuer: Arc<dyn CodeIssuer>,
    ) -> Result<Portal, Error> {
        let pages = Pages::new()?;
        let sessions = SessionStore::new(&config.session);

        Ok(Portal {
            records: Records::new(store.clone()),
            gate: AccessGate::new(store),
            sessions: Arc::new(sessions),
            issuer,
            pages: Arc::new(pages),
            config: Arc::new(config),
        })
    }
}
