use crate::{
    error::Error,
    log::AUTHENTICATION,
    prometheus::{AUTHORIZATION_DENIED_TOTAL, LOGINS_DENIED_TOTAL, LOGINS_GRANTED_TOTAL},
    session::SessionData,
    store::RecordStore,
};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    Granted,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

///
/// Allow iff the session is authenticated for exactly this record id.
///
/// A session authenticated for a different record is denied the same way as one that never
/// authenticated.
///
pub fn authorize(session: &SessionData, record_id: &str) -> Access {
    if session.authenticated && session.patient_id.as_deref() == Some(record_id) {
        return Access::Allow;
    }

    counter!(AUTHORIZATION_DENIED_TOTAL).increment(1);
    debug!(target: AUTHENTICATION, msg = "Access denied", record_id);
    Access::Deny
}

///
/// Checks a supplied password against a record's access password.
///
/// Failed attempts are not limited. Each one is logged and counted.
///
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn RecordStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn RecordStore>) -> AccessGate {
        AccessGate { store }
    }

    ///
    /// Returns `Error::PatientNotFound` if there is no record with this id.
    ///
    pub async fn authenticate(&self, record_id: &str, password: &str) -> Result<Grant, Error> {
        let record = self
            .store
            .find_patient(record_id)
            .await?
            .ok_or_else(|| Error::PatientNotFound {
                id: record_id.to_owned(),
            })?;

        let access_password = record.access_password;
        let password = password.to_owned();
        let verified =
            tokio::task::spawn_blocking(move || access_password.verify(&password)).await?;

        if verified {
            counter!(LOGINS_GRANTED_TOTAL).increment(1);
            info!(target: AUTHENTICATION, msg = "Access granted", record_id);
            Ok(Grant::Granted)
        } else {
            counter!(LOGINS_DENIED_TOTAL).increment(1);
            warn!(target: AUTHENTICATION, msg = "Incorrect access password", record_id);
            Ok(Grant::Denied)
        }
    }
}
