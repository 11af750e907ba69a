use std::io;
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    CodeIssuer(#[from] CodeIssuerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Patient record {id} not found")]
    PatientNotFound { id: String },

    #[error("Prescription {id} not found")]
    PrescriptionNotFound { id: String },

    #[error("Prescription {prescription_id} was saved but could not be linked to patient record {patient_id}")]
    PrescriptionNotLinked {
        patient_id: String,
        prescription_id: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value} for {name} in configuration file or environment")]
    InvalidParameter { name: String, value: String },

    #[error("Missing field {name} from configuration file or environment")]
    MissingParameter { name: String },

    #[error("Database backend postgres requires either database.url or database.name")]
    MissingDatabaseName,

    #[error(transparent)]
    FileOrEnvironment(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field {name}")]
    MissingField { name: &'static str },

    #[error("Invalid value {value} for field {name}")]
    InvalidField { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection timed out")]
    ConnectionTimeout(#[from] Elapsed),

    #[error(transparent)]
    Database(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Record store is unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Access password hash is malformed")]
    Malformed,
}

#[derive(Error, Debug)]
pub enum CodeIssuerError {
    #[error("Code issuer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Code issuer produced no image at {path}")]
    MissingOutput { path: String },

    #[error("Code issuer could not be started: {0}")]
    Spawn(io::Error),

    #[error("Code issuer timed out")]
    Timeout(#[from] Elapsed),
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.into())
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(e: tokio_postgres::Error) -> Self {
        Error::Store(e.into())
    }
}

impl Error {
    ///
    /// Errors that a page can recover from by re-prompting, as opposed to a failure of the
    /// service itself
    ///
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PatientNotFound { .. } | Error::PrescriptionNotFound { .. }
        )
    }
}
