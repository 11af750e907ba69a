use crate::error::Error;
use crate::log::DEVELOPMENT;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{debug, info};

// See https://prometheus.io/docs/practices/naming/
pub const RECORDS_CREATED_TOTAL: &str = "patient_portal_records_created_total";
pub const RECORDS_UPDATED_TOTAL: &str = "patient_portal_records_updated_total";
pub const PRESCRIPTIONS_ADDED_TOTAL: &str = "patient_portal_prescriptions_added_total";
pub const PRESCRIPTIONS_UNLINKED_TOTAL: &str = "patient_portal_prescriptions_unlinked_total";

pub const LOGINS_GRANTED_TOTAL: &str = "patient_portal_logins_granted_total";
pub const LOGINS_DENIED_TOTAL: &str = "patient_portal_logins_denied_total";
pub const AUTHORIZATION_DENIED_TOTAL: &str = "patient_portal_authorization_denied_total";

pub const CODES_ISSUED_TOTAL: &str = "patient_portal_codes_issued_total";
pub const CODE_ISSUE_ERROR_TOTAL: &str = "patient_portal_code_issue_error_total";
pub const CODE_ISSUE_DURATION_SECONDS: &str = "patient_portal_code_issue_duration_seconds";

pub fn start(host: &str, port: u16) -> Result<(), Error> {
    let address = format!("{}:{}", host, port);
    let socket_address: SocketAddr = address.parse().map_err(|_| {
        crate::error::ConfigError::InvalidParameter {
            name: "prometheus.port".to_string(),
            value: address.clone(),
        }
    })?;

    debug!(target: DEVELOPMENT, msg = "Starting Prometheus exporter", port);

    PrometheusBuilder::new()
        .with_http_listener(socket_address)
        .install()?;

    describe_counter!(RECORDS_CREATED_TOTAL, "Number of patient records created");
    describe_counter!(RECORDS_UPDATED_TOTAL, "Number of patient records edited");
    describe_counter!(PRESCRIPTIONS_ADDED_TOTAL, "Number of prescriptions added");
    describe_counter!(
        PRESCRIPTIONS_UNLINKED_TOTAL,
        "Number of prescriptions saved but not linked to their patient record"
    );

    describe_counter!(LOGINS_GRANTED_TOTAL, "Number of successful password checks");
    describe_counter!(LOGINS_DENIED_TOTAL, "Number of failed password checks");
    describe_counter!(
        AUTHORIZATION_DENIED_TOTAL,
        "Number of protected requests redirected to the password prompt"
    );

    describe_counter!(CODES_ISSUED_TOTAL, "Number of record codes generated");
    describe_counter!(CODE_ISSUE_ERROR_TOTAL, "Number of failed code generations");
    describe_histogram!(
        CODE_ISSUE_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of code generation"
    );

    info!(msg = "Prometheus exporter started", port);
    Ok(())
}
