mod patient;
mod prescription;

pub use patient::{NewPatientForm, PatientFields, PatientForm, PatientRecord, ResolvedPatient};
pub use prescription::{Prescription, PrescriptionFields, PrescriptionForm};

#[cfg(test)]
pub(crate) use patient::tests::complete_form as patient_form_fixture;
#[cfg(test)]
pub(crate) use prescription::tests::complete_form as prescription_form_fixture;

use crate::error::ValidationError;
use chrono::NaiveDate;

/// Date format submitted by `<input type="date">`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

///
/// A required form value, trimmed. Blank counts as missing.
///
pub(crate) fn required(name: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField { name });
    }
    Ok(value.to_string())
}

pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(crate) fn required_date(name: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = required(name, value)?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidField { name, value })
}
