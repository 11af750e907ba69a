use crate::{error::Error, log::HTTP};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

pub const PATIENT_NOT_FOUND: &str = "Patient record not found.";
pub const INCORRECT_PASSWORD: &str = "Incorrect password. Try again.";
pub const CODE_ERROR: &str = "Error generating QR code.";
pub const CREATE_ERROR: &str = "Error creating patient record. Please try again.";
pub const UPDATE_ERROR: &str = "Error updating patient details.";
pub const PRESCRIPTION_ERROR: &str = "Error adding prescription.";
const INTERNAL_ERROR: &str = "Something went wrong. Please try again.";

///
/// A failed request, rendered as plain text.
///
/// Not found is a 404; everything else is logged and hidden behind a generic 500.
///
#[derive(Debug)]
pub struct PageError(Error);

impl<E> From<E> for PageError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::PatientNotFound { id } => {
                warn!(target: HTTP, msg = "Patient record not found", record_id = id);
                (StatusCode::NOT_FOUND, PATIENT_NOT_FOUND).into_response()
            }
            Error::PrescriptionNotFound { id } => {
                warn!(target: HTTP, msg = "Prescription not found", prescription_id = id);
                (StatusCode::NOT_FOUND, "Prescription not found.").into_response()
            }
            err => {
                error!(target: HTTP, msg = "Request failed", error = err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
            }
        }
    }
}
