use super::error::{PageError, CODE_ERROR, CREATE_ERROR};
use crate::{
    error::Error,
    log::HTTP,
    model::{NewPatientForm, PatientForm},
    Portal,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tracing::{error, info, warn};

const PNG: &str = "image/png";
const DOWNLOAD: &str = "attachment; filename=4sqr.png";

pub(super) async fn home() -> Redirect {
    Redirect::to("/add")
}

pub(super) async fn add_form(State(portal): State<Portal>) -> Result<Response, PageError> {
    Ok(portal
        .pages
        .add_patient(&PatientForm::default(), None)?
        .into_response())
}

///
/// Create a record and hand back its code as a download.
///
/// If the code cannot be generated the record is kept and the page shows its link instead.
///
pub(super) async fn create(
    State(portal): State<Portal>,
    Form(form): Form<NewPatientForm>,
) -> Result<Response, PageError> {
    let record = match portal.records.create(&form).await {
        Ok(record) => record,
        Err(Error::Validation(err)) => {
            let message = err.to_string();
            info!(target: HTTP, msg = "Invalid patient form", error = message);
            let page = portal.pages.add_patient(&form.patient, Some(&message))?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
        Err(err) => {
            error!(
                target: HTTP,
                msg = "Could not create patient record",
                error = err.to_string()
            );
            let page = portal.pages.add_patient(&form.patient, Some(CREATE_ERROR))?;
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response());
        }
    };

    let patient_url = portal.config.server.patient_url(&record.id);

    match portal.issuer.issue(&record.id, &patient_url).await {
        Ok(image) => Ok((
            [
                (header::CONTENT_TYPE, PNG),
                (header::CONTENT_DISPOSITION, DOWNLOAD),
            ],
            image.bytes,
        )
            .into_response()),
        Err(err) => {
            warn!(
                target: HTTP,
                msg = "Showing record link without code",
                record_id = record.id,
                error = err.to_string()
            );
            Ok(portal
                .pages
                .code(&patient_url, Some(CODE_ERROR))?
                .into_response())
        }
    }
}

pub(super) async fn list(State(portal): State<Portal>) -> Result<Response, PageError> {
    let patients = portal.records.list().await?;
    Ok(portal.pages.all_patients(&patients)?.into_response())
}

///
/// Generate the code for an existing record again, served inline
///
pub(super) async fn code(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let record = portal.records.get(&id).await?;
    let patient_url = portal.config.server.patient_url(&record.id);

    match portal.issuer.issue(&record.id, &patient_url).await {
        Ok(image) => Ok(([(header::CONTENT_TYPE, PNG)], image.bytes).into_response()),
        Err(err) => {
            warn!(
                target: HTTP,
                msg = "Showing record link without code",
                record_id = record.id,
                error = err.to_string()
            );
            Ok(portal
                .pages
                .code(&patient_url, Some(CODE_ERROR))?
                .into_response())
        }
    }
}
