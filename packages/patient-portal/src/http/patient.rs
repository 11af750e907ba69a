use super::error::{
    PageError, INCORRECT_PASSWORD, PATIENT_NOT_FOUND, PRESCRIPTION_ERROR, UPDATE_ERROR,
};
use super::session::Session;
use crate::{
    error::Error,
    gate::{self, Access, Grant},
    log::HTTP,
    model::{PatientForm, PrescriptionForm},
    Portal,
};
use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    password: String,
}

fn prompt_path(id: &str) -> String {
    format!("/patient/{id}")
}

fn dashboard_path(id: &str) -> String {
    format!("/patient/{id}/dashboard")
}

///
/// Route layer for the protected record pages.
/// Anything but a session authenticated for this exact id goes back to the password prompt.
///
pub(super) async fn require_access(
    Path(id): Path<String>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match gate::authorize(&session.data, &id) {
        Access::Allow => next.run(request).await,
        Access::Deny => Redirect::to(&prompt_path(&id)).into_response(),
    }
}

pub(super) async fn prompt(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    Ok(portal.pages.password_prompt(&id, None)?.into_response())
}

pub(super) async fn login(
    State(portal): State<Portal>,
    Path(id): Path<String>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    match portal.gate.authenticate(&id, &form.password).await {
        Ok(Grant::Granted) => {
            let cookie = session.authenticate(&portal, &id).await;
            Ok((
                [(header::SET_COOKIE, cookie)],
                Redirect::to(&dashboard_path(&id)),
            )
                .into_response())
        }
        Ok(Grant::Denied) => {
            let page = portal
                .pages
                .password_prompt(&id, Some(INCORRECT_PASSWORD))?;
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(Error::PatientNotFound { .. }) => {
            info!(target: HTTP, msg = "Login for unknown patient record", record_id = id);
            Ok((StatusCode::NOT_FOUND, PATIENT_NOT_FOUND).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn logout(
    State(portal): State<Portal>,
    Path(id): Path<String>,
    session: Session,
) -> Response {
    let cookie = session.destroy(&portal).await;
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&prompt_path(&id)),
    )
        .into_response()
}

pub(super) async fn dashboard(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    Ok(portal.pages.dashboard(&id)?.into_response())
}

pub(super) async fn view(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let patient = portal.records.get_resolved(&id).await?;
    Ok(portal.pages.view_patient(&patient)?.into_response())
}

pub(super) async fn edit_form(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let record = portal.records.get(&id).await?;
    let form = PatientForm::from(&record.fields);
    Ok(portal.pages.edit_patient(&id, &form, None)?.into_response())
}

///
/// Apply an edit. On failure the form is shown again with what was submitted.
///
pub(super) async fn edit(
    State(portal): State<Portal>,
    Path(id): Path<String>,
    Form(form): Form<PatientForm>,
) -> Result<Response, PageError> {
    match portal.records.update(&id, &form).await {
        Ok(_) => Ok(Redirect::to(&dashboard_path(&id)).into_response()),
        Err(Error::Validation(err)) => {
            let page = portal.pages.edit_patient(&id, &form, Some(&err.to_string()))?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(err) if err.is_not_found() => Err(err.into()),
        Err(err) => {
            error!(
                target: HTTP,
                msg = "Could not update patient record",
                record_id = id,
                error = err.to_string()
            );
            let page = portal.pages.edit_patient(&id, &form, Some(UPDATE_ERROR))?;
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

pub(super) async fn prescription_form(
    State(portal): State<Portal>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let record = portal.records.get(&id).await?;
    let page = portal.pages.prescription(
        &id,
        &record.fields.name,
        &PrescriptionForm::default(),
        None,
    )?;
    Ok(page.into_response())
}

///
/// Add a prescription. On failure the form is shown again with what was submitted.
///
pub(super) async fn add_prescription(
    State(portal): State<Portal>,
    Path(id): Path<String>,
    Form(form): Form<PrescriptionForm>,
) -> Result<Response, PageError> {
    let (status, message) = match portal.records.add_prescription(&id, &form).await {
        Ok(_) => return Ok(Redirect::to(&dashboard_path(&id)).into_response()),
        Err(Error::Validation(err)) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        Err(err) if err.is_not_found() => return Err(err.into()),
        Err(err) => {
            error!(
                target: HTTP,
                msg = "Could not add prescription",
                record_id = id,
                error = err.to_string()
            );
            (StatusCode::INTERNAL_SERVER_ERROR, PRESCRIPTION_ERROR.to_string())
        }
    };

    let record = portal.records.get(&id).await?;
    let page = portal
        .pages
        .prescription(&id, &record.fields.name, &form, Some(&message))?;
    Ok((status, page).into_response())
}
