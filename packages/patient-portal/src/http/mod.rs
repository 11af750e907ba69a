mod error;
mod pages;
mod patient;
mod session;
mod staff;

pub use error::PageError;
pub use pages::Pages;
pub use session::Session;

use crate::{log::HTTP, Portal};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tracing::debug;

///
/// The complete route table.
///
/// Record pages under `/patient/:id/` other than the prompt, login and logout require a session
/// authenticated for that id.
///
pub fn router(portal: Portal) -> Router {
    let protected = Router::new()
        .route("/patient/:id/dashboard", get(patient::dashboard))
        .route("/patient/:id/view", get(patient::view))
        .route(
            "/patient/:id/edit",
            get(patient::edit_form).post(patient::edit),
        )
        .route(
            "/patient/:id/prescription",
            get(patient::prescription_form).post(patient::add_prescription),
        )
        .route_layer(middleware::from_fn_with_state(
            portal.clone(),
            patient::require_access,
        ));

    Router::new()
        .route("/", get(staff::home))
        .route("/add", get(staff::add_form))
        .route("/patients", post(staff::create))
        .route("/patients/all", get(staff::list))
        .route("/code/:id", get(staff::code))
        .route("/patient/:id", get(patient::prompt))
        .route("/patient/:id/login", post(patient::login))
        .route("/patient/:id/logout", get(patient::logout))
        .merge(protected)
        .layer(middleware::from_fn(log_request))
        .with_state(portal)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    debug!(
        target: HTTP,
        msg = "Request",
        method = %method,
        path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64
    );

    response
}
