use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::jobs::JobStarted;
use common::requests::ImportRequest;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::job_controller::state::JobsState;
use crate::session::Session;
use crate::workflow::import::{prepare, run_job};

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    jobs_state: web::Data<JobsState>,
    payload: web::Json<ImportRequest>,
) -> impl Responder {
    match schedule_import_job(&req, &state, &jobs_state, payload.into_inner()).await {
        Ok(started) => HttpResponse::Accepted().json(started),
        Err(e) => e.respond("csv import"),
    }
}

/// Validates the whole file, then leaves the writes to a background job.
async fn schedule_import_job(
    req: &HttpRequest,
    state: &AppState,
    jobs_state: &JobsState,
    request: ImportRequest,
) -> Result<JobStarted, AppError> {
    let session = Session::resolve(req, state).await?;
    let prepared = prepare(&session.store, &session.actor, request).await?;

    let job_id = jobs_state.register().await;
    let reporter = jobs_state.reporter(&job_id);
    let chunk_size = state.config.approval_chunk_size;
    tokio::spawn(run_job(session.store, session.actor, prepared, chunk_size, reporter));

    Ok(JobStarted { job_id })
}
