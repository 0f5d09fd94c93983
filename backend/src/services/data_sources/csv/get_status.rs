use crate::app_state::AppState;
use crate::error::AppError;
use crate::job_controller::state::JobsState;
use crate::session::Session;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::jobs::JobStatus;

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    jobs_state: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> impl Responder {
    match get_csv_job_status(&req, &state, &jobs_state, &job_id).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => e.respond("csv job status"),
    }
}

async fn get_csv_job_status(
    req: &HttpRequest,
    state: &AppState,
    jobs_state: &JobsState,
    job_id: &str,
) -> Result<JobStatus, AppError> {
    Session::resolve(req, state).await?;
    jobs_state.status(job_id).await.ok_or(AppError::NotFound("Tarefa"))
}
