mod app_state;
mod config;
mod error;
mod job_controller;
mod platform;
mod services;
mod session;
mod store;
mod workflow;

use crate::app_state::AppState;
use crate::config::{Config, PlatformConfig};
use crate::job_controller::state::{start_job_updater, JobsState};
use crate::platform::rest::RestPlatform;
use crate::platform::sqlite::SqlitePlatform;
use crate::platform::DataPlatform;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Context;
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{info, warn};
use mime_guess::from_path;
use std::sync::Arc;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static/dist");

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match STATIC_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

/// Builds the user-facing platform and the one used by `exportar-dados`.
fn connect(config: &Config) -> anyhow::Result<(Arc<dyn DataPlatform>, Arc<dyn DataPlatform>)> {
    match &config.platform {
        PlatformConfig::Hosted {
            url,
            anon_key,
            service_key,
        } => {
            info!("using hosted data platform at {}", url);
            let platform: Arc<dyn DataPlatform> = Arc::new(RestPlatform::new(url, anon_key));
            let service: Arc<dyn DataPlatform> = match service_key {
                Some(key) => Arc::new(RestPlatform::new(url, key)),
                None => {
                    warn!("PLATFORM_SERVICE_KEY not set, exportar-dados reads with the public key");
                    platform.clone()
                }
            };
            Ok((platform, service))
        }
        PlatformConfig::Sqlite { path } => {
            info!("using local sqlite platform at {}", path);
            let platform: Arc<dyn DataPlatform> = Arc::new(
                SqlitePlatform::open(path).with_context(|| format!("could not open sqlite database {}", path))?,
            );
            Ok((platform.clone(), platform))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::from_env()?;
    if config.export_token.is_none() {
        warn!("EXPORT_TOKEN not set, exportar-dados is disabled");
    }
    let (platform, service_platform) = connect(&config)?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs_state.clone(), rx));

    let host = config.bind_host.clone();
    let port = config.port;
    let state = AppState {
        platform,
        service_platform,
        config: Arc::new(config),
    };

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(32 * 1024 * 1024)) // parsed CSV rows travel as JSON
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .configure(services::configure)
            .default_service(web::route().to(serve_embedded))
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;
    Ok(())
}
