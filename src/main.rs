use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::time::Duration;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod routes;

use auth::allow_list::AllowList;
use auth::revocation::RevocationList;
use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Timecard is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        addr = %config.server_addr,
        work_start = %config.work_policy.work_start,
        work_end = %config.work_policy.work_end,
        timezone = %config.work_policy.timezone,
        "Server starting..."
    );

    let pool = init_db(&config.database_url)
        .await
        .context("connecting to database")?;

    match &config.bootstrap_admin {
        Some((email, password)) => auth::users::ensure_admin(&pool, email, password).await?,
        None => warn!("No bootstrap admin configured"),
    }

    let revoked = Data::new(RevocationList::new(Duration::from_secs(
        config.access_token_ttl as u64,
    )));
    let allow_list = Data::new(AllowList::load(&config.allow_list_path)?);
    let pool = Data::new(pool);
    let server_addr = config.server_addr.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} matches the UI's JS/CSS files
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(revoked.clone())
            .app_data(allow_list.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
