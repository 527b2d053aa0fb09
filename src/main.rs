use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use clap::Parser;
use sqlx::SqlitePool;
use std::sync::Arc;

mod api;
mod cli;
mod config;
mod db;
mod docs;
mod model;
mod routes;

use cli::{Cli, Command};
use config::Config;
use db::init_db;
use model::student::Student;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Daily-rolling file log; keep the guard alive or buffered lines are lost.
fn init_tracing(config: &Config) -> WorkerGuard {
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    guard
}

async fn serve(config: Config, pool: SqlitePool) -> anyhow::Result<()> {
    let limiter = routes::build_limiter(config.rate_attendance_per_min).map(Arc::new);
    if limiter.is_some() {
        info!(
            per_min = config.rate_attendance_per_min,
            "Rate limiting /attendance per client IP"
        );
    }

    info!(addr = %config.server_addr, "Server starting...");

    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .configure(|cfg| routes::configure(cfg, limiter))
    })
    .bind(&config.server_addr)
    .with_context(|| format!("Failed to bind {}", config.server_addr))?
    .run()
    .await?;

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let _guard = init_tracing(&config);

    let pool = init_db(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to database at {}", config.database_url))?;

    match cli.command() {
        Command::Serve => serve(config, pool.clone()).await?,
        Command::CreateTables => {
            let report = db::run_migrations(&pool)
                .await
                .context("Failed to migrate database")?;
            info!(?report, "Migration finished");
            println!(
                "Tables ready (time column added: {}, rows backfilled: {})",
                report.time_column_added, report.rows_backfilled
            );
        }
        Command::AddStudent { name, serial_id } => {
            let student = Student::insert(&pool, &name, &serial_id)
                .await
                .with_context(|| format!("Failed to add student with serial ID {serial_id}"))?;
            info!(student_id = student.id, %serial_id, "Student added");
            println!("Added student {} ({}) with id {}", student.name, student.serial_id, student.id);
        }
    }

    pool.close().await;
    Ok(())
}
