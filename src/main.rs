use std::sync::Mutex;

use actix_web::{web, App, HttpServer};
use anyhow::Context as _;
use migration::{Migrator, MigratorTrait as _};
use sea_orm::Database;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{auth::Authority, payroll::{DayCountCache, SheetWriter}};

mod config;
mod consts;
mod utils;

mod entity;
mod auth;
mod store;
mod payroll;
mod pages;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config::LogConfig { log_dir, retention } = config::load_logging()?;

    let log_file = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("payroll")
        .filename_suffix("log")
        .max_log_files(retention)
        .build(&log_dir)
        .with_context(|| format!("unable to open log directory `{}`", log_dir.display()))?;
    let (log_writer, _log_guard) = tracing_appender::non_blocking(log_file);

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_writer)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber)?;

    let config::Config {
        host_address,
        database_opt,
        jwt_key,
        export_dir,
    } = config::load()?;

    let connection = Database::connect(database_opt).await.context("unable to connect to database")?;
    Migrator::up(&connection, None).await.context("unable to migrate database")?;

    let database = web::Data::new(connection);
    let authority = web::Data::new(Authority::new(jwt_key.as_bytes()));
    let day_counts = web::Data::new(Mutex::new(DayCountCache::new()));
    let sheet_writer = web::Data::new(SheetWriter::new(export_dir));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(database.clone())
            .app_data(authority.clone())
            .app_data(day_counts.clone())
            .app_data(sheet_writer.clone())
            .wrap(TracingLogger::default())
            .configure(pages::config)
    });

    info!(%host_address, "serving");

    server
        .workers(1)
        .bind(host_address)?
        .run().await?;

    Ok(())
}
