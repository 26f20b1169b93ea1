use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod error;
mod lagging;
mod models;
mod routes;

use crate::{
    config::Config,
    lagging::{source::MongoSource, LaggingEngine},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let db = database::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .context("failed to create MongoDB client")?;

    let engine = web::Data::new(LaggingEngine::new(
        Arc::new(MongoSource::new(db)),
        config.engine.clone(),
    ));
    info!(
        host = %config.host,
        port = config.port,
        rate_constant = engine.config().policy.rate_constant,
        cache_ttl_secs = engine.config().cache_ttl.as_secs(),
        "Starting lagging indicator server"
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(engine.clone())
            .configure(routes::lagging::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
