mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod preprocess;
mod state;

use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::classifier::TractClassifier;
use crate::config::{Cli, Mode};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    tracing::info!("Potato Disease Detection API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(mode = %settings.mode, input_size = settings.input_size, "configuration");
    tracing::info!(origins = ?cli.cors_origins, "cors");

    let state = match settings.mode {
        Mode::Model => {
            tracing::info!(path = %cli.model_path.display(), "loading model");
            let model = TractClassifier::load(&cli.model_path, cli.input_size)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            AppState::with_model(settings, Arc::new(model))
        }
        Mode::Mock => {
            tracing::warn!("mock mode: /predict returns fixed predictions");
            AppState::mock(settings)
        }
    };
    let state = web::Data::new(state);

    let (host, port) = cli.bind_addr();
    let workers = cli.workers;
    tracing::info!("Server running at http://{}:{}", host, port);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(cli.cors())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    });
    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server.bind((host, port))?.run().await
}
