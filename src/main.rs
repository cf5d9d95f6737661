use std::net::SocketAddr;
use std::sync::Arc;

use astra::Server;
use log::{error, info};

use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::handlers::AppState;
use crate::mailer::Mailer;
use crate::responses::error_to_response;
use crate::router::handle;

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod handlers;
mod logging;
mod mailer;
mod reports;
mod responses;
mod router;
mod simulation;

#[cfg(test)]
mod tests;

fn main() {
    logging::init();
    let config = AppConfig::from_env();

    let db = Database::new(config.db_path.clone());

    if let Err(e) = init_db(&db, "sql/schema.sql") {
        error!("❌ Database initialization failed: {e}");
        std::process::exit(1);
    }

    if config.seed_demo {
        if let Err(e) = simulation::seed_demo_if_empty(&db, handlers::now_unix()) {
            error!("Demo seeding failed: {e}");
            std::process::exit(1);
        }
    }

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {:?}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let mailer = Mailer::from_config(&config);
    let state = Arc::new(AppState { db, mailer, config });

    info!("Starting server at http://{addr}");
    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        error!("Server ended with error: {e}");
    }

    info!("Server shut down cleanly.");
}
