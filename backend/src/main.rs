//! Marketplace entry-point: loads configuration, wires adapters and serves
//! pages, REST actions, media, the live feed and OpenAPI docs.

mod server;

use std::io;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace::inbound::http::health::HealthState;
use marketplace::inbound::http::session_config::{BuildMode, session_settings_from_env};
use marketplace::settings::MarketplaceSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        MarketplaceSettings::load().map_err(|err| io::Error::other(err.to_string()))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    let config = ServerConfig::from_settings(&settings, session).map_err(io::Error::other)?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!("marketplace server started");
    server.await
}
