//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::{AppStates, build_states};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use marketplace::Trace;
#[cfg(debug_assertions)]
use marketplace::doc::ApiDoc;
use marketplace::inbound::http::health::{HealthState, live, ready};
use marketplace::inbound::http::listings::{create_listing, delete_listing};
use marketplace::inbound::http::media::serve_media;
use marketplace::inbound::http::pages::{
    add_product_page, admin_page, dashboard_page, index_page, item_page, login_page,
    register_page,
};
use marketplace::inbound::http::session_config::SessionSettings;
use marketplace::inbound::http::users::{current_session, login, logout, register};
use marketplace::inbound::ws;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    states: AppStates,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        states: AppStates { http, ws: ws_state },
        session,
    } = deps;
    let json_limit = http.json_body_limit();

    let api = web::scope("/api/v1")
        .service(register)
        .service(login)
        .service(logout)
        .service(current_session)
        .service(create_listing)
        .service(delete_listing);

    let app = App::new()
        .app_data(health_state)
        .app_data(http)
        .app_data(ws_state)
        .app_data(web::JsonConfig::default().limit(json_limit))
        .wrap(session.middleware())
        .wrap(Trace)
        .service(api)
        .service(ws::listings_feed)
        .service(serve_media)
        .service(ready)
        .service(live)
        .service(index_page)
        .service(add_product_page)
        .service(item_page)
        .service(dashboard_page)
        .service(admin_page)
        .service(login_page)
        .service(register_page);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when the blob root cannot be opened or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let states = build_states(&config)?;
    info!(
        bind_addr = %config.bind_addr(),
        public_base_url = %config.public_base_url,
        session_key = %config.session.key_fingerprint(),
        "starting marketplace server"
    );
    let deps = AppDependencies {
        health_state: health_state.clone(),
        states,
        session: config.session,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(config.bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
