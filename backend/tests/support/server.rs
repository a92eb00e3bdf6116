//! Running marketplace server for integration suites.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Dropping the world stops the server.

use std::cell::RefCell;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use marketplace::Trace;
use marketplace::domain::User;
use marketplace::inbound::http::health::{HealthState, live, ready};
use marketplace::inbound::http::listings::{create_listing, delete_listing};
use marketplace::inbound::http::media::serve_media;
use marketplace::inbound::http::pages::{
    add_product_page, admin_page, dashboard_page, index_page, item_page, login_page,
    register_page,
};
use marketplace::inbound::http::session_config::{BuildMode, session_settings_from_env};
use marketplace::inbound::http::users::{current_session, login, logout, register};
use marketplace::inbound::ws;
use marketplace::test_support::marketplace::InMemoryMarketplace;
use mockable::MockEnv;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

/// Cookie session middleware with debug defaults over plain HTTP.
pub(crate) fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    let mut env = MockEnv::new();
    env.expect_string().returning(|_| None);
    let mut settings =
        session_settings_from_env(&env, BuildMode::Debug).expect("debug session settings");
    settings.cookie_secure = false;
    settings.middleware()
}

pub(crate) struct MarketWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) market: Arc<InMemoryMarketplace>,
    pub(crate) admin: User,
    pub(crate) session_cookie: Option<String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_listing_id: Option<String>,
}

pub(crate) type SharedWorld = Rc<RefCell<MarketWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        let ctx = self.world.borrow();
        let server = ctx.server.clone();
        ctx.local.block_on(&ctx.runtime, async move {
            server.stop(true).await;
        });
    }
}

/// Run `operation` against the server base URL on the world's runtime.
pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

async fn spawn_market_server(
    market: Arc<InMemoryMarketplace>,
) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let http_data = web::Data::new(market.http_state());
    let ws_data = web::Data::new(market.ws_state(addr.port()));
    let health = web::Data::new(HealthState::new());
    health.mark_ready();

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .service(register)
            .service(login)
            .service(logout)
            .service(current_session)
            .service(create_listing)
            .service(delete_listing);
        App::new()
            .app_data(http_data.clone())
            .app_data(ws_data.clone())
            .app_data(health.clone())
            .wrap(session_middleware())
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
            .service(register_page)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok((format!("http://{addr}"), handle))
}

/// Start a server whose administrator is a pre-registered account.
pub(crate) fn start_world() -> WorldFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    let (market, admin, (base_url, server)) = local.block_on(&runtime, async {
        let (market, admin) =
            InMemoryMarketplace::with_registered_admin("Campus Admin", "admin@example.edu")
                .await
                .expect("marketplace with administrator");
        let market = Arc::new(market);
        let started = spawn_market_server(market.clone())
            .await
            .expect("server should start");
        (market, admin, started)
    });

    WorldFixture {
        world: Rc::new(RefCell::new(MarketWorld {
            runtime,
            local,
            base_url,
            server,
            market,
            admin,
            session_cookie: None,
            last_status: None,
            last_trace_id: None,
            last_body: None,
            last_listing_id: None,
        })),
    }
}
