//! Builders wiring the outbound adapters into the inbound adapter states.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use marketplace::domain::ports::BlobStore;
use marketplace::domain::{AccountService, ListingService};
use marketplace::inbound::http::state::{HttpState, HttpStatePorts};
use marketplace::inbound::ws::state::{AllowedOrigins, WsState};
use marketplace::outbound::blobs::{FilesystemBlobStore, MemoryBlobStore};
use marketplace::outbound::memory::{
    MemoryIdentityProvider, MemoryListingRepository, MemoryUserProfileRepository,
};

use super::ServerConfig;

/// Adapter states shared by every worker.
#[derive(Clone)]
pub(super) struct AppStates {
    pub(super) http: web::Data<HttpState>,
    pub(super) ws: web::Data<WsState>,
}

/// Build the HTTP and WebSocket states over the configured blob store.
///
/// # Errors
/// Propagates the I/O error when the blob root cannot be opened.
pub(super) fn build_states(config: &ServerConfig) -> io::Result<AppStates> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    match &config.blob_root {
        Some(root) => {
            let store = FilesystemBlobStore::open(root, config.public_base_url.clone())?;
            info!(root = %root.display(), "storing uploads on disk");
            Ok(wire_services(config, clock, Arc::new(store)))
        }
        None => {
            warn!("no blob root configured; uploads are kept in memory");
            let store = MemoryBlobStore::new(config.public_base_url.clone());
            Ok(wire_services(config, clock, Arc::new(store)))
        }
    }
}

fn wire_services<B>(config: &ServerConfig, clock: Arc<dyn Clock>, blobs: Arc<B>) -> AppStates
where
    B: BlobStore + 'static,
{
    let repository = Arc::new(MemoryListingRepository::new(clock.clone()));
    let listings = Arc::new(ListingService::new(
        repository,
        blobs.clone(),
        clock.clone(),
        config.admin.clone(),
    ));
    let accounts = Arc::new(AccountService::new(
        Arc::new(MemoryIdentityProvider::new()),
        Arc::new(MemoryUserProfileRepository::new()),
        clock,
    ));

    let http = HttpState::new(HttpStatePorts {
        accounts: accounts.clone(),
        listings: listings.clone(),
        listings_query: listings.clone(),
        blobs,
    })
    .with_admin(config.admin.clone())
    .with_max_upload_bytes(config.max_upload_bytes);
    let ws = WsState::new(
        listings,
        accounts,
        config.admin.clone(),
        AllowedOrigins::new(&config.public_base_url, config.bind_addr.port()),
    );

    AppStates {
        http: web::Data::new(http),
        ws: web::Data::new(ws),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Key;
    use marketplace::domain::{AdminIdentity, UserId};
    use marketplace::inbound::http::session_config::{BuildMode, session_settings_from_env};
    use marketplace::settings::MarketplaceSettings;
    use mockable::MockEnv;
    use rstest::{fixture, rstest};
    use url::Url;

    #[fixture]
    fn config() -> ServerConfig {
        let mut env = MockEnv::new();
        env.expect_string().returning(|_| None);
        let session = session_settings_from_env(&env, BuildMode::Debug).expect("debug session");
        let settings = MarketplaceSettings {
            max_upload_bytes: Some(1024),
            ..MarketplaceSettings::default()
        };
        ServerConfig::from_settings(&settings, session).expect("valid settings")
    }

    #[rstest]
    fn memory_store_is_used_without_a_blob_root(config: ServerConfig) {
        let states = build_states(&config).expect("states");
        assert_eq!(states.http.max_upload_bytes, 1024);
        assert!(
            states
                .ws
                .origins
                .is_allowed(&Url::parse("http://localhost:8080").expect("url"))
        );
    }

    #[rstest]
    fn blob_root_selects_the_filesystem_store(mut config: ServerConfig) {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path().join("uploads");
        config.blob_root = Some(root.clone());

        build_states(&config).expect("states");

        assert!(root.is_dir(), "blob root should be created");
    }

    #[rstest]
    fn administrator_reaches_both_states(mut config: ServerConfig) {
        let admin = UserId::random();
        config.admin = AdminIdentity::new(Some(admin.clone()));
        config.session.key = Key::generate();

        let states = build_states(&config).expect("states");

        assert!(states.http.admin.is_admin(&admin));
        assert!(states.ws.admin.is_admin(&admin));
    }
}
