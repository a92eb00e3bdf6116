//! Test utilities for the marketplace crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod clock {
    //! Deterministic clocks.

    use std::sync::{Mutex, PoisonError};

    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use mockable::Clock;

    /// Clock that advances by a fixed step on every reading.
    ///
    /// Document stores stamp each write with a distinct, increasing time, so
    /// "newest first" ordering is observable without sleeping.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace::test_support::clock::SteppingClock;
    /// use mockable::Clock;
    ///
    /// let clock = SteppingClock::default();
    /// assert!(clock.utc() < clock.utc());
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        now: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                now: Mutex::new(start),
                step,
            }
        }
    }

    impl Default for SteppingClock {
        fn default() -> Self {
            let start = Utc
                .with_ymd_and_hms(2025, 1, 1, 8, 0, 0)
                .single()
                .unwrap_or_else(Utc::now);
            Self::new(start, Duration::minutes(1))
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += self.step;
            *now
        }
    }
}

pub mod marketplace {
    //! Fully wired in-memory marketplace.

    use std::sync::Arc;

    use mockable::Clock;
    use url::Url;

    use super::clock::SteppingClock;
    use crate::domain::ports::{AccountCommand, ListingCommand};
    use crate::domain::{
        AccountService, AdminIdentity, Error, IgnoreProgress, ImageSelection, ImageTab,
        Listing, ListingForm, ListingService, Registration, SessionState, User,
    };
    use crate::inbound::http::state::{HttpState, HttpStatePorts};
    use crate::inbound::ws::state::{AllowedOrigins, WsState};
    use crate::outbound::blobs::MemoryBlobStore;
    use crate::outbound::memory::{
        MemoryIdentityProvider, MemoryListingRepository, MemoryUserProfileRepository,
    };

    /// Public base URL the in-memory blob store serves under.
    pub const TEST_BASE_URL: &str = "http://localhost:8080/";

    /// Password used by [`InMemoryMarketplace::register`].
    pub const TEST_PASSWORD: &str = "secret123";

    pub type MemoryListingService = ListingService<MemoryListingRepository, MemoryBlobStore>;
    pub type MemoryAccountService =
        AccountService<MemoryIdentityProvider, MemoryUserProfileRepository>;

    /// Every adapter and service, sharing one stepping clock.
    pub struct InMemoryMarketplace {
        pub repository: Arc<MemoryListingRepository>,
        pub blobs: Arc<MemoryBlobStore>,
        pub profiles: Arc<MemoryUserProfileRepository>,
        pub listings: Arc<MemoryListingService>,
        pub accounts: Arc<MemoryAccountService>,
        pub admin: AdminIdentity,
    }

    impl InMemoryMarketplace {
        /// Wire the marketplace with `admin` as the administrator.
        ///
        /// # Examples
        ///
        /// ```rust
        /// use marketplace::domain::AdminIdentity;
        /// use marketplace::test_support::marketplace::InMemoryMarketplace;
        ///
        /// let market = InMemoryMarketplace::new(AdminIdentity::default());
        /// assert_eq!(market.listings.registry().active(), 0);
        /// ```
        pub fn new(admin: AdminIdentity) -> Self {
            let clock: Arc<dyn Clock> = Arc::new(SteppingClock::default());
            let profiles = Arc::new(MemoryUserProfileRepository::new());
            let accounts = Arc::new(AccountService::new(
                Arc::new(MemoryIdentityProvider::new()),
                profiles.clone(),
                clock.clone(),
            ));
            Self::with_accounts(clock, profiles, accounts, admin)
        }

        /// Wire the marketplace with a freshly registered administrator.
        ///
        /// Identity ids are assigned on registration, so the account is
        /// created before the listing service learns who administers it.
        pub async fn with_registered_admin(
            display_name: &str,
            email: &str,
        ) -> Result<(Self, User), Error> {
            let clock: Arc<dyn Clock> = Arc::new(SteppingClock::default());
            let profiles = Arc::new(MemoryUserProfileRepository::new());
            let accounts = Arc::new(AccountService::new(
                Arc::new(MemoryIdentityProvider::new()),
                profiles.clone(),
                clock.clone(),
            ));
            let registration = Registration::try_from_parts(display_name, email, TEST_PASSWORD)
                .map_err(|err| Error::invalid_request(err.to_string()))?;
            let admin = accounts.register(&registration).await?;
            let identity = AdminIdentity::new(Some(admin.id().clone()));
            Ok((
                Self::with_accounts(clock, profiles, accounts, identity),
                admin,
            ))
        }

        #[expect(clippy::expect_used, reason = "TEST_BASE_URL is a valid constant")]
        fn with_accounts(
            clock: Arc<dyn Clock>,
            profiles: Arc<MemoryUserProfileRepository>,
            accounts: Arc<MemoryAccountService>,
            admin: AdminIdentity,
        ) -> Self {
            let base_url = Url::parse(TEST_BASE_URL).expect("valid test base URL");
            let repository = Arc::new(MemoryListingRepository::new(clock.clone()));
            let blobs = Arc::new(MemoryBlobStore::new(base_url));
            let listings = Arc::new(ListingService::new(
                repository.clone(),
                blobs.clone(),
                clock,
                admin.clone(),
            ));
            Self {
                repository,
                blobs,
                profiles,
                listings,
                accounts,
                admin,
            }
        }

        /// HTTP state over these services.
        pub fn http_state(&self) -> HttpState {
            HttpState::new(HttpStatePorts {
                accounts: self.accounts.clone(),
                listings: self.listings.clone(),
                listings_query: self.listings.clone(),
                blobs: self.blobs.clone(),
            })
            .with_admin(self.admin.clone())
        }

        /// Live feed state accepting the test base URL and `localhost:<port>`.
        #[expect(clippy::expect_used, reason = "TEST_BASE_URL is a valid constant")]
        pub fn ws_state(&self, local_port: u16) -> WsState {
            let base_url = Url::parse(TEST_BASE_URL).expect("valid test base URL");
            WsState::new(
                self.listings.clone(),
                self.accounts.clone(),
                self.admin.clone(),
                AllowedOrigins::new(&base_url, local_port),
            )
        }

        /// Register an account with [`TEST_PASSWORD`].
        pub async fn register(&self, display_name: &str, email: &str) -> Result<User, Error> {
            let registration = Registration::try_from_parts(display_name, email, TEST_PASSWORD)
                .map_err(|err| Error::invalid_request(err.to_string()))?;
            self.accounts.register(&registration).await
        }

        /// Post a listing with a remote image on behalf of `owner`.
        pub async fn post(
            &self,
            owner: &User,
            title: &str,
            price: u64,
            category: &str,
        ) -> Result<Listing, Error> {
            let form = ListingForm {
                title: title.to_owned(),
                description: format!("{title} in good condition"),
                price: price.to_string(),
                category: category.to_owned(),
                contact: "01700000000".to_owned(),
            };
            let selection = ImageSelection {
                tab: ImageTab::Url,
                file: None,
                url: "https://images.example.com/item.png".to_owned(),
            };
            let session = SessionState::Authenticated(owner.clone());
            self.listings
                .submit(&session, &form, selection, &IgnoreProgress)
                .await
        }
    }
}

pub mod fs {
    //! Scratch directories for filesystem adapters.

    use std::io;

    use tempfile::TempDir;
    use url::Url;

    use crate::outbound::blobs::FilesystemBlobStore;

    /// Filesystem blob store rooted in a fresh temporary directory.
    ///
    /// Keep the returned [`TempDir`] alive for as long as the store is used.
    pub fn temp_blob_store(base_url: Url) -> io::Result<(TempDir, FilesystemBlobStore)> {
        let dir = tempfile::tempdir()?;
        let store = FilesystemBlobStore::open(&dir.path().join("blobs"), base_url)?;
        Ok((dir, store))
    }
}
