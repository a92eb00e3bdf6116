//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations: remembering a signed-in user, forgetting it,
//! and resolving the cookie into a [`SessionState`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::AccountCommand;
use crate::domain::{Error, ErrorCode, SessionState, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Message returned by actions that need a signed-in user.
pub const LOGIN_REQUIRED: &str = "login required";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id in the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop every value and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match id {
            Some(raw) => match UserId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    warn!("invalid user id in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Resolve the cookie into a session state.
    ///
    /// A cookie naming an account that no longer exists is purged and
    /// treated as anonymous. When the account backend cannot answer the
    /// state stays [`SessionState::Resolving`] so gated views render a
    /// loading state instead of bouncing the user to the login page.
    pub async fn state(&self, accounts: &dyn AccountCommand) -> Result<SessionState, Error> {
        let Some(id) = self.user_id()? else {
            return Ok(SessionState::Anonymous);
        };
        match accounts.resolve(&id).await {
            Ok(Some(user)) => Ok(SessionState::Authenticated(user)),
            Ok(None) => {
                warn!(user_id = %id, "session names an unknown account; clearing");
                self.clear();
                Ok(SessionState::Anonymous)
            }
            Err(err) if err.code() == ErrorCode::ServiceUnavailable => {
                warn!(user_id = %id, error = %err, "account backend unavailable; session unresolved");
                Ok(SessionState::Resolving)
            }
            Err(err) => Err(err),
        }
    }

    /// Require a signed-in user, mapping the gate to an action error.
    ///
    /// # Errors
    /// - `503` while the session cannot be resolved.
    /// - `401` when nobody is signed in.
    pub async fn require_user(&self, accounts: &dyn AccountCommand) -> Result<User, Error> {
        match self.state(accounts).await? {
            SessionState::Authenticated(user) => Ok(user),
            SessionState::Resolving => Err(Error::service_unavailable("session is still loading")),
            SessionState::Anonymous => Err(Error::unauthorized(LOGIN_REQUIRED)),
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAccountCommand;
    use crate::domain::{DisplayName, EmailAddress};
    use actix_session::Session;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;
    use std::sync::Arc;

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn fixture_user() -> User {
        User::new(
            UserId::new(FIXTURE_ID).expect("fixture id"),
            DisplayName::new("Nadia").expect("name"),
            EmailAddress::new("nadia@example.com").expect("email"),
        )
    }

    fn session_test_app(
        accounts: MockAccountCommand,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let accounts: Arc<dyn AccountCommand> = Arc::new(accounts);
        App::new()
            .app_data(web::Data::from(accounts))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .route(
                "/set",
                web::get().to(|session: SessionContext| async move {
                    let id = UserId::new(FIXTURE_ID).expect("fixture id");
                    session.persist_user(&id)?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/set-invalid",
                web::get().to(|session: Session| async move {
                    session
                        .insert(USER_ID_KEY, "not-a-uuid")
                        .expect("set invalid user id");
                    HttpResponse::Ok()
                }),
            )
            .route(
                "/whoami",
                web::get().to(
                    |session: SessionContext, accounts: web::Data<dyn AccountCommand>| async move {
                        let user = session.require_user(accounts.get_ref()).await?;
                        Ok::<_, Error>(HttpResponse::Ok().body(user.id().to_string()))
                    },
                ),
            )
    }

    async fn cookie_from(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        uri: &str,
    ) -> actix_web::cookie::Cookie<'static> {
        let res = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned()
    }

    #[actix_web::test]
    async fn round_trips_a_signed_in_user() {
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_resolve()
            .times(1)
            .return_once(|_| Ok(Some(fixture_user())));
        let app = test::init_service(session_test_app(accounts)).await;
        let cookie = cookie_from(&app, "/set").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, FIXTURE_ID);
    }

    #[actix_web::test]
    async fn missing_cookie_is_unauthorised_without_a_lookup() {
        let mut accounts = MockAccountCommand::new();
        accounts.expect_resolve().times(0);
        let app = test::init_service(session_test_app(accounts)).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_user_id_is_unauthorised() {
        let mut accounts = MockAccountCommand::new();
        accounts.expect_resolve().times(0);
        let app = test::init_service(session_test_app(accounts)).await;
        let cookie = cookie_from(&app, "/set-invalid").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case::deleted_account(Ok(None), StatusCode::UNAUTHORIZED)]
    #[case::backend_down(
        Err(Error::service_unavailable("auth/network-request-failed")),
        StatusCode::SERVICE_UNAVAILABLE
    )]
    #[case::backend_bug(Err(Error::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR)]
    #[actix_web::test]
    async fn unresolvable_sessions_map_to_gate_statuses(
        #[case] outcome: Result<Option<User>, Error>,
        #[case] expected: StatusCode,
    ) {
        let mut accounts = MockAccountCommand::new();
        accounts.expect_resolve().return_once(move |_| outcome);
        let app = test::init_service(session_test_app(accounts)).await;
        let cookie = cookie_from(&app, "/set").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}
