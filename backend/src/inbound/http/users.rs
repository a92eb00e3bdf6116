//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register {"displayName":"Nadia","email":"nadia@example.com","password":"secret1"}
//! POST /api/v1/login {"email":"nadia@example.com","password":"secret1"}
//! POST /api/v1/logout
//! GET /api/v1/session
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Error, LoginCredentials, Registration, SessionState, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::credentials_error;

/// Sign-up request body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Optional; blank keeps the name derived from the email address.
    #[serde(default)]
    #[schema(example = "Nadia Rahman")]
    pub display_name: String,
    #[schema(example = "nadia@example.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
}

/// Sign-in request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "nadia@example.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
}

/// Where the client should navigate after a successful sign-in.
const AFTER_SIGN_IN: &str = "/";

/// Body returned by register and login.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedInResponse {
    #[schema(value_type = crate::inbound::http::schemas::UserSchema)]
    pub user: User,
    #[schema(example = "/")]
    pub redirect: String,
}

impl SignedInResponse {
    fn new(user: User) -> Self {
        Self {
            user,
            redirect: AFTER_SIGN_IN.to_owned(),
        }
    }
}

/// Body returned by `GET /api/v1/session`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    /// Whether the signed-in user is the configured administrator.
    pub is_admin: bool,
    #[schema(value_type = Option<crate::inbound::http::schemas::UserSchema>)]
    pub user: Option<User>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.display_name, &value.email, &value.password)
            .map_err(|err| credentials_error(&err))
    }
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password).map_err(|err| credentials_error(&err))
    }
}

/// Create an account, sign it in and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SignedInResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid input or email already in use", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.register(&registration).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(SignedInResponse::new(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SignedInResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let user = state.accounts.login(&credentials).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Ok().json(SignedInResponse::new(user)))
}

/// End the session. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    if let Ok(Some(id)) = session.user_id() {
        info!(user_id = %id, "signed out");
    }
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Describe the caller's session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 503, description = "Session could not be resolved yet", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let response = match session.state(state.accounts.as_ref()).await? {
        SessionState::Resolving => {
            return Err(Error::service_unavailable("session is still loading"));
        }
        SessionState::Anonymous => SessionResponse {
            authenticated: false,
            is_admin: false,
            user: None,
        },
        SessionState::Authenticated(user) => SessionResponse {
            authenticated: true,
            is_admin: state.admin.is_admin(user.id()),
            user: Some(user),
        },
    };
    Ok(web::Json(response))
}
