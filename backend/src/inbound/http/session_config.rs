//! Session cookie configuration read from `SESSION_*` variables.
//!
//! Release builds insist on explicit, valid toggles and a long signing key.
//! Debug builds fall back to permissive defaults and log a warning for each
//! fallback so local runs work without any setup.

pub mod fingerprint;
mod parsing;

use std::path::PathBuf;

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

use parsing::Toggles;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
/// `Key::derive_from` rejects shorter master keys.
const DERIVE_MIN_LEN: usize = 32;
const DEFAULT_COOKIE_NAME: &str = "marketplace_session";
const DEFAULT_TTL_HOURS: i64 = 24 * 7;
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const TTL_HOURS_ENV: &str = "SESSION_TTL_HOURS";
const TTL_EXPECTED: &str = "a positive number of hours";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults and warnings for anything missing.
    Debug,
    /// Every toggle must be set and valid.
    Release,
}

impl BuildMode {
    /// Mode of the running binary.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session cookie settings.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub same_site: SameSite,
    /// Lifetime of a signed-in session.
    pub ttl: Duration,
}

impl SessionSettings {
    /// Cookie session middleware using these settings.
    ///
    /// The cookie only carries the signed-in user's id, encrypted so the
    /// client cannot read or forge it.
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(self.cookie_name.clone())
            .cookie_path("/".into())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(PersistentSession::default().session_ttl(self.ttl))
            .build()
    }

    /// Fingerprint of the signing key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        fingerprint::key_fingerprint(&self.key)
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from environment variables and build mode.
///
/// # Errors
/// In release builds, any missing or malformed toggle, an unreadable key
/// file or a key shorter than 64 bytes. Debug builds only fail on a key
/// file shorter than 32 bytes or an unparseable `SESSION_TTL_HOURS`.
///
/// # Examples
///
/// ```rust
/// use marketplace::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.cookie_name, "marketplace_session");
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let toggles = Toggles::new(env, mode);
    let cookie_secure = toggles.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = toggles.same_site(cookie_secure)?;
    let allow_ephemeral = toggles.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = session_key_from_env(env, mode, allow_ephemeral)?;
    let cookie_name = env
        .string(COOKIE_NAME_ENV)
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_owned());

    Ok(SessionSettings {
        key,
        cookie_name,
        cookie_secure,
        same_site,
        ttl: ttl_from_env(env)?,
    })
}

fn ttl_from_env<E: Env>(env: &E) -> Result<Duration, SessionConfigError> {
    let Some(raw) = env.string(TTL_HOURS_ENV) else {
        return Ok(Duration::hours(DEFAULT_TTL_HOURS));
    };
    match raw.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Ok(Duration::hours(hours)),
        _ => Err(SessionConfigError::InvalidEnv {
            name: TTL_HOURS_ENV,
            value: raw,
            expected: TTL_EXPECTED,
        }),
    }
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            let min_len = match mode {
                BuildMode::Release => SESSION_KEY_MIN_LEN,
                BuildMode::Debug => DERIVE_MIN_LEN,
            };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key; sessions end on restart"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}
