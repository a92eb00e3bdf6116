//! Readers for the `SESSION_*` toggles.
//!
//! Every reader shares one rule: in debug builds a missing or malformed
//! value falls back to its default with a warning, in release builds it is
//! an error.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError};

const FLAG_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Environment view bound to a build mode.
pub(super) struct Toggles<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<'a, E: Env> Toggles<'a, E> {
    pub(super) const fn new(env: &'a E, mode: BuildMode) -> Self {
        Self { env, mode }
    }

    /// Use `default` in debug builds; fail with `error` in release builds.
    fn fallback<T>(&self, default: T, error: SessionConfigError) -> Result<T, SessionConfigError> {
        if self.mode.is_debug() {
            warn!(reason = %error, "session setting fallback applied");
            Ok(default)
        } else {
            Err(error)
        }
    }

    /// Read a boolean toggle.
    pub(super) fn flag(&self, name: &'static str, default: bool) -> Result<bool, SessionConfigError> {
        let Some(raw) = self.env.string(name) else {
            return self.fallback(default, SessionConfigError::MissingEnv { name });
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            _ => self.fallback(
                default,
                SessionConfigError::InvalidEnv {
                    name,
                    value: raw,
                    expected: FLAG_EXPECTED,
                },
            ),
        }
    }

    /// Read the `SameSite` policy; `None` is only valid on secure cookies.
    pub(super) fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let default = if self.mode.is_debug() {
            SameSite::Lax
        } else {
            SameSite::Strict
        };
        let Some(raw) = self.env.string(SAMESITE_ENV) else {
            return self.fallback(default, SessionConfigError::MissingEnv { name: SAMESITE_ENV });
        };
        let policy = match raw.trim().to_ascii_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => {
                return self.fallback(
                    default,
                    SessionConfigError::InvalidEnv {
                        name: SAMESITE_ENV,
                        value: raw,
                        expected: SAMESITE_EXPECTED,
                    },
                );
            }
        };
        // Browsers drop SameSite=None cookies that lack the Secure flag.
        if policy == SameSite::None && !cookie_secure {
            self.fallback((), SessionConfigError::InsecureSameSiteNone)?;
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;

    fn env_with(value: Option<&'static str>) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_string()
            .returning(move |_| value.map(str::to_owned));
        env
    }

    #[rstest]
    #[case(Some("YES"), Ok(true))]
    #[case(Some(" 0 "), Ok(false))]
    #[case(Some("maybe"), Err(()))]
    #[case(None, Err(()))]
    fn release_flags_are_strict(#[case] raw: Option<&'static str>, #[case] expected: Result<bool, ()>) {
        let env = env_with(raw);
        let toggles = Toggles::new(&env, BuildMode::Release);
        assert_eq!(toggles.flag("SESSION_COOKIE_SECURE", true).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case(Some("maybe"))]
    #[case(None)]
    fn debug_flags_fall_back(#[case] raw: Option<&'static str>) {
        let env = env_with(raw);
        let toggles = Toggles::new(&env, BuildMode::Debug);
        assert!(toggles.flag("SESSION_ALLOW_EPHEMERAL", false).is_ok_and(|flag| !flag));
    }

    #[rstest]
    #[case(BuildMode::Debug, true)]
    #[case(BuildMode::Release, false)]
    fn same_site_none_needs_secure_cookies(#[case] mode: BuildMode, #[case] accepted: bool) {
        let env = env_with(Some("None"));
        let toggles = Toggles::new(&env, mode);
        assert_eq!(toggles.same_site(false).is_ok(), accepted);
        assert_eq!(toggles.same_site(true).ok(), Some(SameSite::None));
    }
}
