//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://featrack.io/api/";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the API token.
pub const ENV_API_KEY: &str = "FEATRACK_API_KEY";
/// Environment variable holding the application slug.
pub const ENV_APPLICATION_SLUG: &str = "FEATRACK_APPLICATION_SLUG";
/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "FEATRACK_API_URL";
/// Environment variable selecting the error mode (`warn` or `throw`).
pub const ENV_ERROR_MODE: &str = "FEATRACK_ERROR_MODE";

/// How failures are reported to the caller.
///
/// In [`ErrorMode::Warn`] a failure is logged and the operation resolves to
/// `Ok(None)`. In [`ErrorMode::Throw`] it is returned as `Err`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    #[default]
    Warn,
    Throw,
}

impl ErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorMode::Warn => "warn",
            ErrorMode::Throw => "throw",
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(ErrorMode::Warn),
            "throw" => Ok(ErrorMode::Throw),
            other => Err(crate::Error::Config(format!(
                "unknown error mode '{other}', expected 'warn' or 'throw'"
            ))),
        }
    }
}

/// Append a trailing `/` to the API URL if it is missing.
pub(crate) fn normalize_api_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Featrack client configuration.
#[derive(Clone)]
pub struct Config {
    pub(crate) auth_token: String,
    pub(crate) application_slug: String,
    pub(crate) api_url: String,
    pub(crate) error_mode: ErrorMode,
    pub(crate) timeout: Duration,
    pub(crate) clear_session_on_end: bool,
}

impl Config {
    /// Get the bearer token.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Get the application slug.
    pub fn application_slug(&self) -> &str {
        &self.application_slug
    }

    /// Get the API base URL. Always ends with `/`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the error mode.
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a successful `end` forgets the session id.
    pub fn clear_session_on_end(&self) -> bool {
        self.clear_session_on_end
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_token", &"[REDACTED]")
            .field("application_slug", &self.application_slug)
            .field("api_url", &self.api_url)
            .field("error_mode", &self.error_mode)
            .field("timeout", &self.timeout)
            .field("clear_session_on_end", &self.clear_session_on_end)
            .finish()
    }
}

/// Builder for the Featrack client.
///
/// Every option left unset falls back to its default when the client is built:
///
/// | option | default | effect |
/// |---|---|---|
/// | `error_mode` | [`ErrorMode::Warn`] | failure reporting policy |
/// | `api_url` | [`DEFAULT_API_URL`] | base of every endpoint, normalized to end with `/` |
/// | `timeout` | [`DEFAULT_TIMEOUT`] | per-request timeout of the HTTP client |
/// | `clear_session_on_end` | `false` | `end` returns the session state to "no session" |
pub struct FeatrackBuilder {
    auth_token: String,
    application_slug: String,
    api_url: Option<String>,
    error_mode: Option<ErrorMode>,
    timeout: Option<Duration>,
    clear_session_on_end: Option<bool>,
}

impl FeatrackBuilder {
    /// Create a new builder with the given token and application slug.
    pub fn new(auth_token: impl Into<String>, application_slug: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            application_slug: application_slug.into(),
            api_url: None,
            error_mode: None,
            timeout: None,
            clear_session_on_end: None,
        }
    }

    /// Create a builder from `FEATRACK_*` environment variables.
    ///
    /// Missing token or slug variables become empty strings and are
    /// reported when the client is initialized. An unparseable
    /// `FEATRACK_ERROR_MODE` is a configuration error.
    pub fn from_env() -> Result<Self, crate::Error> {
        let mut builder = Self::new(
            std::env::var(ENV_API_KEY).unwrap_or_default(),
            std::env::var(ENV_APPLICATION_SLUG).unwrap_or_default(),
        );

        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.is_empty() {
                builder = builder.api_url(url);
            }
        }

        if let Ok(mode) = std::env::var(ENV_ERROR_MODE) {
            if !mode.is_empty() {
                builder = builder.error_mode(mode.parse()?);
            }
        }

        Ok(builder)
    }

    /// Set the error mode.
    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = Some(mode);
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Forget the session id after a successful `end`, so a new session
    /// can be started.
    pub fn clear_session_on_end(mut self, clear: bool) -> Self {
        self.clear_session_on_end = Some(clear);
        self
    }

    /// Merge the set options over the defaults.
    ///
    /// Empty token or slug are not rejected here; the client reports them
    /// through its error policy at initialization.
    pub(crate) fn build_config(self) -> Config {
        let api_url = self
            .api_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        Config {
            auth_token: self.auth_token,
            application_slug: self.application_slug,
            api_url: normalize_api_url(&api_url),
            error_mode: self.error_mode.unwrap_or_default(),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            clear_session_on_end: self.clear_session_on_end.unwrap_or(false),
        }
    }
}

impl fmt::Debug for FeatrackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatrackBuilder")
            .field("auth_token", &"[REDACTED]")
            .field("application_slug", &self.application_slug)
            .field("api_url", &self.api_url)
            .field("error_mode", &self.error_mode)
            .field("timeout", &self.timeout)
            .field("clear_session_on_end", &self.clear_session_on_end)
            .finish()
    }
}
