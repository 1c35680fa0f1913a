//! Runtime configuration.

use url::Url;

/// The backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const BASE_URL_VAR: &str = "NARIZ_API_URL";
pub const REVALIDATE_VAR: &str = "NARIZ_REVALIDATE_ON_STARTUP";
pub const LOGOUT_ON_401_VAR: &str = "NARIZ_LOGOUT_ON_401";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the REST API lives. Every endpoint path is resolved relative
    /// to this.
    pub base_url: Url,
    pub user_agent: String,
    /// Ask the backend who the persisted token belongs to before trusting
    /// it at startup.
    pub revalidate_on_startup: bool,
    /// Forget the persisted credentials when an authenticated request comes
    /// back with a 401.
    pub logout_on_unauthorized: bool,
}

impl Config {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Config {
            base_url: parse_base_url(base_url)?,
            ..Config::default()
        })
    }

    /// Build a [`Config`] from the `NARIZ_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup(BASE_URL_VAR) {
            config.base_url = parse_base_url(&url)?;
        }
        if let Some(value) = lookup(REVALIDATE_VAR) {
            config.revalidate_on_startup = parse_flag(REVALIDATE_VAR, &value)?;
        }
        if let Some(value) = lookup(LOGOUT_ON_401_VAR) {
            config.logout_on_unauthorized =
                parse_flag(LOGOUT_ON_401_VAR, &value)?;
        }

        log::debug!("Loaded {:?}", config);
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL)
                .expect("The default URL is always valid"),
            user_agent: String::from(crate::DEFAULT_USER_AGENT),
            revalidate_on_startup: false,
            logout_on_unauthorized: false,
        }
    }
}

/// Parse a base URL, making sure it ends in a `/` so endpoint paths are
/// appended instead of replacing the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| {
        ConfigError::BadUrl {
            value: raw.to_string(),
            source,
        }
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

pub fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::BadFlag {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("\"{}\" isn't a valid URL", value)]
    BadUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("\"{0}\" can't be used as a base URL")]
    NotABase(String),
    #[error("{} should be true or false, found \"{}\"", name, value)]
    BadFlag { name: String, value: String },
}
