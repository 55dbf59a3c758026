use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Process-wide settings read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Public host name, used as the signature realm and in every URL we hand out.
    pub host_name: String,
    /// Address the web server binds to.
    pub listen: String,
    pub https: bool,
    pub database_url: String,
    pub session_key: Option<String>,
    pub env: Env,
    pub inverted_theme: bool,
    pub urls: ApiUrls,
    /// API base built from the listen address instead of the public host.
    pub listen_api_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Prod,
}

impl Env {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "prod" | "production" => Env::Prod,
            _ => Env::Dev,
        }
    }
}

/// Base URLs of the federation API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiUrls {
    /// Frontend root, `http(s)://host`.
    pub site_url: String,
    /// `http(s)://host/api`
    pub base_url: String,
    /// `http(s)://host/api/accounts`
    pub accounts_url: String,
    /// `http(s)://host/api/outbox`
    pub outbox_url: String,
}

impl ApiUrls {
    pub fn new(https: bool, host: &str) -> Self {
        let site_url = format!("{}://{}", scheme(https), host);
        let base_url = format!("{}/api", site_url);
        Self {
            accounts_url: format!("{}/accounts", base_url),
            outbox_url: format!("{}/outbox", base_url),
            base_url,
            site_url,
        }
    }
}

fn scheme(https: bool) -> &'static str {
    if https {
        "https"
    } else {
        "http"
    }
}

/// Non-empty variables count as switched on.
fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

impl Config {
    pub fn new(https: bool, host_name: &str, listen: &str) -> Self {
        Self {
            host_name: host_name.to_owned(),
            listen: listen.to_owned(),
            https,
            database_url: String::new(),
            session_key: None,
            env: Env::Dev,
            inverted_theme: false,
            urls: ApiUrls::new(https, host_name),
            listen_api_url: format!("{}://{}/api", scheme(https), listen),
        }
    }

    pub fn from_env() -> Result<Self> {
        let https = env_flag("HTTPS");
        let host_name = std::env::var("HOSTNAME").unwrap_or_default();
        let listen = std::env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:3000".to_owned());

        let mut config = Self::new(https, &host_name, &listen);
        config.database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        config.session_key = std::env::var("SESSION_KEY").ok();
        config.env = Env::from_name(&std::env::var("ENV").unwrap_or_default());
        config.inverted_theme = env_flag("INVERTED_THEME");
        Ok(config)
    }
}

#[inline(always)]
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("config::init() must run before get_config()")
}

/// Reads the environment into the CONFIG static.
pub fn init() -> Result<&'static Config> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("config initialized twice"))?;
    Ok(get_config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_urls_http() {
        let urls = ApiUrls::new(false, "littr.git");
        assert_eq!(urls.site_url, "http://littr.git");
        assert_eq!(urls.base_url, "http://littr.git/api");
        assert_eq!(urls.accounts_url, "http://littr.git/api/accounts");
        assert_eq!(urls.outbox_url, "http://littr.git/api/outbox");
    }

    #[test]
    fn test_api_urls_https() {
        let config = Config::new(true, "littr.me", "0.0.0.0:3000");
        assert_eq!(config.urls.base_url, "https://littr.me/api");
        assert_eq!(config.listen_api_url, "https://0.0.0.0:3000/api");
    }

    #[test]
    fn test_env_from_name() {
        assert_eq!(Env::from_name("prod"), Env::Prod);
        assert_eq!(Env::from_name(" Production "), Env::Prod);
        assert_eq!(Env::from_name(""), Env::Dev);
        assert_eq!(Env::from_name("test"), Env::Dev);
    }
}
