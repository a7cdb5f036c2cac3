use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";

/// Variables the hosted edge runtime provisions for the data store.
const HOSTED_URL_ENV: &str = "SUPABASE_URL";
const HOSTED_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub datastore: DatastoreSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, hosted-runtime variables, base
    /// file, environment overlay and `SHELF_*` variables, then validate it.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let mut builder = config::Config::builder();
        if let Ok(url) = std::env::var(HOSTED_URL_ENV) {
            builder = builder.set_default("datastore.url", url)?;
        }
        if let Ok(key) = std::env::var(HOSTED_KEY_ENV) {
            builder = builder.set_default("datastore.api_key", key)?;
        }

        let cfg = builder
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHELF")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = Environment::parse(&environment)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.datastore.validate()?;

        let prefix = &self.server.api_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            bail!(
                "server.api_prefix '{}' must start with '/' and not end with '/'",
                prefix
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Path prefix every module router is nested under, e.g. `/api`.
    #[serde(default)]
    pub api_prefix: String,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            api_prefix: String::new(),
        }
    }
}

/// Connection details for the hosted data store (REST data API + auth API).
#[derive(Clone, Deserialize)]
pub struct DatastoreSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "DatastoreSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DatastoreSettings {
    fn default_timeout_ms() -> u64 {
        10000
    }

    /// Resolve a service path (e.g. `auth/v1/user`) against the data store URL.
    pub fn endpoint(&self, path: &str) -> anyhow::Result<url::Url> {
        let mut base = url::Url::parse(self.url.trim())
            .with_context(|| format!("datastore.url '{}' is not a valid URL", self.url))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .with_context(|| format!("failed to resolve '{}' against datastore.url", path))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.url.trim().is_empty() {
            bail!("datastore.url is not set (SHELF_DATASTORE__URL or SUPABASE_URL)");
        }
        if self.api_key.trim().is_empty() {
            bail!("datastore.api_key is not set (SHELF_DATASTORE__API_KEY or SUPABASE_ANON_KEY)");
        }
        url::Url::parse(&self.url)
            .with_context(|| format!("datastore.url '{}' is not a valid URL", self.url))?;
        Ok(())
    }
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl fmt::Debug for DatastoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("DatastoreSettings")
            .field("url", &self.url)
            .field("api_key", &api_key)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
