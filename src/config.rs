use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the bearer token and cached profile live
    pub path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { path: None }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        // COURSE_ADMIN_API__BASE_URL, COURSE_ADMIN_SESSION__PATH, ...
        config = config.add_source(
            config::Environment::with_prefix("COURSE_ADMIN")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Path of the session file, falling back to `~/.course-admin/session.json`
    pub fn session_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.session.path {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            anyhow::anyhow!("no home directory found, set COURSE_ADMIN_SESSION__PATH or --session")
        })?;
        Ok(home.join(".course-admin").join("session.json"))
    }
}
