use crate::api::ApiError;
use crate::model::Session;
use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the stored token
pub const TOKEN_ENV: &str = "COURSE_ADMIN_TOKEN";

/// Local JSON file holding the bearer token and the cached user profile
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session, letting `COURSE_ADMIN_TOKEN` override the stored token
    pub fn load(&self) -> Result<Session> {
        self.load_with_token(std::env::var(TOKEN_ENV).ok())
    }

    pub fn load_with_token(&self, token_override: Option<String>) -> Result<Session> {
        let stored = if self.path.exists() {
            let text = std::fs::read_to_string(&self.path)
                .with_context(|| format!("reading session file {}", self.path.display()))?;
            Some(
                serde_json::from_str::<Session>(&text)
                    .with_context(|| format!("parsing session file {}", self.path.display()))?,
            )
        } else {
            debug!("no session file at {}", self.path.display());
            None
        };

        let session = match (token_override.filter(|t| !t.trim().is_empty()), stored) {
            (Some(token), Some(stored)) => Session {
                token,
                user: stored.user,
            },
            (Some(token), None) => Session::new(token),
            (None, Some(stored)) => stored,
            (None, None) => return Err(ApiError::NotAuthenticated.into()),
        };

        if !session.is_authenticated() {
            return Err(ApiError::NotAuthenticated.into());
        }
        Ok(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("writing session file {}", self.path.display()))?;
        Ok(())
    }
}
