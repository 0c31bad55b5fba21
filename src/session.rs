//! Persisted login session.
//!
//! Mirrors the dashboard's browser storage: a bearer `token` plus a
//! JSON-encoded `user_data` profile string that carries the employee `npp`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::consts::APP_DIR;
use crate::error::AppError;

const SESSION_ENV: &str = "PDAM_NOTIFY_SESSION";

/// Raw key-value store contents
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SessionStore {
    #[serde(default)]
    pub(crate) token: Option<String>,
    #[serde(default)]
    pub(crate) user_data: Option<String>,
}

/// Valid credentials for the notification endpoints
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) npp: String,
    pub(crate) name: Option<String>,
}

impl SessionStore {
    pub(crate) fn path() -> Option<PathBuf> {
        if let Some(custom) = std::env::var_os(SESSION_ENV) {
            return Some(PathBuf::from(custom));
        }
        let home = dirs::home_dir()?;
        Some(home.join(".config").join(APP_DIR).join("session.json"))
    }

    /// Missing file is an empty store, not an error
    pub(crate) fn load_from(path: &Path) -> Result<Self, AppError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(AppError::SessionRead {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub(crate) fn save_to(&self, path: &Path) -> Result<(), AppError> {
        let write_err = |source: std::io::Error| AppError::SessionWrite {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        // Holds a bearer token: owner read/write only
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        file.write_all(json.as_bytes()).map_err(write_err)
    }

    pub(crate) fn clear(path: &Path) -> Result<bool, AppError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AppError::SessionWrite {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub(crate) fn from_login(token: &str, npp: &str, name: Option<&str>) -> Result<Self, AppError> {
        let npp = npp.trim();
        if npp.is_empty() {
            return Err(AppError::InvalidNpp {
                input: npp.to_string(),
            });
        }
        let mut profile = serde_json::json!({ "npp": npp });
        if let Some(name) = name {
            profile["nama"] = Value::String(name.to_string());
        }
        Ok(SessionStore {
            token: Some(token.to_string()),
            user_data: Some(profile.to_string()),
        })
    }

    /// Valid session, or `None` when the token or employee id is missing
    pub(crate) fn session(&self) -> Option<Session> {
        let token = self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let raw = self.user_data.as_deref()?;
        let profile: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "user_data is not valid JSON");
                return None;
            }
        };
        let npp = match profile.get("npp")? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if npp.is_empty() {
            debug!("user_data has empty npp");
            return None;
        }
        Some(Session {
            token: token.to_string(),
            npp,
            name: profile
                .get("nama")
                .or_else(|| profile.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}
