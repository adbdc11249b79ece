//! Signed-in admin session.
//!
//! The session is two string entries in a small JSON key/value file:
//! `access_token` and `user` (the admin profile, itself JSON-encoded).
//! [`AuthContext::init`] reads it once at startup; the context is then
//! passed to whatever needs the token. [`AuthContext::sign_in`] writes the
//! file and [`AuthContext::teardown`] clears it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid user profile: {0}")]
    Profile(#[source] serde_json::Error),

    #[error("access token must not be empty")]
    EmptyToken,
}

/// The signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: u64,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Key/value file holding the session entries.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries. A missing file reads as empty.
    pub fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&text).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the stored entries.
    pub fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let text = serde_json::to_string_pretty(entries).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, text).map_err(|source| self.io_error(source))
    }

    /// Removes the file. Clearing an absent file is fine.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: AdminUser,
}

/// Auth state for the running process.
#[derive(Debug)]
pub struct AuthContext {
    store: SessionStore,
    session: Option<Session>,
}

impl AuthContext {
    /// Reads the store once.
    ///
    /// A session with a missing entry or an unreadable profile counts as
    /// signed out.
    pub fn init(store: SessionStore) -> Result<Self, SessionError> {
        let mut entries = store.read()?;
        let token = entries.remove(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty());
        let user = entries.remove(USER_KEY);

        let session = match (token, user) {
            (Some(access_token), Some(user)) => match serde_json::from_str(&user) {
                Ok(user) => Some(Session { access_token, user }),
                Err(err) => {
                    warn!(error = %err, "ignoring stored session with unreadable profile");
                    None
                }
            },
            _ => None,
        };
        debug!(signed_in = session.is_some(), path = %store.path().display(), "session loaded");

        Ok(AuthContext { store, session })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&AdminUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Stores the token and profile and makes them current.
    pub fn sign_in(&mut self, access_token: impl Into<String>, user: AdminUser) -> Result<(), SessionError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let profile = serde_json::to_string(&user).map_err(SessionError::Profile)?;

        let entries = BTreeMap::from([
            (ACCESS_TOKEN_KEY.to_string(), access_token.clone()),
            (USER_KEY.to_string(), profile),
        ]);
        self.store.write(&entries)?;
        self.session = Some(Session { access_token, user });
        Ok(())
    }

    /// Signs out: clears the store and the in-memory session.
    pub fn teardown(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.session = None;
        Ok(())
    }

    /// `Authorization` header value for API requests.
    pub fn bearer_header(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|s| format!("Bearer {}", s.access_token))
    }
}

/// Parses a profile given as JSON text.
pub fn parse_profile(text: &str) -> Result<AdminUser, SessionError> {
    serde_json::from_str(text).map_err(SessionError::Profile)
}
