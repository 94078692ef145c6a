// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session store — per-user sessions, workspaces and persisted settings.
//
// Layout under the store root:
//
//   <root>/<user_id>/                 workspace (staged inputs, output/)
//   <root>/user_data/<user_id>.json   settings

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use pagewright_core::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::session::Session;

/// Directory holding per-user settings files.
const USER_DATA_DIR: &str = "user_data";

/// Identifier of the person driving a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Preferences that outlive a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Delete staged inputs and outputs when a session is reset.
    pub auto_delete: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { auto_delete: true }
    }
}

/// All live sessions, keyed by user.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    max_source_bytes: u64,
    sessions: HashMap<UserId, Session>,
}

impl SessionStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, max_source_bytes: u64) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(USER_DATA_DIR))?;
        info!(root = %root.display(), "Session store opened");
        Ok(Self {
            root,
            max_source_bytes,
            sessions: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace directory of `user`.
    pub fn workspace_dir(&self, user: UserId) -> PathBuf {
        self.root.join(user.to_string())
    }

    /// The user's session, created on first use.
    pub fn session(&mut self, user: UserId) -> &mut Session {
        let workspace = self.workspace_dir(user);
        let limit = self.max_source_bytes;
        self.sessions.entry(user).or_insert_with(|| {
            debug!(%user, "New session");
            Session::new(user, workspace, limit)
        })
    }

    pub fn get(&self, user: UserId) -> Option<&Session> {
        self.sessions.get(&user)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -- Settings persistence -------------------------------------------------

    fn settings_path(&self, user: UserId) -> PathBuf {
        self.root.join(USER_DATA_DIR).join(format!("{user}.json"))
    }

    /// Stored settings of `user`, or the defaults when none are stored or
    /// the file is unreadable.
    pub fn settings(&self, user: UserId) -> SessionSettings {
        let path = self.settings_path(user);
        let Ok(data) = std::fs::read_to_string(&path) else {
            return SessionSettings::default();
        };
        serde_json::from_str(&data).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "Ignoring malformed settings file");
            SessionSettings::default()
        })
    }

    pub fn save_settings(&self, user: UserId, settings: &SessionSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(self.settings_path(user), json)?;
        Ok(())
    }

    /// Reset the user's session, removing its files if the user's
    /// `auto_delete` setting is on.
    pub fn reset(&mut self, user: UserId) -> Result<()> {
        let delete_files = self.settings(user).auto_delete;
        if let Some(session) = self.sessions.get_mut(&user) {
            session.reset(delete_files)?;
        }
        Ok(())
    }
}
