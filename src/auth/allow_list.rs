use actix_web::web;
use anyhow::{Context, Result};
use futures::lock::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct AllowListFile {
    enabled: bool,
    emails: BTreeSet<String>,
}

/// Which emails may log in. Loaded once at start and persisted back to
/// its file on every admin change.
pub struct AllowList {
    path: PathBuf,
    state: RwLock<AllowListFile>,
    writer: Mutex<()>,
}

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AllowList {
    /// A missing file means restriction off and nobody listed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading allow-list {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing allow-list {}", path.display()))?
        } else {
            AllowListFile::default()
        };

        info!(
            path = %path.display(),
            enabled = state.enabled,
            entries = state.emails.len(),
            "Allow-list loaded"
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    pub fn is_permitted(&self, email: &str) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        !state.enabled || state.emails.contains(&normalize(email))
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).enabled
    }

    pub fn emails(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .emails
            .iter()
            .cloned()
            .collect()
    }

    /// Returns false if the email was already listed.
    pub async fn add(&self, email: &str) -> Result<bool> {
        let _writer = self.writer.lock().await;
        let (added, snapshot) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let added = state.emails.insert(normalize(email));
            (added, state.clone())
        };
        if added {
            self.persist(snapshot).await?;
        }
        Ok(added)
    }

    /// Returns false if the email was not listed.
    pub async fn remove(&self, email: &str) -> Result<bool> {
        let _writer = self.writer.lock().await;
        let (removed, snapshot) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let removed = state.emails.remove(&normalize(email));
            (removed, state.clone())
        };
        if removed {
            self.persist(snapshot).await?;
        }
        Ok(removed)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.enabled = enabled;
            state.clone()
        };
        self.persist(snapshot).await
    }

    /// File I/O runs on the blocking pool with no lock on `state` held;
    /// `writer` keeps concurrent changes landing on disk in order.
    async fn persist(&self, snapshot: AllowListFile) -> Result<()> {
        let path = self.path.clone();
        web::block(move || write_file(&path, &snapshot))
            .await
            .context("allow-list writer stopped")?
    }
}

fn write_file(path: &Path, state: &AllowListFile) -> Result<()> {
    let body = serde_json::to_string_pretty(state)?;
    fs::write(path, body).with_context(|| format!("writing allow-list {}", path.display()))
}
