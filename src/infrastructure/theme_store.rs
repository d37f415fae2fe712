// Persisted UI theme preference
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeFile {
    theme: ThemePreference,
}

/// Loaded once at startup, written back on every change.
#[derive(Debug)]
pub struct ThemeStore {
    path: PathBuf,
    current: RwLock<ThemePreference>,
}

impl ThemeStore {
    /// Read the stored preference. A missing file means the default (dark).
    pub async fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let current = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => toml::from_str::<ThemeFile>(&raw)?.theme,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ThemePreference::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), theme = ?current, "theme preference loaded");
        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    pub async fn get(&self) -> ThemePreference {
        *self.current.read().await
    }

    /// Change the preference and persist it.
    pub async fn set(&self, theme: ThemePreference) -> anyhow::Result<()> {
        let mut current = self.current.write().await;
        persist(&self.path, theme).await?;
        *current = theme;
        tracing::info!(theme = ?theme, "theme preference changed");
        Ok(())
    }
}

async fn persist(path: &Path, theme: ThemePreference) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let raw = toml::to_string(&ThemeFile { theme })?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}
