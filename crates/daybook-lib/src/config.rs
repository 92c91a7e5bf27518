// ABOUTME: Vault location configuration resolved once at startup
// ABOUTME: Reads OBSIDIAN_VAULT_PATH with per-platform fallbacks and derives project paths

use crate::{DaybookError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the vault root
pub const VAULT_ENV_VAR: &str = "OBSIDIAN_VAULT_PATH";

/// Folder inside the vault that holds one directory per project
pub const PROJECTS_FOLDER: &str = "Projects";

/// Resolved filesystem locations used by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Vault root
    pub vault_path: PathBuf,
    /// `<vault>/Projects`
    pub projects_dir: PathBuf,
}

impl Config {
    /// Build a config rooted at an explicit vault path
    pub fn with_vault(vault_path: impl Into<PathBuf>) -> Self {
        let vault_path = vault_path.into();
        let projects_dir = vault_path.join(PROJECTS_FOLDER);
        Self {
            vault_path,
            projects_dir,
        }
    }

    /// Resolve the vault from the environment, falling back to the platform default
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(VAULT_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_vault_path().to_string());
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok();
        let vault = expand_home(&raw, home.as_deref())?;
        tracing::debug!(vault = %vault.display(), "resolved vault path");
        Ok(Self::with_vault(vault))
    }

    /// Directory of a named project inside the vault
    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.projects_dir.join(name)
    }
}

/// Platform default vault location, before `~` expansion
pub fn default_vault_path() -> &'static str {
    if cfg!(target_os = "macos") {
        "~/Library/Mobile Documents/iCloud~md~obsidian/Documents/MyVault"
    } else if cfg!(target_os = "windows") {
        "~/Documents/ObsidianVault"
    } else {
        "~/obsidian-vault"
    }
}

/// Expand a leading `~` against `home`
pub fn expand_home(raw: &str, home: Option<&str>) -> Result<PathBuf> {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };

    match rest {
        None => Ok(PathBuf::from(raw)),
        Some(rest) => {
            let home = home.ok_or_else(|| {
                DaybookError::Config(format!("cannot expand '{raw}': home directory is not set"))
            })?;
            let base = Path::new(home);
            Ok(if rest.is_empty() {
                base.to_path_buf()
            } else {
                base.join(rest)
            })
        }
    }
}
