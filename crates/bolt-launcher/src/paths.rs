use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const ENV_DATA_DIR: &str = "BOLT_DATA_DIR";
pub const DATA_DIR_NAME: &str = "bolt-launcher";

/// On-disk layout rooted at the sandbox home handed to launched games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    pub data_dir: PathBuf,
    /// Sibling of the data dir so desktop icon themes pick extracted icons up.
    pub icons_dir: PathBuf,
    pub rs3_path: PathBuf,
    pub rs3_hash_path: PathBuf,
    pub runelite_path: PathBuf,
    pub runelite_id_path: PathBuf,
    pub hdos_path: PathBuf,
    pub hdos_version_path: PathBuf,
    pub java_proxy_dir: PathBuf,
}

impl LauncherPaths {
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let icons_dir = match data_dir.parent() {
            Some(parent) => parent.join("icons"),
            None => data_dir.join("icons"),
        };
        Self {
            icons_dir,
            rs3_path: data_dir.join("rs3linux"),
            rs3_hash_path: data_dir.join("rs3linux.sha256"),
            runelite_path: data_dir.join("runelite.jar"),
            runelite_id_path: data_dir.join("runelite_id.bin"),
            hdos_path: data_dir.join("hdos-launcher.jar"),
            hdos_version_path: data_dir.join("hdos_version.bin"),
            java_proxy_dir: data_dir.join("java-proxy"),
            data_dir,
        }
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("create_dir_all {}", self.data_dir.display()))
    }
}

/// Explicit override, then `BOLT_DATA_DIR`, then the XDG data home.
pub fn effective_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(v) = non_empty_var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(v));
    }
    default_data_dir()
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(v) = non_empty_var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(v).join(DATA_DIR_NAME));
    }
    if let Some(v) = non_empty_var("HOME") {
        return Ok(PathBuf::from(v).join(".local/share").join(DATA_DIR_NAME));
    }
    bail!("could not determine data directory (set {ENV_DATA_DIR}, XDG_DATA_HOME or HOME)");
}

fn non_empty_var(name: &str) -> Option<OsString> {
    std::env::var_os(name).filter(|v| !v.is_empty())
}

/// Helper binary installed alongside the running executable. Test and
/// bench binaries live in cargo's `deps/`, one level below the real bins.
pub fn sibling_executable(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    sibling_in(exe.parent()?, name)
}

fn sibling_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut dirs = vec![dir];
    if dir.file_name() == Some(OsStr::new("deps")) {
        dirs.extend(dir.parent());
    }
    dirs.into_iter().map(|d| d.join(name)).find(|p| p.is_file())
}
