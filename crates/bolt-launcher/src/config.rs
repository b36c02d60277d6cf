use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths::{effective_data_dir, sibling_executable, LauncherPaths};

pub const CONFIG_SCHEMA_VERSION: &str = "bolt.launcher.config@0.1.0";
pub const CONFIG_FILE: &str = "launcher.json";

pub const ENV_JAVA_HOME: &str = "JAVA_HOME";
pub const JAVA_PROXY_BIN: &str = "java-proxy";

/// Optional `launcher.json` in the data dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_home: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_proxy_bin: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            java_home: None,
            java_proxy_bin: None,
        }
    }
}

impl LauncherConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Self =
            serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
        if cfg.schema_version != CONFIG_SCHEMA_VERSION {
            bail!(
                "unsupported config schema_version: {} (expected {CONFIG_SCHEMA_VERSION})",
                cfg.schema_version
            );
        }
        Ok(cfg)
    }
}

/// Inputs every launch variant reads. Built once by the embedding layer.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub paths: LauncherPaths,
    /// Interpreter home hint; `JAVA_HOME` unless the config overrides it.
    pub java_home: Option<PathBuf>,
    /// PATH-style list searched when the home hint has no interpreter.
    pub search_path: Option<OsString>,
    /// Binary that the private interpreter sandbox links `bin/java` to.
    pub java_proxy_bin: PathBuf,
}

impl LaunchContext {
    pub fn new(paths: LauncherPaths) -> Self {
        Self {
            paths,
            java_home: None,
            search_path: None,
            java_proxy_bin: PathBuf::from(JAVA_PROXY_BIN),
        }
    }

    pub fn from_env(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = effective_data_dir(data_dir)?;
        let cfg = LauncherConfig::load(&data_dir.join(CONFIG_FILE))?;
        let paths = LauncherPaths::from_data_dir(data_dir);
        paths.ensure_data_dir()?;

        let java_home = java_home_hint(cfg.java_home, std::env::var_os(ENV_JAVA_HOME));
        // A bare name is looked up on PATH when the sandbox is built.
        let java_proxy_bin = cfg
            .java_proxy_bin
            .or_else(|| sibling_executable(JAVA_PROXY_BIN))
            .unwrap_or_else(|| PathBuf::from(JAVA_PROXY_BIN));

        Ok(Self {
            paths,
            java_home,
            search_path: std::env::var_os("PATH"),
            java_proxy_bin,
        })
    }
}

/// Config override first, then the inherited `JAVA_HOME`. An empty
/// `JAVA_HOME` counts as unset.
fn java_home_hint(configured: Option<PathBuf>, inherited: Option<OsString>) -> Option<PathBuf> {
    configured.or_else(|| inherited.filter(|v| !v.is_empty()).map(PathBuf::from))
}
