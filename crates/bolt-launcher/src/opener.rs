//! Fire-and-forget hand-off of links and folders to the desktop opener.

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use crate::paths::LauncherPaths;
use crate::process::{spawn_detached, LaunchPlan};

pub const OPENER_ENV: &str = "/usr/bin/env";
pub const OPENER: &str = "xdg-open";

/// `/usr/bin/env xdg-open <target>`, run from `working_dir`.
pub fn opener_plan(target: impl Into<OsString>, working_dir: &Path) -> LaunchPlan {
    LaunchPlan::new(OPENER_ENV, working_dir)
        .arg(OPENER)
        .arg(target)
}

/// Opens `url` in the user's browser and returns the opener's pid.
pub fn open_external_url(paths: &LauncherPaths, url: &str) -> Result<u32> {
    let url = Url::parse(url).with_context(|| format!("parse external url {url:?}"))?;
    spawn_detached(&opener_plan(url.as_str(), &paths.data_dir))
}

/// Shows the data directory in the file manager.
pub fn browse_data(paths: &LauncherPaths) -> Result<u32> {
    spawn_detached(&opener_plan(&paths.data_dir, &paths.data_dir))
}
