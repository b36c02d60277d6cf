use std::path::PathBuf;

use crate::archive::write_file;
use crate::config::LaunchContext;
use crate::process::LaunchPlan;
use crate::query::QueryParams;
use crate::runtime::find_java;
use crate::state::{MarkerKind, StateMarker};

use super::{
    prefixed, require_payload, with_session_env, LaunchVariant, Prepared, Rejection, Request,
    KEY_JX_CHARACTER_ID, KEY_JX_DISPLAY_NAME, KEY_JX_SESSION_ID,
};

pub const KEY_RL_PATH: &str = "rl_path";
pub const KEY_ID: &str = "id";

const KEYS: &[&str] = &[
    KEY_RL_PATH,
    KEY_ID,
    KEY_JX_SESSION_ID,
    KEY_JX_CHARACTER_ID,
    KEY_JX_DISPLAY_NAME,
];

/// RuneLite launcher jar. Either a caller-supplied jar (`rl_path`) or the
/// managed copy in the data dir, replaced from the payload when `id` is
/// given.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuneliteJar {
    /// Opens RuneLite's configuration window instead of the client.
    pub configure: bool,
}

impl LaunchVariant for RuneliteJar {
    fn name(&self) -> &'static str {
        if self.configure {
            "runelite-jar-configure"
        } else {
            "runelite-jar"
        }
    }

    fn prepare(&self, ctx: &LaunchContext, request: &Request) -> Result<Prepared, Rejection> {
        let params = QueryParams::parse(&request.query, KEYS);
        let paths = &ctx.paths;

        let (jar_path, marker) = match params.get(KEY_RL_PATH) {
            Some(rl_path) => (PathBuf::from(rl_path), None),
            None => {
                let marker = match params.get(KEY_ID) {
                    Some(id) => {
                        let jar = require_payload(request)?;
                        write_file(&paths.runelite_path, jar, 0o755).map_err(|err| {
                            tracing::warn!(
                                path = %paths.runelite_path.display(),
                                error = %err,
                                "failed to save jar"
                            );
                            Rejection::jar_save_failed()
                        })?;
                        Some(StateMarker::new(MarkerKind::Id, &paths.runelite_id_path, id))
                    }
                    None => None,
                };
                (paths.runelite_path.clone(), marker)
            }
        };

        let java = find_java(ctx.java_home.as_deref(), ctx.search_path.as_deref())
            .ok_or_else(Rejection::java_not_found)?;

        let home = paths.data_dir.as_os_str();
        let plan = LaunchPlan::new(java, &paths.data_dir)
            .arg(prefixed("-Duser.home=", home))
            .arg("-jar")
            .arg(jar_path)
            .arg(prefixed("-J-Duser.home=", home))
            .arg_if(self.configure, "--configure")
            .env("HOME", home);
        let plan = with_session_env(plan, &params);

        Ok(Prepared { plan, marker })
    }
}
