use crate::archive::{extract_deb, write_file, DebTargets};
use crate::config::LaunchContext;
use crate::process::LaunchPlan;
use crate::query::QueryParams;
use crate::state::{MarkerKind, StateMarker};

use super::{
    require_payload, with_session_env, LaunchVariant, Prepared, Rejection, Request,
    KEY_JX_CHARACTER_ID, KEY_JX_DISPLAY_NAME, KEY_JX_SESSION_ID,
};

pub const KEY_HASH: &str = "hash";
pub const KEY_CONFIG_URI: &str = "config_uri";

const KEYS: &[&str] = &[
    KEY_HASH,
    KEY_CONFIG_URI,
    KEY_JX_SESSION_ID,
    KEY_JX_CHARACTER_ID,
    KEY_JX_DISPLAY_NAME,
];

pub const RS3_EXECUTABLE_ENTRY: &str = "./usr/share/games/runescape-launcher/runescape";
pub const RS3_ICONS_PREFIX: &str = "./usr/share/icons/";

pub const RS3_PULSE_PROP_OVERRIDE: &str =
    "application.name='RuneScape' application.icon_name='runescape' media.role='game'";
pub const RS3_WMCLASS: &str = "RuneScape";

/// Native client shipped as a `.deb`. A `hash` parameter means the payload
/// carries a new package to unpack before launching.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rs3Deb;

impl LaunchVariant for Rs3Deb {
    fn name(&self) -> &'static str {
        "rs3-deb"
    }

    fn prepare(&self, ctx: &LaunchContext, request: &Request) -> Result<Prepared, Rejection> {
        let params = QueryParams::parse(&request.query, KEYS);
        let paths = &ctx.paths;

        let marker = match params.get(KEY_HASH) {
            Some(hash) => {
                let deb = require_payload(request)?;
                let targets = DebTargets {
                    executable_entry: RS3_EXECUTABLE_ENTRY,
                    icons_prefix: RS3_ICONS_PREFIX,
                    icons_dir: &paths.icons_dir,
                };
                let report = extract_deb(deb, &targets, |game| {
                    write_file(&paths.rs3_path, game, 0o755)
                })?;
                tracing::info!(
                    bytes = report.executable_len,
                    icons = report.icons_written,
                    "updated rs3 executable"
                );
                Some(StateMarker::new(MarkerKind::Hash, &paths.rs3_hash_path, hash))
            }
            None => None,
        };

        let plan = LaunchPlan::new(&paths.rs3_path, &paths.data_dir)
            .arg_pair("--configURI", params.get(KEY_CONFIG_URI))
            .env("HOME", &paths.data_dir)
            .env_default("PULSE_PROP_OVERRIDE", RS3_PULSE_PROP_OVERRIDE)
            .env_default("SDL_VIDEO_X11_WMCLASS", RS3_WMCLASS);
        let plan = with_session_env(plan, &params);

        Ok(Prepared { plan, marker })
    }
}
