pub mod archive;
pub mod config;
pub mod launch;
pub mod logging;
pub mod opener;
pub mod paths;
pub mod process;
pub mod query;
mod reaper_joiner;
pub mod response;
pub mod runtime;
pub mod state;

pub use archive::{extract_deb, DebTargets, ExtractError, ExtractReport, DEB_DATA_MEMBER};
pub use config::{LaunchContext, LauncherConfig, CONFIG_FILE, CONFIG_SCHEMA_VERSION};
pub use launch::{
    execute, handle, variant_for_path, HdosJar, LaunchVariant, Launcher, Prepared, Rejection,
    Request, Rs3Deb, RuneliteJar,
};
pub use opener::{browse_data, open_external_url, opener_plan};
pub use paths::{effective_data_dir, LauncherPaths};
pub use process::{spawn_detached, EnvMode, EnvVar, LaunchPlan};
pub use query::{decode_component, parse_query, QueryParams};
pub use response::{ReadResult, ReadStatus, ResponseHeaders, SyntheticResponse};
pub use runtime::{find_interpreter, find_java, resolve_program};
pub use state::{read_marker, MarkerKind, StateMarker};
