use std::ffi::{OsStr, OsString};

use anyhow::{Context, Result};
use url::Url;

use crate::archive::ExtractError;
use crate::config::LaunchContext;
use crate::process::{spawn_detached, LaunchPlan};
use crate::query::QueryParams;
use crate::response::{SyntheticResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_OK};
use crate::state::StateMarker;

pub mod hdos;
pub mod rs3;
pub mod runelite;

pub use hdos::HdosJar;
pub use rs3::Rs3Deb;
pub use runelite::RuneliteJar;

pub const KEY_JX_SESSION_ID: &str = "jx_session_id";
pub const KEY_JX_CHARACTER_ID: &str = "jx_character_id";
pub const KEY_JX_DISPLAY_NAME: &str = "jx_display_name";

pub const ENV_JX_SESSION_ID: &str = "JX_SESSION_ID";
pub const ENV_JX_CHARACTER_ID: &str = "JX_CHARACTER_ID";
pub const ENV_JX_DISPLAY_NAME: &str = "JX_DISPLAY_NAME";

pub const ROUTE_RS3_DEB: &str = "/launch-rs3-deb";
pub const ROUTE_RUNELITE_JAR: &str = "/launch-runelite-jar";
pub const ROUTE_RUNELITE_JAR_CONFIGURE: &str = "/launch-runelite-jar-configure";
pub const ROUTE_HDOS_JAR: &str = "/launch-hdos-jar";

const JAVA_NOT_FOUND: &str = "Couldn't find Java: JAVA_HOME is either unset or does not point to a Java binary, and no binary named \"java\" exists in PATH.\n";
const JAR_SAVE_FAILED: &str =
    "Failed to save JAR; if the game is already running, close it and try again\n";

/// One inbound request from the embedded UI. Borrowed, never mutated, for
/// the duration of a launch.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub url: String,
    pub query: String,
    pub post_data: Option<Vec<Vec<u8>>>,
}

impl Request {
    pub fn new(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: query.into(),
            post_data: None,
        }
    }

    /// Splits the query out of a full URL.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("invalid request url: {url:?}"))?;
        Ok(Self::new(url, parsed.query().unwrap_or_default()))
    }

    pub fn with_post_element(mut self, bytes: Vec<u8>) -> Self {
        self.post_data.get_or_insert_with(Vec::new).push(bytes);
        self
    }

    /// The payload, provided there is exactly one element.
    pub fn single_payload(&self) -> Option<&[u8]> {
        match self.post_data.as_deref() {
            Some([only]) => Some(only.as_slice()),
            _ => None,
        }
    }
}

/// A request refused before anything was spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: u16,
    pub body: String,
}

impl Rejection {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn bad_request() -> Self {
        Self::new(STATUS_BAD_REQUEST, "Bad Request")
    }

    pub fn java_not_found() -> Self {
        Self::new(STATUS_INTERNAL_ERROR, JAVA_NOT_FOUND)
    }

    pub fn jar_save_failed() -> Self {
        Self::new(STATUS_INTERNAL_ERROR, JAR_SAVE_FAILED)
    }

    pub fn into_response(self) -> SyntheticResponse {
        SyntheticResponse::text(self.status, self.body)
    }
}

impl From<ExtractError> for Rejection {
    fn from(err: ExtractError) -> Self {
        tracing::warn!(error = %err, "deb extraction failed");
        Self::new(err.status(), err.body())
    }
}

/// A fully resolved launch plus the marker to record once it is running.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub plan: LaunchPlan,
    pub marker: Option<StateMarker>,
}

/// A launch flavour. Variants differ only in how they validate, update and
/// build the plan; spawning and responding are shared by [`execute`].
pub trait LaunchVariant {
    fn name(&self) -> &'static str;

    fn prepare(&self, ctx: &LaunchContext, request: &Request) -> Result<Prepared, Rejection>;
}

/// Spawns the prepared plan, then records its marker. The spawn has
/// already happened by the time the marker is written, so a marker failure
/// still answers 200.
pub fn execute(prepared: Prepared) -> SyntheticResponse {
    let Prepared { plan, marker } = prepared;
    if let Err(err) = spawn_detached(&plan) {
        tracing::error!("game process failed to start: {err:#}");
        return SyntheticResponse::text(STATUS_INTERNAL_ERROR, "Failed to start game process\n");
    }

    if let Some(marker) = marker {
        if let Err(err) = marker.save() {
            tracing::warn!(
                path = %marker.path.display(),
                error = %err,
                "unable to save {} file",
                marker.kind.label()
            );
            return SyntheticResponse::text(STATUS_OK, marker.unsaved_body());
        }
    }
    SyntheticResponse::ok()
}

pub fn handle(variant: &dyn LaunchVariant, ctx: &LaunchContext, request: &Request) -> SyntheticResponse {
    tracing::debug!(variant = variant.name(), url = %request.url, "launch request");
    match variant.prepare(ctx, request) {
        Ok(prepared) => execute(prepared),
        Err(rejection) => rejection.into_response(),
    }
}

static RS3_DEB: Rs3Deb = Rs3Deb;
static RUNELITE_JAR: RuneliteJar = RuneliteJar { configure: false };
static RUNELITE_JAR_CONFIGURE: RuneliteJar = RuneliteJar { configure: true };
static HDOS_JAR: HdosJar = HdosJar;

pub fn variant_for_path(path: &str) -> Option<&'static dyn LaunchVariant> {
    let variant: &'static dyn LaunchVariant = match path {
        ROUTE_RS3_DEB => &RS3_DEB,
        ROUTE_RUNELITE_JAR => &RUNELITE_JAR,
        ROUTE_RUNELITE_JAR_CONFIGURE => &RUNELITE_JAR_CONFIGURE,
        ROUTE_HDOS_JAR => &HDOS_JAR,
        _ => return None,
    };
    Some(variant)
}

/// Entry point for the embedding layer.
#[derive(Debug, Clone)]
pub struct Launcher {
    ctx: LaunchContext,
}

impl Launcher {
    pub fn new(ctx: LaunchContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &LaunchContext {
        &self.ctx
    }

    /// `None` when the URL is not a launch route.
    pub fn handle(&self, request: &Request) -> Option<SyntheticResponse> {
        let url = Url::parse(&request.url).ok()?;
        let variant = variant_for_path(url.path())?;
        Some(handle(variant, &self.ctx, request))
    }

    pub fn open_external_url(&self, url: &str) -> Result<u32> {
        crate::opener::open_external_url(&self.ctx.paths, url)
    }

    pub fn browse_data(&self) -> Result<u32> {
        crate::opener::browse_data(&self.ctx.paths)
    }
}

/// Payload of an update-carrying request.
fn require_payload(request: &Request) -> Result<&[u8], Rejection> {
    request.single_payload().ok_or_else(Rejection::bad_request)
}

fn with_session_env(plan: LaunchPlan, params: &QueryParams) -> LaunchPlan {
    plan.env_opt(ENV_JX_SESSION_ID, params.get(KEY_JX_SESSION_ID))
        .env_opt(ENV_JX_CHARACTER_ID, params.get(KEY_JX_CHARACTER_ID))
        .env_opt(ENV_JX_DISPLAY_NAME, params.get(KEY_JX_DISPLAY_NAME))
}

fn prefixed(prefix: &str, value: &OsStr) -> OsString {
    let mut out = OsString::from(prefix);
    out.push(value);
    out
}
