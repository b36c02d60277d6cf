use std::io;
use std::path::Path;

use crate::archive::write_file;
use crate::config::LaunchContext;
use crate::process::LaunchPlan;
use crate::query::QueryParams;
use crate::response::{STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR};
use crate::runtime::{find_java, resolve_program, JAVA_BIN};
use crate::state::{MarkerKind, StateMarker};

use super::{
    prefixed, require_payload, with_session_env, LaunchVariant, Prepared, Rejection, Request,
    KEY_JX_CHARACTER_ID, KEY_JX_DISPLAY_NAME, KEY_JX_SESSION_ID,
};

pub const KEY_VERSION: &str = "version";

/// Real interpreter the java-proxy forwards to.
pub const ENV_BOLT_JAVA_PATH: &str = "BOLT_JAVA_PATH";
/// Home the java-proxy injects as `-Duser.home`.
pub const ENV_BOLT_ARG_HOME: &str = "BOLT_ARG_HOME";

const KEYS: &[&str] = &[
    KEY_VERSION,
    KEY_JX_SESSION_ID,
    KEY_JX_CHARACTER_ID,
    KEY_JX_DISPLAY_NAME,
];

/// HDOS launcher jar. HDOS re-executes `${java.home}/bin/java` for the
/// client, so it is pointed at a private sandbox whose `bin/java` is the
/// java-proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HdosJar;

impl LaunchVariant for HdosJar {
    fn name(&self) -> &'static str {
        "hdos-jar"
    }

    fn prepare(&self, ctx: &LaunchContext, request: &Request) -> Result<Prepared, Rejection> {
        let params = QueryParams::parse(&request.query, KEYS);
        let paths = &ctx.paths;

        let version = params.get(KEY_VERSION);
        let jar = match version {
            Some(_) => Some(require_payload(request)?),
            None => None,
        };

        let Some(java_home) = ctx.java_home.as_deref() else {
            return Err(Rejection::new(
                STATUS_BAD_REQUEST,
                "JAVA_HOME environment variable is required to run HDOS\n",
            ));
        };
        let java = find_java(Some(java_home), ctx.search_path.as_deref())
            .ok_or_else(Rejection::java_not_found)?;

        let sandbox = match resolve_program(&ctx.java_proxy_bin, ctx.search_path.as_deref()) {
            Some(proxy) => build_java_sandbox(java_home, &paths.java_proxy_dir, &proxy),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", ctx.java_proxy_bin.display()),
            )),
        };
        sandbox.map_err(|err| {
            tracing::warn!(
                dir = %paths.java_proxy_dir.display(),
                error = %err,
                "unable to build java sandbox"
            );
            Rejection::new(STATUS_INTERNAL_ERROR, "Unable to create symlinks\n")
        })?;

        let marker = match (version, jar) {
            (Some(version), Some(jar)) => {
                write_file(&paths.hdos_path, jar, 0o755).map_err(|err| {
                    tracing::warn!(
                        path = %paths.hdos_path.display(),
                        error = %err,
                        "failed to save jar"
                    );
                    Rejection::jar_save_failed()
                })?;
                Some(StateMarker::new(
                    MarkerKind::Version,
                    &paths.hdos_version_path,
                    version,
                ))
            }
            _ => None,
        };

        let home = paths.data_dir.as_os_str();
        let plan = LaunchPlan::new(&java, &paths.data_dir)
            .arg(prefixed("-Duser.home=", home))
            .arg(prefixed("-Dapp.user.home=", home))
            .arg(prefixed("-Djava.home=", paths.java_proxy_dir.as_os_str()))
            .arg("-jar")
            .arg(&paths.hdos_path)
            .env("HOME", home)
            .env(ENV_BOLT_JAVA_PATH, &java)
            .env(ENV_BOLT_ARG_HOME, home);
        let plan = with_session_env(plan, &params);

        Ok(Prepared { plan, marker })
    }
}

/// Recreates `sandbox` as a fake interpreter home: `lib` and `conf` link
/// into the real home, `bin/java` links to `proxy_bin`, which must be
/// absolute.
pub fn build_java_sandbox(java_home: &Path, sandbox: &Path, proxy_bin: &Path) -> io::Result<()> {
    if !proxy_bin.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("java-proxy link target is relative: {}", proxy_bin.display()),
        ));
    }
    let _ = std::fs::remove_dir_all(sandbox);
    std::fs::create_dir_all(sandbox)?;
    let bin = sandbox.join("bin");
    std::fs::create_dir(&bin)?;

    symlink(&java_home.join("lib"), &sandbox.join("lib"))?;
    symlink(&java_home.join("conf"), &sandbox.join("conf"))?;
    symlink(proxy_bin, &bin.join(JAVA_BIN))?;
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("symlinks unsupported: {}", link.display()),
    ))
}
