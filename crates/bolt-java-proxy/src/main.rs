//! Stands in for `${java.home}/bin/java` inside the HDOS sandbox and hands
//! off to the real interpreter.

use std::convert::Infallible;
use std::ffi::{OsStr, OsString};
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use bolt_launcher::launch::hdos::{ENV_BOLT_ARG_HOME, ENV_BOLT_JAVA_PATH};

fn main() -> ExitCode {
    bolt_launcher::logging::init();
    match try_main() {
        Ok(never) => match never {},
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<Infallible> {
    let java = std::env::var_os(ENV_BOLT_JAVA_PATH)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{ENV_BOLT_JAVA_PATH} is not set"))?;
    let args = forwarded_args(
        std::env::var_os(ENV_BOLT_ARG_HOME),
        std::env::args_os().skip(1),
    );
    tracing::debug!(java = ?java, argc = args.len(), "forwarding to java");
    Err(exec_java(&java, &args))
}

/// Replaces this process with `java`. Returns only when that fails.
#[cfg(unix)]
fn exec_java(java: &OsStr, args: &[OsString]) -> anyhow::Error {
    use std::os::unix::process::CommandExt as _;
    let err = std::process::Command::new(java).args(args).exec();
    anyhow::Error::new(err).context(format!("exec {}", java.to_string_lossy()))
}

// HDOS only re-runs its interpreter on unix hosts.
#[cfg(not(unix))]
fn exec_java(java: &OsStr, _args: &[OsString]) -> anyhow::Error {
    anyhow!("cannot hand off to {}: exec is unix-only", java.to_string_lossy())
}

/// Child JVMs started by HDOS lose the launcher's `-Duser.home`, so it is
/// put back in front of whatever HDOS passed.
fn forwarded_args(
    arg_home: Option<OsString>,
    rest: impl IntoIterator<Item = OsString>,
) -> Vec<OsString> {
    let mut args = Vec::new();
    if let Some(home) = arg_home.filter(|v| !v.is_empty()) {
        let mut flag = OsString::from("-Duser.home=");
        flag.push(home);
        args.push(flag);
    }
    args.extend(rest);
    args
}
