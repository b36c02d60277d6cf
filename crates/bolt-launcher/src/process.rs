use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::reaper_joiner;

const TEXT_BUSY_RETRY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    /// Replace any inherited value.
    Override,
    /// Only set when the launcher's own environment lacks the variable.
    IfUnset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: &'static str,
    pub value: OsString,
    pub mode: EnvMode,
}

/// Everything needed for one spawn. Built fresh per request and dropped
/// once the child is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<EnvVar>,
    working_dir: PathBuf,
}

impl LaunchPlan {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_if(self, cond: bool, arg: impl Into<OsString>) -> Self {
        if cond {
            self.arg(arg)
        } else {
            self
        }
    }

    /// Appends `flag value` as two arguments when `value` is present.
    pub fn arg_pair(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    pub fn env(mut self, name: &'static str, value: impl Into<OsString>) -> Self {
        self.env.push(EnvVar {
            name,
            value: value.into(),
            mode: EnvMode::Override,
        });
        self
    }

    pub fn env_default(mut self, name: &'static str, value: impl Into<OsString>) -> Self {
        self.env.push(EnvVar {
            name,
            value: value.into(),
            mode: EnvMode::IfUnset,
        });
        self
    }

    pub fn env_opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.env(name, value),
            None => self,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn env_vars(&self) -> &[EnvVar] {
        &self.env
    }

    /// Last value the plan sets for `name`.
    pub fn env_value(&self, name: &str) -> Option<&OsString> {
        self.env
            .iter()
            .rev()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Starts the plan's program in its own process group with stdin closed
/// and returns its pid.
///
/// The child is never waited on here; it is handed to the background
/// joiner so it does not linger as a zombie after exiting. A failed
/// `chdir` or `exec` in the child surfaces as an error from this call.
pub fn spawn_detached(plan: &LaunchPlan) -> Result<u32> {
    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.args);
    cmd.current_dir(&plan.working_dir);
    for var in &plan.env {
        match var.mode {
            EnvMode::Override => {
                cmd.env(var.name, &var.value);
            }
            EnvMode::IfUnset => {
                if std::env::var_os(var.name).is_none() {
                    cmd.env(var.name, &var.value);
                }
            }
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        unsafe {
            cmd.pre_exec(|| {
                if libc::setpgid(0, 0) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                libc::close(libc::STDIN_FILENO);
                Ok(())
            });
        }
    }
    #[cfg(not(unix))]
    {
        cmd.stdin(std::process::Stdio::null());
    }

    let spawned = match cmd.spawn() {
        Err(err) if text_file_busy(&err) => {
            tracing::debug!(program = %plan.program.display(), "executable busy, retrying spawn");
            std::thread::sleep(TEXT_BUSY_RETRY);
            cmd.spawn()
        }
        other => other,
    };
    let child = spawned.with_context(|| {
        format!(
            "spawn {} in {}",
            plan.program.display(),
            plan.working_dir.display()
        )
    })?;
    let pid = child.id();
    tracing::info!(pid, program = %plan.program.display(), "spawned game process");

    reaper_joiner::register(child, plan.program.display().to_string());
    Ok(pid)
}

/// A just-written executable can still be open for writing in a child
/// forked by another thread.
fn text_file_busy(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ETXTBSY)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}
