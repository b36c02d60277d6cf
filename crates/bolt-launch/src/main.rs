use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bolt_launcher::{
    read_marker, LaunchContext, Launcher, LauncherPaths, ReadStatus, Request, SyntheticResponse,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

const STATUS_SCHEMA_VERSION: &str = "bolt.launch.status@0.1.0";

#[derive(Debug, Parser)]
#[command(name = "bolt-launch")]
#[command(about = "Drive the Bolt launch core from the command line.", long_about = None)]
struct Cli {
    /// Overrides BOLT_DATA_DIR and the XDG default.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Handle one launch URL, e.g. `https://bolt-internal/launch-rs3-deb?hash=..`.
    Launch(LaunchArgs),
    /// Print the recorded hash/id/version markers.
    Status(StatusArgs),
    /// Open a link with xdg-open.
    Open { url: String },
    /// Open the data directory with xdg-open.
    Browse,
}

#[derive(Debug, Args)]
struct LaunchArgs {
    url: String,

    /// Payload element; repeat to send several (rejected by every route).
    #[arg(long = "post-file")]
    post_files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    schema_version: &'static str,
    data_dir: String,
    rs3_hash: Option<String>,
    runelite_id: Option<String>,
    hdos_version: Option<String>,
}

fn main() -> std::process::ExitCode {
    bolt_launcher::logging::init();
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Launch(args) => cmd_launch(cli.data_dir, args),
        Command::Status(args) => cmd_status(cli.data_dir, args),
        Command::Open { url } => cmd_open(cli.data_dir, Some(&url)),
        Command::Browse => cmd_open(cli.data_dir, None),
    }
}

fn cmd_open(data_dir: Option<PathBuf>, url: Option<&str>) -> Result<std::process::ExitCode> {
    let data_dir = bolt_launcher::effective_data_dir(data_dir)?;
    let launcher = Launcher::new(LaunchContext::new(LauncherPaths::from_data_dir(data_dir)));
    let pid = match url {
        Some(url) => launcher.open_external_url(url)?,
        None => launcher.browse_data()?,
    };
    println!("{pid}");
    Ok(std::process::ExitCode::SUCCESS)
}

fn cmd_launch(data_dir: Option<PathBuf>, args: LaunchArgs) -> Result<std::process::ExitCode> {
    let ctx = LaunchContext::from_env(data_dir)?;
    let launcher = Launcher::new(ctx);

    let mut request = Request::from_url(&args.url)?;
    for path in &args.post_files {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        request = request.with_post_element(bytes);
    }

    let Some(mut resp) = launcher.handle(&request) else {
        anyhow::bail!("not a launch route: {}", args.url);
    };
    let status = write_response(&mut resp, &mut std::io::stdout().lock())?;
    if status == 200 {
        Ok(std::process::ExitCode::SUCCESS)
    } else {
        Ok(std::process::ExitCode::from(1))
    }
}

/// Serves `resp` the way a browser host would and writes
/// `<status> <mime>\n<body>` to `out`.
fn write_response(resp: &mut SyntheticResponse, out: &mut dyn std::io::Write) -> Result<u16> {
    if !resp.open() {
        resp.cancel();
        anyhow::bail!("response refused to open");
    }
    let headers = resp.headers();
    writeln!(out, "{} {}", headers.status, headers.mime_type)?;

    let mut buf = [0u8; 4096];
    loop {
        let r = resp.read(&mut buf);
        if r.status == ReadStatus::Stop {
            break;
        }
        if let Err(err) = out.write_all(&buf[..r.bytes_read]) {
            resp.cancel();
            return Err(err).context("write response body");
        }
    }
    out.flush()?;
    Ok(headers.status)
}

fn cmd_status(data_dir: Option<PathBuf>, args: StatusArgs) -> Result<std::process::ExitCode> {
    let data_dir = bolt_launcher::effective_data_dir(data_dir)?;
    let report = status_report(&LauncherPaths::from_data_dir(data_dir));
    if args.json {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        println!("data_dir: {}", report.data_dir);
        println!("rs3 hash: {}", report.rs3_hash.as_deref().unwrap_or("-"));
        println!("runelite id: {}", report.runelite_id.as_deref().unwrap_or("-"));
        println!("hdos version: {}", report.hdos_version.as_deref().unwrap_or("-"));
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn status_report(paths: &LauncherPaths) -> StatusReport {
    let marker = |p: &Path| read_marker(p).map(|v| v.trim().to_string());
    StatusReport {
        schema_version: STATUS_SCHEMA_VERSION,
        data_dir: paths.data_dir.display().to_string(),
        rs3_hash: marker(&paths.rs3_hash_path),
        runelite_id: marker(&paths.runelite_id_path),
        hdos_version: marker(&paths.hdos_version_path),
    }
}
