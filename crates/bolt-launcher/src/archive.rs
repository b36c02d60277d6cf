use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Read, Write as _};
use std::path::{Component, Path, PathBuf};

use xz2::read::XzDecoder;

use crate::response::{SyntheticResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR};

/// Member of the outer `ar` container holding the compressed payload.
pub const DEB_DATA_MEMBER: &str = "data.tar.xz";

/// What to pull out of a `.deb` payload.
#[derive(Debug, Clone)]
pub struct DebTargets<'a> {
    /// Exact tar path of the executable, e.g. `./usr/share/games/x/x`.
    pub executable_entry: &'a str,
    /// Tar path prefix of icon entries, with trailing slash.
    pub icons_prefix: &'a str,
    /// Destination mirroring the tree below `icons_prefix`.
    pub icons_dir: &'a Path,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub executable_len: usize,
    pub icons_written: usize,
    pub icons_failed: usize,
}

#[derive(Debug)]
pub enum ExtractError {
    MalformedOuter(io::Error),
    MissingInner,
    MalformedInner(io::Error),
    MissingExecutable,
    Persist(io::Error),
}

impl ExtractError {
    pub fn status(&self) -> u16 {
        match self {
            ExtractError::Persist(_) => STATUS_INTERNAL_ERROR,
            _ => STATUS_BAD_REQUEST,
        }
    }

    /// Response body shown to the UI.
    pub fn body(&self) -> &'static str {
        match self {
            ExtractError::MalformedOuter(_) => "Malformed .deb file\n",
            ExtractError::MissingInner => "No data in .deb file\n",
            ExtractError::MalformedInner(_) => "Malformed .tar.xz file\n",
            ExtractError::MissingExecutable => "No target executable in .tar.xz file\n",
            ExtractError::Persist(_) => {
                "Failed to save executable; if the game is already running, close it and try again\n"
            }
        }
    }

    pub fn into_response(self) -> SyntheticResponse {
        SyntheticResponse::text(self.status(), self.body())
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::MalformedOuter(e) => write!(f, "malformed outer archive: {e}"),
            ExtractError::MissingInner => write!(f, "missing inner archive {DEB_DATA_MEMBER}"),
            ExtractError::MalformedInner(e) => write!(f, "malformed inner archive: {e}"),
            ExtractError::MissingExecutable => write!(f, "missing target executable"),
            ExtractError::Persist(e) => write!(f, "failed to persist executable: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::MalformedOuter(e)
            | ExtractError::MalformedInner(e)
            | ExtractError::Persist(e) => Some(e),
            ExtractError::MissingInner | ExtractError::MissingExecutable => None,
        }
    }
}

/// Unpacks a `.deb` held in memory.
///
/// The executable entry is read fully and passed to `persist_executable` as
/// soon as it is found; a failure there aborts with [`ExtractError::Persist`].
/// Icon entries are written under `targets.icons_dir` on a best-effort basis.
/// Every intermediate buffer is owned by this call and dropped on return.
pub fn extract_deb<F>(
    deb: &[u8],
    targets: &DebTargets<'_>,
    mut persist_executable: F,
) -> Result<ExtractReport, ExtractError>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    let inner = read_data_member(deb)?;

    let mut tar = tar::Archive::new(XzDecoder::new(inner.as_slice()));
    let entries = tar.entries().map_err(ExtractError::MalformedInner)?;

    let mut report = ExtractReport::default();
    let mut found = false;
    for entry in entries {
        let mut entry = entry.map_err(ExtractError::MalformedInner)?;
        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        if path == targets.executable_entry {
            let size = entry.size();
            let game = read_declared(&mut entry, size).map_err(ExtractError::MalformedInner)?;
            persist_executable(&game).map_err(ExtractError::Persist)?;
            report.executable_len = game.len();
            found = true;
        } else if let Some(rel) = path.strip_prefix(targets.icons_prefix) {
            let Some(dest) = icon_destination(targets.icons_dir, rel) else {
                tracing::warn!(entry = %path, "skipping icon with unsafe path");
                report.icons_failed += 1;
                continue;
            };
            if path.ends_with('/') {
                let _ = create_dir(&dest);
                continue;
            }
            let size = entry.size();
            let icon = read_declared(&mut entry, size).map_err(ExtractError::MalformedInner)?;
            match write_file(&dest, &icon, 0o755) {
                Ok(()) => report.icons_written += 1,
                Err(err) => {
                    tracing::warn!(path = %dest.display(), error = %err, "failed to save an icon");
                    report.icons_failed += 1;
                }
            }
        }
    }

    if !found {
        return Err(ExtractError::MissingExecutable);
    }
    tracing::debug!(
        executable_len = report.executable_len,
        icons_written = report.icons_written,
        icons_failed = report.icons_failed,
        "extracted deb payload"
    );
    Ok(report)
}

fn read_data_member(deb: &[u8]) -> Result<Vec<u8>, ExtractError> {
    let mut outer = ar::Archive::new(deb);
    loop {
        let Some(entry) = outer.next_entry() else {
            return Err(ExtractError::MissingInner);
        };
        let mut entry = entry.map_err(ExtractError::MalformedOuter)?;
        if !is_data_member(entry.header().identifier()) {
            continue;
        }
        let size = entry.header().size();
        if size > deb.len() as u64 {
            return Err(ExtractError::MalformedOuter(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{DEB_DATA_MEMBER} declares {size} bytes, container is {}", deb.len()),
            )));
        }
        return read_declared(&mut entry, size).map_err(ExtractError::MalformedOuter);
    }
}

fn is_data_member(identifier: &[u8]) -> bool {
    let name = identifier.strip_suffix(b"/").unwrap_or(identifier);
    name == DEB_DATA_MEMBER.as_bytes()
}

/// Reads exactly `size` bytes, looping over short reads. Running out of
/// input early is an `UnexpectedEof` error.
pub fn read_declared<R: Read + ?Sized>(reader: &mut R, size: u64) -> io::Result<Vec<u8>> {
    let want = usize::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "entry too large"))?;
    let mut out = Vec::with_capacity(want.min(1024 * 1024));
    let mut buf = [0u8; 64 * 1024];
    while out.len() < want {
        let cap = buf.len().min(want - out.len());
        match reader.read(&mut buf[..cap]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("entry truncated at {} of {want} bytes", out.len()),
                ))
            }
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

fn icon_destination(icons_dir: &Path, rel: &str) -> Option<PathBuf> {
    let mut out = icons_dir.to_path_buf();
    for c in Path::new(rel).components() {
        match c {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => return None,
            Component::CurDir => {}
            Component::Normal(p) => out.push(p),
        }
    }
    Some(out)
}

/// Truncating write; `mode` applies when the file is created.
pub fn write_file(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }
    let mut file = opts.open(path)?;
    file.write_all(bytes)?;
    Ok(())
}

fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o755);
    }
    builder.create(path)
}
