use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const JAVA_BIN: &str = "java";

/// Finds `name` for an interpreter install.
///
/// `<home>/bin/<name>` wins outright when it exists; PATH is only searched
/// without a hit there. `None` is final: nothing exists at any candidate.
pub fn find_interpreter(
    name: &str,
    home: Option<&Path>,
    search_path: Option<&OsStr>,
) -> Option<PathBuf> {
    if let Some(home) = home {
        let cand = home.join("bin").join(name);
        if cand.exists() {
            return Some(cand);
        }
    }

    let search_path = search_path?;
    for dir in std::env::split_paths(search_path) {
        let cand = dir.join(name);
        if cand.exists() {
            return Some(cand);
        }
    }
    None
}

pub fn find_java(java_home: Option<&Path>, search_path: Option<&OsStr>) -> Option<PathBuf> {
    find_interpreter(JAVA_BIN, java_home, search_path)
}

/// Absolute location of an existing `program`, for uses that get no PATH
/// lookup of their own such as symlink targets.
///
/// A bare name is searched on `search_path`; any other relative path is
/// taken against the current directory.
pub fn resolve_program(program: &Path, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let bare = !program.is_absolute() && program.components().count() == 1;
    let found = if bare {
        find_interpreter(program.to_str()?, None, search_path)?
    } else {
        program.to_path_buf()
    };
    let found = if found.is_absolute() {
        found
    } else {
        std::env::current_dir().ok()?.join(found)
    };
    found.is_file().then_some(found)
}
