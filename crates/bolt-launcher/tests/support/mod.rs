#![allow(dead_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const GAME_ENTRY: &str = "./usr/share/games/runescape-launcher/runescape";

pub enum TarItem<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

/// Tar with names stored verbatim, `./` prefixes included.
pub fn tar_bytes(items: &[TarItem<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for item in items {
        let (name, data, kind, mode): (&str, &[u8], tar::EntryType, u32) = match item {
            TarItem::File(name, data) => (*name, *data, tar::EntryType::Regular, 0o755),
            TarItem::Dir(name) => (*name, &[][..], tar::EntryType::Directory, 0o755),
        };
        let mut header = tar::Header::new_gnu();
        {
            let raw = &mut header.as_old_mut().name;
            assert!(name.len() < raw.len(), "tar name too long: {name}");
            raw[..name.len()].copy_from_slice(name.as_bytes());
        }
        header.set_entry_type(kind);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder.append(&header, data).expect("append tar entry");
    }
    builder.into_inner().expect("finish tar")
}

pub fn xz(bytes: &[u8]) -> Vec<u8> {
    let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
    enc.write_all(bytes).expect("xz write");
    enc.finish().expect("xz finish")
}

/// `ar` container with the given members, in order.
pub fn ar_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ar::Builder::new(Vec::new());
    for (name, data) in members {
        let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
        builder.append(&header, *data).expect("append ar member");
    }
    builder.into_inner().expect("finish ar")
}

/// A `.deb` shaped like the native client package.
pub fn deb_with(items: &[TarItem<'_>]) -> Vec<u8> {
    let control = xz(&tar_bytes(&[]));
    let data = xz(&tar_bytes(items));
    ar_bytes(&[
        ("debian-binary", &b"2.0\n"[..]),
        ("control.tar.xz", control.as_slice()),
        ("data.tar.xz", data.as_slice()),
    ])
}

/// Shell script that records `$0 $@` and selected env vars under `$HOME`.
pub fn recorder_script(out_name: &str) -> String {
    format!(
        "#!/bin/sh\n\
         {{ printf '%s\\n' \"$0\" \"$@\"; printf 'HOME=%s\\n' \"$HOME\"; \
         printf 'JX_SESSION_ID=%s\\n' \"$JX_SESSION_ID\"; \
         printf 'BOLT_JAVA_PATH=%s\\n' \"$BOLT_JAVA_PATH\"; \
         printf 'BOLT_ARG_HOME=%s\\n' \"$BOLT_ARG_HOME\"; \
         printf 'PWD=%s\\n' \"$(pwd)\"; }} > \"$HOME/{out_name}.tmp\"\n\
         mv \"$HOME/{out_name}.tmp\" \"$HOME/{out_name}\"\n"
    )
}

pub fn write_executable(path: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt as _;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, contents).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
}

pub fn wait_for_file(path: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Ok(s) = std::fs::read_to_string(path) {
            return s;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("{} was never written", path.display());
}

pub fn data_dir(root: &Path) -> PathBuf {
    let dir = root.join("share").join("bolt-launcher");
    std::fs::create_dir_all(&dir).expect("mkdir data dir");
    dir
}

/// Pulls the whole body through the read protocol.
pub fn drain(resp: &mut bolt_launcher::SyntheticResponse) -> (u16, String) {
    assert!(resp.open());
    let status = resp.headers().status;
    let mut body = Vec::new();
    let mut buf = [0u8; 7];
    loop {
        let r = resp.read(&mut buf);
        if r.status == bolt_launcher::ReadStatus::Stop {
            assert_eq!(r.bytes_read, 0);
            break;
        }
        body.extend_from_slice(&buf[..r.bytes_read]);
    }
    (status, String::from_utf8(body).expect("utf8 body"))
}
