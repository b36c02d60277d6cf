#![cfg(unix)]

mod support;

use std::path::Path;

use bolt_launcher::{LaunchContext, Launcher, LauncherPaths, Request};
use support::{
    data_dir, deb_with, drain, recorder_script, wait_for_file, write_executable, TarItem,
    GAME_ENTRY,
};

fn launcher(root: &Path) -> Launcher {
    Launcher::new(LaunchContext::new(LauncherPaths::from_data_dir(data_dir(root))))
}

fn fake_jdk(root: &Path) -> std::path::PathBuf {
    let jdk = root.join("jdk");
    for dir in ["lib", "conf"] {
        std::fs::create_dir_all(jdk.join(dir)).expect("mkdir");
    }
    write_executable(&jdk.join("bin/java"), &recorder_script("java-argv.txt"));
    jdk
}

#[test]
fn unknown_route_is_not_handled() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let req = Request::new("https://bolt-internal/open-external-url", "");
    assert!(launcher.handle(&req).is_none());
}

#[test]
fn update_without_payload_is_rejected_before_anything_runs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let paths = launcher.context().paths.clone();

    for (url, query) in [
        ("https://bolt-internal/launch-rs3-deb", "hash=abc"),
        ("https://bolt-internal/launch-runelite-jar", "id=1"),
        ("https://bolt-internal/launch-hdos-jar", "version=2"),
    ] {
        let mut resp = launcher
            .handle(&Request::new(url, query))
            .expect("launch route");
        assert_eq!(drain(&mut resp), (400, "Bad Request".to_string()), "{url}");

        let two = Request::new(url, query)
            .with_post_element(b"a".to_vec())
            .with_post_element(b"b".to_vec());
        let mut resp = launcher.handle(&two).expect("launch route");
        assert_eq!(drain(&mut resp).0, 400, "{url}");
    }

    assert!(!paths.rs3_path.exists());
    assert!(!paths.rs3_hash_path.exists());
    assert!(!paths.runelite_path.exists());
    assert!(!paths.hdos_path.exists());
}

#[test]
fn rs3_update_then_launch_passes_config_uri() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let paths = launcher.context().paths.clone();

    let script = recorder_script("rs3-argv.txt");
    let deb = deb_with(&[
        TarItem::Dir("./usr/share/icons/"),
        TarItem::Dir("./usr/share/icons/hicolor/"),
        TarItem::File("./usr/share/icons/hicolor/runescape.png", b"png"),
        TarItem::File(GAME_ENTRY, script.as_bytes()),
    ]);
    let req = Request::from_url(
        "https://bolt-internal/launch-rs3-deb?hash=deadbeef&config_uri=http%3A%2F%2Fx&jx_session_id=s%2B1",
    )
    .expect("url")
    .with_post_element(deb);

    let mut resp = launcher.handle(&req).expect("launch route");
    assert_eq!(drain(&mut resp), (200, "OK\n".to_string()));
    assert_eq!(
        std::fs::read_to_string(&paths.rs3_hash_path).expect("hash marker"),
        "deadbeef"
    );
    assert_eq!(
        std::fs::read(paths.icons_dir.join("hicolor/runescape.png")).expect("icon"),
        b"png"
    );

    let out = wait_for_file(&paths.data_dir.join("rs3-argv.txt"));
    let lines: Vec<&str> = out.lines().collect();
    let exe = paths.rs3_path.display().to_string();
    let home = paths.data_dir.display().to_string();
    assert_eq!(lines[0], exe);
    assert_eq!(lines[1], "--configURI");
    assert_eq!(lines[2], "http://x");
    assert!(lines.contains(&format!("HOME={home}").as_str()));
    assert!(lines.contains(&"JX_SESSION_ID=s+1"));
    assert!(lines.contains(&format!("PWD={home}").as_str()));
}

#[test]
fn rs3_plain_launch_has_no_config_uri() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let paths = launcher.context().paths.clone();
    write_executable(&paths.rs3_path, &recorder_script("plain-argv.txt"));

    let mut resp = launcher
        .handle(&Request::new("https://bolt-internal/launch-rs3-deb", ""))
        .expect("launch route");
    assert_eq!(drain(&mut resp), (200, "OK\n".to_string()));

    let out = wait_for_file(&paths.data_dir.join("plain-argv.txt"));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], paths.rs3_path.display().to_string());
    assert!(lines[1].starts_with("HOME="), "unexpected argv: {lines:?}");
    assert!(!out.contains("--configURI"));
    assert!(!paths.rs3_hash_path.exists());
}

#[test]
fn marker_save_failure_still_answers_ok() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let paths = launcher.context().paths.clone();
    // A directory where the marker file belongs makes the save fail.
    std::fs::create_dir_all(&paths.rs3_hash_path).expect("mkdir");

    let deb = deb_with(&[TarItem::File(GAME_ENTRY, b"#!/bin/sh\nexit 0\n")]);
    let req = Request::new("https://bolt-internal/launch-rs3-deb", "hash=abc").with_post_element(deb);
    let mut resp = launcher.handle(&req).expect("launch route");
    assert_eq!(
        drain(&mut resp),
        (200, "OK, but unable to save hash file\n".to_string())
    );
}

#[test]
fn missing_game_executable_is_spawn_failure() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let launcher = launcher(tmp.path());
    let mut resp = launcher
        .handle(&Request::new("https://bolt-internal/launch-rs3-deb", ""))
        .expect("launch route");
    assert_eq!(
        drain(&mut resp),
        (500, "Failed to start game process\n".to_string())
    );
}

#[test]
fn runelite_runs_managed_jar_through_java() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let jdk = fake_jdk(tmp.path());
    let mut ctx = LaunchContext::new(LauncherPaths::from_data_dir(data_dir(tmp.path())));
    ctx.java_home = Some(jdk.clone());
    let paths = ctx.paths.clone();
    let launcher = Launcher::new(ctx);

    let req = Request::new("https://bolt-internal/launch-runelite-jar-configure", "id=rl-9")
        .with_post_element(b"jar bytes".to_vec());
    let mut resp = launcher.handle(&req).expect("launch route");
    assert_eq!(drain(&mut resp), (200, "OK\n".to_string()));
    assert_eq!(std::fs::read_to_string(&paths.runelite_id_path).expect("id"), "rl-9");

    let out = wait_for_file(&paths.data_dir.join("java-argv.txt"));
    let lines: Vec<&str> = out.lines().collect();
    let home = paths.data_dir.display().to_string();
    assert_eq!(lines[0], jdk.join("bin/java").display().to_string());
    assert_eq!(lines[1], format!("-Duser.home={home}"));
    assert_eq!(lines[2], "-jar");
    assert_eq!(lines[3], paths.runelite_path.display().to_string());
    assert_eq!(lines[4], format!("-J-Duser.home={home}"));
    assert_eq!(lines[5], "--configure");
}

#[test]
fn hdos_points_java_home_at_sandbox() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let jdk = fake_jdk(tmp.path());
    let mut ctx = LaunchContext::new(LauncherPaths::from_data_dir(data_dir(tmp.path())));
    ctx.java_home = Some(jdk.clone());
    ctx.java_proxy_bin = tmp.path().join("bin/java-proxy");
    write_executable(&ctx.java_proxy_bin, "#!/bin/sh\nexit 0\n");
    let paths = ctx.paths.clone();
    let proxy = ctx.java_proxy_bin.clone();
    let launcher = Launcher::new(ctx);

    let req = Request::new("https://bolt-internal/launch-hdos-jar", "version=8")
        .with_post_element(b"hdos jar".to_vec());
    let mut resp = launcher.handle(&req).expect("launch route");
    assert_eq!(drain(&mut resp), (200, "OK\n".to_string()));
    assert_eq!(std::fs::read_to_string(&paths.hdos_version_path).expect("version"), "8");
    assert_eq!(
        std::fs::read_link(paths.java_proxy_dir.join("bin/java")).expect("link"),
        proxy
    );

    let out = wait_for_file(&paths.data_dir.join("java-argv.txt"));
    let lines: Vec<&str> = out.lines().collect();
    let home = paths.data_dir.display().to_string();
    let java = jdk.join("bin/java").display().to_string();
    assert_eq!(lines[1], format!("-Duser.home={home}"));
    assert_eq!(lines[2], format!("-Dapp.user.home={home}"));
    assert_eq!(
        lines[3],
        format!("-Djava.home={}", paths.java_proxy_dir.display())
    );
    assert_eq!(lines[4], "-jar");
    assert_eq!(lines[5], paths.hdos_path.display().to_string());
    assert!(lines.contains(&format!("BOLT_JAVA_PATH={java}").as_str()));
    assert!(lines.contains(&format!("BOLT_ARG_HOME={home}").as_str()));
}

#[test]
fn hdos_without_installed_proxy_is_symlink_failure() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let jdk = fake_jdk(tmp.path());
    let mut ctx = LaunchContext::new(LauncherPaths::from_data_dir(data_dir(tmp.path())));
    ctx.java_home = Some(jdk);
    let paths = ctx.paths.clone();
    let launcher = Launcher::new(ctx);

    let mut resp = launcher
        .handle(&Request::new("https://bolt-internal/launch-hdos-jar", ""))
        .expect("launch route");
    assert_eq!(
        drain(&mut resp),
        (500, "Unable to create symlinks\n".to_string())
    );
    assert!(std::fs::symlink_metadata(paths.java_proxy_dir.join("bin/java")).is_err());
}
