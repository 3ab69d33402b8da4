use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn patchwork(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("patchwork"));
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args([
            "-c",
            "user.name=patchwork",
            "-c",
            "user.email=patchwork@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git ran");
    assert!(out.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// An upstream checkout with `chrome/` and `base/`, plus a patches repo
/// pointing at its only commit.
fn workspace() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let root = TempDir::new().expect("tempdir");
    let tree = root.path().join("src");
    let patches = root.path().join("patches");
    fs::create_dir_all(tree.join("chrome")).unwrap();
    fs::create_dir_all(tree.join("base")).unwrap();
    fs::write(tree.join("chrome/app.cc"), "one\ntwo\nthree\n").unwrap();
    fs::write(tree.join("base/util.h"), "// util\n").unwrap();
    git(&tree, &["init", "-q"]);
    git(&tree, &["add", "."]);
    git(&tree, &["commit", "-qm", "base"]);
    let head = git(&tree, &["rev-parse", "HEAD"]);

    fs::create_dir_all(patches.join("chromium_patches")).unwrap();
    fs::write(patches.join("BASE_COMMIT"), format!("{head}\n")).unwrap();
    (root, tree, patches)
}

#[test]
fn help_lists_every_command() {
    let dir = TempDir::new().unwrap();
    let mut assert = patchwork(dir.path()).arg("--help").assert().success();
    for cmd in ["init", "clone", "pull", "push", "status", "diff"] {
        assert = assert.stdout(contains(cmd));
    }
}

#[test]
fn commands_outside_a_checkout_fail_with_hint() {
    let dir = TempDir::new().unwrap();
    patchwork(dir.path())
        .arg("status")
        .assert()
        .code(1)
        .stderr(contains("patchwork init"));
}

#[test]
fn init_rejects_a_directory_without_markers() {
    let dir = TempDir::new().unwrap();
    patchwork(dir.path())
        .args(["init", "--patches-repo", "."])
        .assert()
        .code(1)
        .stderr(contains("does not look like an upstream checkout"));
}

#[test]
fn push_then_pull_round_trip() {
    if !git_available() {
        return;
    }
    let (_root, tree, patches) = workspace();

    patchwork(&tree)
        .args(["init", "--patches-repo"])
        .arg(&patches)
        .assert()
        .success()
        .stdout(contains("Initialized .patchwork/config.yaml"));
    patchwork(&tree)
        .args(["init", "--patches-repo"])
        .arg(&patches)
        .assert()
        .code(1)
        .stderr(contains("already initialized"));

    fs::write(tree.join("chrome/app.cc"), "one\nTWO\nthree\n").unwrap();
    fs::write(tree.join("base/util.h"), "// util\nint f();\n").unwrap();

    patchwork(&tree)
        .args(["diff", "--direction", "push"])
        .assert()
        .success()
        .stdout(contains("2 files would be pushed"));
    patchwork(&tree)
        .arg("push")
        .assert()
        .success()
        .stdout(contains("Pushed 2 patches"));
    assert!(patches.join("chromium_patches/chrome/app.cc").exists());
    assert!(patches.join("chromium_patches/base/util.h").exists());

    // Throw the local work away and get it back from the store.
    git(&tree, &["checkout", "--", "chrome/app.cc", "base/util.h"]);

    patchwork(&tree)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(contains("\"behind\": 2"));
    patchwork(&tree)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("Applied 2 patches"));
    assert_eq!(
        fs::read_to_string(tree.join("chrome/app.cc")).unwrap(),
        "one\nTWO\nthree\n"
    );
    assert_eq!(
        fs::read_to_string(tree.join("base/util.h")).unwrap(),
        "// util\nint f();\n"
    );

    patchwork(&tree)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("Already up to date."));

    let log = fs::read_to_string(tree.join(".patchwork/logs/activity.log")).unwrap();
    assert!(log.contains("PUSH  "));
    assert!(log.contains("PULL  "));
    let state = fs::read_to_string(tree.join(".patchwork/state.yaml")).unwrap();
    assert!(state.contains("last_push"));
    assert!(state.contains("last_pull"));
}

#[test]
fn conflicting_pull_exits_with_two() {
    if !git_available() {
        return;
    }
    let (_root, tree, patches) = workspace();
    patchwork(&tree)
        .args(["init", "--patches-repo"])
        .arg(&patches)
        .assert()
        .success();

    fs::write(tree.join("chrome/app.cc"), "one\nTWO\nthree\n").unwrap();
    patchwork(&tree).arg("push").assert().success();

    // Commit a divergent base line so the stored hunk no longer fits.
    git(&tree, &["checkout", "--", "chrome/app.cc"]);
    fs::write(tree.join("chrome/app.cc"), "uno\ndos\ntres\n").unwrap();
    git(&tree, &["commit", "-qam", "diverge"]);

    patchwork(&tree)
        .arg("clone")
        .assert()
        .code(1)
        .stderr(contains("does not match BASE_COMMIT"));
    patchwork(&tree)
        .args(["clone", "--no-verify-base"])
        .assert()
        .code(2)
        .stdout(contains("CONFLICT REPORT"));
    assert!(tree.join("chrome/app.cc.rej").exists());
}

#[test]
fn pulled_new_file_stays_in_sync() {
    if !git_available() {
        return;
    }
    let (_root, tree, patches) = workspace();
    patchwork(&tree)
        .args(["init", "--patches-repo"])
        .arg(&patches)
        .assert()
        .success();

    fs::write(tree.join("chrome/new.h"), "int g();\n").unwrap();
    git(&tree, &["add", "chrome/new.h"]);
    patchwork(&tree).arg("push").assert().success();
    assert!(patches.join("chromium_patches/chrome/new.h").exists());

    git(&tree, &["rm", "-q", "--cached", "chrome/new.h"]);
    fs::remove_file(tree.join("chrome/new.h")).unwrap();

    patchwork(&tree)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("Applied"));
    assert_eq!(fs::read_to_string(tree.join("chrome/new.h")).unwrap(), "int g();\n");

    patchwork(&tree)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("Already up to date."));
    patchwork(&tree)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(contains("\"behind\": 0"));
}

#[test]
fn renamed_file_round_trip() {
    if !git_available() {
        return;
    }
    let (_root, tree, patches) = workspace();
    patchwork(&tree)
        .args(["init", "--patches-repo"])
        .arg(&patches)
        .assert()
        .success();

    git(&tree, &["mv", "chrome/app.cc", "chrome/moved.cc"]);
    fs::write(tree.join("chrome/moved.cc"), "one\ntwo\nthree\nfour\n").unwrap();
    patchwork(&tree).arg("push").assert().success();

    let marker = fs::read_to_string(patches.join("chromium_patches/chrome/moved.cc.rename")).unwrap();
    assert!(marker.contains("rename_from: chrome/app.cc"));
    assert!(!patches.join("chromium_patches/chrome/app.cc.deleted").exists());

    git(&tree, &["reset", "-q", "--hard"]);
    assert!(!tree.join("chrome/moved.cc").exists());

    patchwork(&tree).arg("pull").assert().success();
    assert_eq!(
        fs::read_to_string(tree.join("chrome/moved.cc")).unwrap(),
        "one\ntwo\nthree\nfour\n"
    );
    assert!(!tree.join("chrome/app.cc").exists());

    patchwork(&tree)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("Already up to date."));
}
