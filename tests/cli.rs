use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn darkroom() -> Command {
    Command::new(env!("CARGO_BIN_EXE_darkroom"))
}

#[test]
fn no_folders_prints_usage_even_with_broken_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("darkroom.toml"), "[export").unwrap();

    let out = darkroom().current_dir(tmp.path()).output().unwrap();

    assert!(out.status.success(), "exit: {:?}", out.status);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage: darkroom <catalogue folders...>"));
}

#[test]
fn gen_config_ignores_broken_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("darkroom.toml"), "[export").unwrap();

    let out = darkroom()
        .arg("gen-config")
        .current_dir(tmp.path())
        .output()
        .unwrap();

    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("[export]"));
}

#[test]
fn broken_config_fails_once_there_is_work_to_do() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("darkroom.toml"), "[export").unwrap();

    let out = darkroom()
        .arg(".")
        .current_dir(tmp.path())
        .output()
        .unwrap();

    assert!(!out.status.success());
}
