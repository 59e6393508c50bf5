use assert_cmd::Command;
use std::path::Path;

// Build a consolectl command whose configuration lives under `home`.
fn consolectl(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("consolectl").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CONSOLECTL_PROFILE")
        .env_remove("CONSOLECTL_ENDPOINT")
        .env_remove("CONSOLECTL_KAFKA")
        .env_remove("CONSOLECTL_ACCESS_TOKEN");
    cmd
}

fn preferences_file(home: &Path) -> std::path::PathBuf {
    home.join(".config/consolectl/preferences/message-browser-columns.json")
}

#[test]
fn help_succeeds() {
    let home = tempfile::tempdir().unwrap();
    consolectl(home.path()).arg("--help").assert().success();
    consolectl(home.path())
        .args(["messages", "browse", "--help"])
        .assert()
        .success();
}

#[test]
fn columns_round_trip() {
    let home = tempfile::tempdir().unwrap();

    consolectl(home.path())
        .args(["messages", "columns", "set", "offset", "value"])
        .assert()
        .success();

    let output = consolectl(home.path())
        .args(["messages", "columns", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "\"offset-partition\"\n\"value\"\n"
    );

    consolectl(home.path())
        .args(["messages", "columns", "reset"])
        .assert()
        .success();
    assert!(!preferences_file(home.path()).exists());

    let output = consolectl(home.path())
        .args(["messages", "columns", "show", "-o", "json"])
        .output()
        .unwrap();
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "\"offset-partition\"\n\"timestampUTC\"\n\"key\"\n\"value\"\n"
    );
}

#[test]
fn corrupt_column_preferences_show_defaults() {
    let home = tempfile::tempdir().unwrap();
    let path = preferences_file(home.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{definitely not an array").unwrap();

    let output = consolectl(home.path())
        .args(["messages", "columns", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "\"offset-partition\"\n\"timestampUTC\"\n\"key\"\n\"value\"\n"
    );
}

#[test]
fn unknown_columns_are_rejected() {
    let home = tempfile::tempdir().unwrap();

    consolectl(home.path())
        .args(["messages", "columns", "set", "offset", "sparkles"])
        .assert()
        .failure();
    assert!(!preferences_file(home.path()).exists());
}

#[test]
fn conflicting_filters_are_rejected() {
    let home = tempfile::tempdir().unwrap();

    consolectl(home.path())
        .args(["messages", "list", "orders", "--offset", "1", "--epoch", "0"])
        .assert()
        .failure();
}

#[test]
fn zero_intervals_are_rejected() {
    let home = tempfile::tempdir().unwrap();

    let commands: [&[&str]; 3] = [
        &["messages", "browse", "orders", "--interval", "0s"],
        &["topics", "watch", "orders", "--interval", "0s"],
        &["config", "set-poll-interval", "0s"],
    ];
    for args in commands {
        let output = consolectl(home.path()).args(args).output().unwrap();

        assert!(!output.status.success(), "{args:?}");
        assert!(
            String::from_utf8_lossy(&output.stderr).contains("poll interval must be greater than zero"),
            "{args:?}"
        );
    }
}

#[test]
fn topics_require_an_endpoint() {
    let home = tempfile::tempdir().unwrap();

    let output = consolectl(home.path())
        .args(["--kafka", "k1", "topics", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no console API endpoint is configured"));
}

#[test]
fn config_is_written_per_profile() {
    let home = tempfile::tempdir().unwrap();

    consolectl(home.path())
        .args(["--profile", "staging", "config", "set-endpoint", "https://console.example/"])
        .assert()
        .success();
    consolectl(home.path())
        .args(["--profile", "staging", "config", "set-poll-interval", "10s"])
        .assert()
        .success();

    let output = consolectl(home.path())
        .args(["--profile", "staging", "config", "show", "-o", "json"])
        .output()
        .unwrap();
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(shown["endpoint"], "https://console.example/");
    assert_eq!(shown["pollInterval"], "10s");
    assert_eq!(shown["authenticated"], false);
    assert!(home.path().join(".config/consolectl/staging.json").exists());
    assert!(!home.path().join(".config/consolectl/default.json").exists());
}
