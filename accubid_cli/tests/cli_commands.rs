use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

/// Runs the binary with a clean `ACCUBID_*` environment.
fn run_cli(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_accubid"));
    cmd.args(args).current_dir(std::env::temp_dir());
    for (key, _) in std::env::vars() {
        if key.starts_with("ACCUBID_") {
            cmd.env_remove(key);
        }
    }
    cmd.output().expect("failed to run accubid binary")
}

#[test]
fn objects_json_lists_every_reader() {
    let output = run_cli(&["objects", "--output", "json"]);
    assert!(output.status.success());

    let objects: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let objects = objects.as_array().expect("array of objects");
    assert_eq!(objects.len(), 17);

    let due = objects
        .iter()
        .find(|o| o["name"] == "estimates-by-due-date")
        .expect("estimates-by-due-date listed");
    assert_eq!(due["module"], "Estimate");
    assert_eq!(
        due["requiredParams"],
        serde_json::json!(["databaseToken", "startDate", "endDate"])
    );
}

#[test]
fn objects_table_has_headers() {
    let output = run_cli(&["objects"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Object"));
    assert!(stdout.contains("Required"));
    assert!(stdout.contains("contract-quote-labels"));
}

#[test]
fn missing_environment_fails_before_any_request() {
    let dir = scratch_dir();
    let config = dir.join("no_env.toml");
    std::fs::write(&config, "[auth]\naccess_token = \"abc\"\n").unwrap();

    let output = run_cli(&["databases", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No connection environment selected"));
}

#[test]
fn example_config_is_accepted() {
    let config = workspace_root().join("accubid.example.toml");
    // unknown data object is rejected after the config has loaded
    let output = run_cli(&[
        "read",
        "widgets",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown data object: widgets"));
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("accubid-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
