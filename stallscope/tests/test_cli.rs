use std::process::{Command, Output};

fn stallscope(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stallscope"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run stallscope")
}

const FAST: &[&str] =
    &["--tasks", "50", "--timeout", "5s", "--stall-threshold", "20ms", "--heartbeat-interval", "2ms"];

#[test]
fn test_list_shows_builtin_adapters() {
    let output = stallscope(&["list"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["tokio-fs", "std-fs", "csv-async", "bcrypt-inline", "sleep", "thread-sleep"] {
        assert!(stdout.contains(name), "{name} missing from:\n{stdout}");
    }
}

#[test]
fn test_passing_run_exits_zero() {
    let mut args = vec!["detect", "sleep"];
    args.extend_from_slice(FAST);
    let output = stallscope(&args);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("PASS"));
}

#[test]
fn test_failing_run_exits_one() {
    let mut args = vec!["detect", "thread-sleep"];
    args.extend_from_slice(FAST);
    let output = stallscope(&args);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL"));
    assert!(stdout.contains("stall"));
}

#[test]
fn test_unknown_adapter_exits_two() {
    let output = stallscope(&["detect", "no-such-adapter"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown adapter 'no-such-adapter'"));
}

#[test]
fn test_config_error_exits_two() {
    let output = stallscope(&["detect", "sleep", "--tasks", "1", "--blocking-tasks", "1"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_bad_duration_is_usage_error() {
    let output = stallscope(&["detect", "sleep", "--timeout", "soon"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_output_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict.json");
    let path_str = path.to_str().unwrap();

    let mut args = vec!["detect", "sleep", "--output", path_str];
    args.extend_from_slice(FAST);
    let output = stallscope(&args);
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).expect("Invalid JSON");
    assert_eq!(json["adapter"], "sleep");
    assert_eq!(json["passed"], true);
    assert_eq!(json["stall_count"], 0);
    assert_eq!(json["configuration"]["tasks"], 50);
    assert!(json["reasons"].as_array().unwrap().is_empty());
}

#[test]
fn test_unwritable_output_exits_74() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("verdict.json");
    let path_str = path.to_str().unwrap();

    let mut args = vec!["detect", "sleep", "--output", path_str];
    args.extend_from_slice(FAST);
    let output = stallscope(&args);

    assert_eq!(output.status.code(), Some(74));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to write report"));
}
