//! CLI smoke tests against the built `pysweep` binary.

mod common;

use std::fs;

use serde_json::Value;

use common::{run_cli_case, touch, usable_tempdir};

const HUMAN: &[(&str, &str)] = &[("PYSWEEP_OUTPUT_FORMAT", "human")];

fn parse_json(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim()).expect("stdout should be one JSON document")
}

#[test]
fn help_command_prints_usage() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case("help_command_prints_usage", home.path(), &["--help"], &[]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: pysweep [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case("version_command_prints_version", home.path(), &["--version"], &[]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains(env!("CARGO_PKG_VERSION")),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn human_sweep_prints_final_summary_and_writes_log() {
    let Some(tree) = usable_tempdir() else { return };
    let home = tempfile::tempdir().unwrap();
    touch(&tree.path().join("a/__pycache__/x.pyc"));
    touch(&tree.path().join("b.pyc"));
    touch(&tree.path().join("b.pyo"));
    let root = tree.path().to_string_lossy().into_owned();

    let result = run_cli_case(
        "human_sweep_prints_final_summary_and_writes_log",
        home.path(),
        &["--no-color", "sweep", &root],
        HUMAN,
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result
            .stdout
            .contains("Cleanup completed. Removed 3 items. Errors: 0. Check "),
        "log: {}",
        result.log_path.display()
    );
    assert!(result.stdout.contains("pycache_cleanup.log for details."));

    let log = fs::read_to_string(home.path().join("pycache_cleanup.log"))
        .expect("default log file should be written in the working directory");
    assert!(log.contains(" - INFO - Starting cleanup in "));
    assert!(log.contains(" - INFO - Removed directory: "));
    assert!(log.contains(" - INFO - Removed file: "));
    assert!(log.contains("Total items removed: 3. Total errors: 0"));
}

#[test]
fn json_sweep_reports_totals_and_skipped_roots() {
    let Some(tree) = usable_tempdir() else { return };
    let home = tempfile::tempdir().unwrap();
    touch(&tree.path().join("pkg/__pycache__/m.pyc"));
    let root = tree.path().to_string_lossy().into_owned();
    let missing = tree.path().join("gone").to_string_lossy().into_owned();

    let result = run_cli_case(
        "json_sweep_reports_totals_and_skipped_roots",
        home.path(),
        &["sweep", "--json", "--no-log-file", &missing, &root],
        &[],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json(&result.stdout);
    assert_eq!(payload["command"], "sweep");
    assert_eq!(payload["summary"]["total_removed"], 1);
    assert_eq!(payload["summary"]["total_errors"], 0);
    assert_eq!(payload["summary"]["interrupted"], false);
    assert_eq!(payload["summary"]["skipped_roots"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["summary"]["reports"].as_array().map(Vec::len), Some(1));
    assert!(!home.path().join("pycache_cleanup.log").exists());
}

#[test]
fn jsonl_log_format_from_env() {
    let Some(tree) = usable_tempdir() else { return };
    let home = tempfile::tempdir().unwrap();
    touch(&tree.path().join("z.pyc"));
    let root = tree.path().to_string_lossy().into_owned();
    let log_path = home.path().join("run.jsonl");
    let log_arg = log_path.to_string_lossy().into_owned();

    let result = run_cli_case(
        "jsonl_log_format_from_env",
        home.path(),
        &["sweep", "--json", "--log-file", &log_arg, &root],
        &[("PYSWEEP_LOG_FORMAT", "jsonl")],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let log = fs::read_to_string(&log_path).expect("jsonl log written");
    let events: Vec<Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();
    assert!(events.iter().any(|e| e["event"] == "removed"));
    assert!(events.iter().any(|e| e["event"] == "run_completed"));
}

#[cfg(unix)]
#[test]
fn failed_removal_exits_with_partial_code() {
    use std::os::unix::fs::PermissionsExt;

    if nix::unistd::geteuid().is_root() {
        eprintln!("skipping: permission bits are not enforced for root");
        return;
    }
    let Some(tree) = usable_tempdir() else { return };
    let home = tempfile::tempdir().unwrap();
    let cache = tree.path().join("app/__pycache__");
    touch(&cache.join("m.pyc"));
    fs::set_permissions(&cache, fs::Permissions::from_mode(0o555)).unwrap();
    let root = tree.path().to_string_lossy().into_owned();

    let result = run_cli_case(
        "failed_removal_exits_with_partial_code",
        home.path(),
        &["--no-color", "sweep", &root],
        HUMAN,
    );
    fs::set_permissions(&cache, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Removed 0 items. Errors: 1."));
    let log = fs::read_to_string(home.path().join("pycache_cleanup.log")).unwrap();
    assert!(log.contains(" - ERROR - Failed to remove "));
}

#[test]
fn check_path_reports_matching_term() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "check_path_reports_matching_term",
        home.path(),
        &["check-path", "--json", "/srv/Users/app", "/srv/projects/app"],
        &[],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json(&result.stdout);
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["safe"], false);
    assert_eq!(results[0]["matched_term"], "Users");
    assert_eq!(results[1]["safe"], true);
    assert!(results[1]["matched_term"].is_null());
}

#[test]
fn config_path_points_into_home() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "config_path_points_into_home",
        home.path(),
        &["config", "path", "--json"],
        &[],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json(&result.stdout);
    let path = payload["path"].as_str().expect("path string");
    assert!(path.ends_with("config.toml"), "{path}");
    assert!(path.contains("pysweep"), "{path}");
    assert_eq!(payload["exists"], false);
}

#[test]
fn config_show_reflects_file_and_env() {
    let home = tempfile::tempdir().unwrap();
    let config_path = home.path().join("custom.toml");
    fs::write(&config_path, "[logging]\nmax_rotated_files = 9\n").unwrap();
    let config_arg = config_path.to_string_lossy().into_owned();

    let result = run_cli_case(
        "config_show_reflects_file_and_env",
        home.path(),
        &["--config", &config_arg, "config", "show", "--json"],
        &[("PYSWEEP_CONSOLE_LOG", "false")],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json(&result.stdout);
    assert_eq!(payload["config"]["logging"]["max_rotated_files"], 9);
    assert_eq!(payload["config"]["logging"]["console"], false);
    assert!(payload["hash"].as_str().is_some_and(|h| h.len() == 16));
}

#[test]
fn missing_explicit_config_is_a_user_error() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("absent.toml").to_string_lossy().into_owned();
    let result = run_cli_case(
        "missing_explicit_config_is_a_user_error",
        home.path(),
        &["--config", &missing, "sweep"],
        &[],
    );

    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PYS-1002"));
}

#[test]
fn invalid_env_override_is_a_user_error() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "invalid_env_override_is_a_user_error",
        home.path(),
        &["config", "show"],
        &[("PYSWEEP_LOG_MAX_SIZE_BYTES", "lots")],
    );

    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PYSWEEP_LOG_MAX_SIZE_BYTES"));
}

#[test]
fn completions_generate_for_bash() {
    let home = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "completions_generate_for_bash",
        home.path(),
        &["completions", "bash"],
        &[],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("pysweep"));
}
