#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_pysweep") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "pysweep.exe" } else { "pysweep" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve pysweep binary path for integration test"),
    }
}

/// Run the binary with `home` as HOME and working directory so no user config
/// leaks in. Every inherited `PYSWEEP_*` variable is cleared before `envs` apply.
pub fn run_cli_case(
    case_name: &str,
    home: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
) -> CmdResult {
    let root = std::env::temp_dir().join("pysweep-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_BACKTRACE", "1");
    for (name, _) in std::env::vars_os() {
        if name.to_string_lossy().starts_with("PYSWEEP_") {
            command.env_remove(name);
        }
    }
    command.envs(envs.iter().copied());
    let output = command.output().expect("execute pysweep command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("envs={envs:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Create `path` (and its parents) holding one byte.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, b"\x00").expect("write fixture file");
}

/// The safety filter matches on the whole path, so a temp dir that already
/// contains a denylisted term (e.g. under `C:\Users`) cannot host these tests.
pub fn usable_tempdir() -> Option<tempfile::TempDir> {
    let dir = tempfile::tempdir().expect("create tempdir");
    if pycache_sweeper::scanner::protection::is_safe(dir.path()) {
        Some(dir)
    } else {
        eprintln!(
            "skipping: temp dir {} matches the system-path denylist",
            dir.path().display()
        );
        None
    }
}
