use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "nordic-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_run_saves_log_and_replays_it() {
    let exe = env!("CARGO_BIN_EXE_nordic-tester");
    let log_path = temp_path("run.log");
    let report_path = temp_path("run.json");
    let status = Command::new(exe)
        .args([
            "--mode",
            "run",
            "--seed",
            "99",
            "--steps",
            "20",
            "--clicks",
            "1:Oslo,3:Bergen",
            "--report",
            "json",
            "--save-log",
        ])
        .arg(&log_path)
        .arg("--output")
        .arg(&report_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("json report");
    assert_eq!(report["passed"], true);
    assert_eq!(report["replay_matches"], true);
    assert_eq!(report["game"]["ticks_played"], 20);

    let log = std::fs::read_to_string(&log_path).expect("read log");
    assert!(log.starts_with("99\r\n"));

    let status = Command::new(exe)
        .args(["--mode", "verify-log", "--log"])
        .arg(&log_path)
        .status()
        .expect("verify cli");
    assert!(status.success());
}

#[test]
fn cli_replay_reports_console_summary() {
    let exe = env!("CARGO_BIN_EXE_nordic-tester");
    let log_path = temp_path("replay.log");
    std::fs::write(
        &log_path,
        "5\r\ntoll 20\r\nrisk 20\r\nmin_robbery 10\r\nmax_robbery 50\r\nactive 1 1 1\r\n",
    )
    .expect("write log");
    let output = Command::new(exe)
        .args(["--mode", "replay", "--log"])
        .arg(&log_path)
        .env("NO_COLOR", "1")
        .output()
        .expect("replay cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nordic Traveller Tester"));
    assert!(stdout.contains("Seed: 5"));
}

#[test]
fn cli_rejects_malformed_log() {
    let exe = env!("CARGO_BIN_EXE_nordic-tester");
    let log_path = temp_path("bad.log");
    std::fs::write(&log_path, "not a seed\r\n").expect("write log");
    let output = Command::new(exe)
        .args(["--mode", "verify-log", "--log"])
        .arg(&log_path)
        .output()
        .expect("verify cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed"));
}
