use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_battlecast")
}

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/scenarios/sample.yaml")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("battlecast-{name}-{stamp}.{extension}"))
}

#[test]
fn simulate_command_emits_json_report() {
    let output = Command::new(bin())
        .args(["simulate", "--seed", "7", "--format", "json"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    assert_eq!(payload["seed"], 7);
    assert!(payload["outcome"]["result"].is_string());
    assert!(payload["turns"].as_u64().is_some_and(|t| (1..=100).contains(&t)));
    assert_eq!(payload["report"]["armies"].as_array().map(Vec::len), Some(2));
    assert!(payload["events"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test]
fn simulate_is_reproducible_for_a_seed() {
    let run = || {
        Command::new(bin())
            .args(["simulate", "--seed", "123", "--format", "json"])
            .output()
            .expect("simulate should run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn simulate_text_report_uses_battle_report_layout() {
    let output = Command::new(bin())
        .arg("simulate")
        .arg("--scenario")
        .arg(sample_path())
        .args(["--seed", "3", "--log"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Seed: 3\n"), "{stdout}");
    assert!(stdout.contains("--- Battle Report ---"));
    assert!(stdout.contains("Army: Dave"));
    assert!(stdout.contains("Army: Brabo"));
    assert!(stdout.contains("  Skills Activated:"));
}

#[test]
fn simulate_writes_event_csv() {
    let path = unique_temp_path("events", "csv");
    let output = Command::new(bin())
        .args(["simulate", "--seed", "5", "--max-turns", "3", "--events-csv"])
        .arg(&path)
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let csv = fs::read_to_string(&path).expect("csv should be written");
    let _ = fs::remove_file(&path);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("turn,event_type,army,troop,target_army,target,skill,damage,troops_lost,message")
    );
    assert!(lines.next().is_some());
}

#[test]
fn forecast_command_emits_json_summary() {
    let output = Command::new(bin())
        .args([
            "forecast",
            "--iterations",
            "12",
            "--seed",
            "1",
            "--max-turns",
            "20",
            "--workers",
            "2",
            "--format",
            "json",
        ])
        .output()
        .expect("forecast should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("forecast should emit json");
    assert_eq!(payload["iterations"], 12);
    assert_eq!(payload["base_seed"], 1);
    assert_eq!(payload["attacker_name"], "Dave");
    let wins = payload["attacker"]["wins"].as_u64().unwrap_or_default()
        + payload["defender"]["wins"].as_u64().unwrap_or_default()
        + payload["draws"].as_u64().unwrap_or_default();
    assert_eq!(wins, 12);
}

#[test]
fn forecast_sequential_matches_parallel() {
    let run = |extra: &[&str]| {
        Command::new(bin())
            .args(["forecast", "--iterations", "8", "--seed", "9", "--max-turns", "10"])
            .args(["--format", "json"])
            .args(extra)
            .output()
            .expect("forecast should run")
            .stdout
    };
    assert_eq!(run(&["--sequential"]), run(&[]));
}

#[test]
fn validate_command_accepts_sample() {
    let output = Command::new(bin())
        .arg("validate")
        .arg(sample_path())
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
}

#[test]
fn validate_command_rejects_bad_probability() {
    let path = unique_temp_path("bad-chance", "yaml");
    let yaml = fs::read_to_string(sample_path())
        .expect("sample should be readable")
        .replacen("chance: 0.24", "chance: 2.4", 1);
    fs::write(&path, yaml).expect("temp file should be writable");

    let output = Command::new(bin())
        .arg("validate")
        .arg(&path)
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[error]"), "{stderr}");
    assert!(stderr.contains("validation failed"));
}

#[test]
fn missing_scenario_file_fails() {
    let output = Command::new(bin())
        .args(["simulate", "--scenario", "/nonexistent/battlecast.yaml"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load scenario"));
}

#[test]
fn sample_command_prints_loadable_yaml() {
    let output = Command::new(bin())
        .arg("sample")
        .output()
        .expect("sample should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = unique_temp_path("sample", "yaml");
    fs::write(&path, stdout.as_bytes()).expect("temp file should be writable");
    let check = Command::new(bin())
        .arg("validate")
        .arg(&path)
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&path);
    assert_eq!(check.status.code(), Some(0));
}

#[test]
fn unknown_command_returns_usage_error() {
    let output = Command::new(bin())
        .arg("serve")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
}
