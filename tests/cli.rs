use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn epinet() -> Command {
    Command::cargo_bin("epinet").unwrap()
}

fn stdout_lines(output: &std::process::Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn prints_daily_counts_and_summary() {
    let output = epinet()
        .args(["--random-seed", "42", "--max-days", "10"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[0], "0 190 0 10 0 0");
    assert!(lines[10].starts_with("10 "));
    assert!(lines[11].starts_with("days=10 "));
}

#[test]
fn output_is_reproducible() {
    let run = || {
        epinet()
            .args(["-r", "9", "-m", "40", "--quiet"])
            .output()
            .unwrap()
            .stdout
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(String::from_utf8_lossy(&first).lines().count(), 1);
}

#[test]
fn reads_scenario_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"population_size": 60, "initially_infected": 6,
            "parameters": {{"reproduction_number": 0.0, "infectious_duration": 3}}}}"#
    )
    .unwrap();

    let output = epinet()
        .args(["--config", file.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "0 54 0 6 0 0");
    // Burned out after the infectious period.
    assert!(lines[3].starts_with("3 54 0 0 "));
    assert!(lines[4].starts_with("days=3 "));
}

#[test]
fn invalid_scenario_fails_with_parameter_name() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"population_size": 10, "initially_infected": 11}}"#).unwrap();

    let output = epinet()
        .args(["--config", file.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("initially_infected"));
}

#[test]
fn unknown_log_level_is_rejected() {
    epinet()
        .args(["--log-level", "chatty", "--max-days", "1"])
        .assert()
        .failure();
}

#[test]
fn empty_module_in_log_level_is_an_error() {
    let output = epinet()
        .args(["--log-level", "=info", "--max-days", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("log_level"));
}

#[test]
fn logs_go_to_stderr() {
    let output = epinet()
        .args(["--log-level", "epinet::orchestrator=info", "-m", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output).len(), 4);
    assert!(String::from_utf8_lossy(&output.stderr).contains("started run 1"));
}

#[test]
fn custom_args_reach_the_scenario() {
    // Note this target is defined in the bin section of Cargo.toml
    // and the entry point is in tests/bin/runner_test_custom_args.rs
    let output = Command::cargo_bin("runner_test_custom_args")
        .unwrap()
        .args(["--contact-reduction", "1.0", "--max-days", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());
    for line in stdout_lines(&output).iter().take(6) {
        assert_eq!(line.split_whitespace().nth(1), Some("190"));
    }

    Command::cargo_bin("runner_test_custom_args")
        .unwrap()
        .args(["--contact-reduction", "2.0"])
        .assert()
        .failure();
}
