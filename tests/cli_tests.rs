// CLI integration tests: simulate -> analyze -> anonymize through the binary

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn simulate_into(dir: &Path) {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("convergent");
    cmd.arg("simulate")
        .arg("--out-dir")
        .arg(dir)
        .arg("--per-condition")
        .arg("12")
        .arg("--seed")
        .arg("5");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("participants.csv"))
        .stdout(predicate::str::contains("responses.csv"))
        .stdout(predicate::str::contains("fluency.csv"));
}

fn analyze_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("convergent");
    cmd.arg("analyze")
        .arg("--participants")
        .arg(dir.join("participants.csv"))
        .arg("--responses")
        .arg(dir.join("responses.csv"))
        .arg("--fluency")
        .arg(dir.join("fluency.csv"));
    cmd
}

#[test]
fn test_simulate_writes_three_tables() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());
    let participants = fs::read_to_string(dir.path().join("participants.csv")).unwrap();
    // header + 36 participants
    assert_eq!(participants.lines().count(), 37);
    assert!(participants.starts_with("workerid,condition,attention_check"));
}

#[test]
fn test_analyze_text_output() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());

    analyze_cmd(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Screening ==="))
        .stdout(predicate::str::contains("participants: 36 retained of 36"))
        .stdout(predicate::str::contains("=== ANCOVA (sequential SS) ==="))
        .stdout(predicate::str::contains("LLM Guidance - None"));
}

#[test]
fn test_analyze_json_output() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());

    let output = analyze_cmd(dir.path())
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["screening"]["participants_retained"], 36);
    assert_eq!(value["anova"]["rows"].as_array().unwrap().len(), 3);
    assert_eq!(value["posthoc"]["results"].as_array().unwrap().len(), 3);
    assert!(value["stage_failures"].as_array().unwrap().is_empty());
}

#[test]
fn test_analyze_csv_to_file() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());
    let out = dir.path().join("summary.csv");

    analyze_cmd(dir.path())
        .arg("--format")
        .arg("csv")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("table,phase,condition,mean,sem,n"));
    assert!(text.contains("accuracy_by_phase,Test,LLM Guidance,"));
}

#[test]
fn test_analyze_with_config_file() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());
    let config = dir.path().join("analysis.toml");
    fs::write(&config, "significance_level = 0.01\n").unwrap();

    analyze_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("99% family-wise"));
}

#[test]
fn test_analyze_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());
    let config = dir.path().join("analysis.toml");
    fs::write(&config, "significance_level = 2.0\n").unwrap();

    analyze_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("significance_level"));
}

#[test]
fn test_analyze_missing_column_names_it() {
    let dir = TempDir::new().unwrap();
    simulate_into(dir.path());
    fs::write(
        dir.path().join("responses.csv"),
        "workerid,phase,condition\nsim-0-000,test,absent\n",
    )
    .unwrap();

    analyze_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is_correct"));
}

#[test]
fn test_analyze_missing_file() {
    let dir = TempDir::new().unwrap();
    analyze_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input tables"));
}

#[test]
fn test_anonymize_hashes_default_columns() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("participants.csv");
    let output = dir.path().join("anonymized_participants.csv");
    fs::write(&input, "workerid,hitId,condition\nA1,H1,absent\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("convergent");
    cmd.arg("anonymize")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("workerid,hitId,condition"));
    assert!(!text.contains("A1"));
    assert!(!text.contains("H1"));
    assert!(text.contains(",absent"));
    assert!(text.contains(&convergent::anonymize::pseudonym("A1")));
}

#[test]
fn test_anonymize_unknown_column_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("participants.csv");
    fs::write(&input, "workerid,condition\nA1,absent\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("convergent");
    cmd.arg("anonymize")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .arg("--column")
        .arg("hitId")
        .assert()
        .failure()
        .stderr(predicate::str::contains("hitId"));
}

#[test]
fn test_version_flag() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("convergent");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("convergent"));
}
