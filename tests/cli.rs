//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn bench() -> Command {
    Command::cargo_bin("llm-judge-bench").unwrap()
}

const MOCK_CONFIG: &str = r#"
[judges.panel_mock]
type = "mock"
model = "mock-model"
weight = 1.0
scale = { min = 1.0, max = 5.0 }
"#;

#[test]
fn test_rubrics_lists_builtin_categories() {
    bench()
        .arg("rubrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("qa_simple"))
        .stdout(predicate::str::contains("code_generation"))
        .stdout(predicate::str::contains("accuracy"));
}

#[test]
fn test_rubrics_merges_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rubrics.yaml");
    std::fs::write(
        &path,
        r#"
dialogue_repair:
  - name: recovery
    weight: 1.0
    description: "Recovers from misunderstanding"
"#,
    )
    .unwrap();

    bench()
        .arg("rubrics")
        .arg("--rubrics")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("dialogue_repair"))
        .stdout(predicate::str::contains("recovery"));
}

#[test]
fn test_judges_shows_panel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("judges.toml");
    std::fs::write(&path, MOCK_CONFIG).unwrap();

    bench()
        .arg("judges")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("panel_mock"))
        .stdout(predicate::str::contains("type=mock"));
}

#[test]
fn test_judges_missing_config_fails() {
    bench()
        .arg("judges")
        .arg("--config")
        .arg("/nonexistent/judges.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_evaluate_with_mock_judge_emits_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("judges.toml");
    std::fs::write(&path, MOCK_CONFIG).unwrap();

    // The mock judge replies with empty text, so every criterion lands
    // on the 1-5 midpoint and the composite is 5.0.
    bench()
        .arg("evaluate")
        .arg("--config")
        .arg(&path)
        .arg("--prompt")
        .arg("What is 2 + 2?")
        .arg("--output")
        .arg("4")
        .arg("--no-audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"composite_score\": 5.0"))
        .stdout(predicate::str::contains("\"grade\": \"deficient\""))
        .stdout(predicate::str::contains("\"test_name\": \"adhoc\""));
}

#[test]
fn test_evaluate_rejects_empty_panel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("judges.toml");
    std::fs::write(&path, "[judges]\n").unwrap();

    bench()
        .arg("evaluate")
        .arg("--config")
        .arg(&path)
        .arg("--prompt")
        .arg("p")
        .arg("--output")
        .arg("o")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no judges enabled"));
}
