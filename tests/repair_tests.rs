//! Repair runs through the CLI with a shell-script proposer
#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

#[allow(deprecated)]
fn archfix_cmd(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("archfix").unwrap();
    cmd.env_remove("ARCHFIX_LOG")
        .env("ARCHFIX_PROJECT", &project.path);
    cmd
}

/// Reads the request, prints `body` with `NAME` replaced by the module name
fn install_proposer(project: &TestProject, body: &str) {
    let script = format!(
        "request=$(cat)\n\
         NAME=$(printf '%s' \"$request\" | sed -n 's/^{{\"module_name\":\"\\([^\"]*\\)\".*/\\1/p')\n\
         {body}\n"
    );
    project.write_file("fixer.sh", &script);

    let script_path = project.path.join("fixer.sh");
    let config = format!(
        "repair:\n  max_rounds: 3\n  retry:\n    max_attempts: 2\n    base_delay_ms: 1\n    max_delay_ms: 1\n    attempt_timeout_ms: 10000\nproposer:\n  command: [\"sh\", \"{}\"]\n",
        script_path.display()
    );
    project.write_file("archfix.yaml", &config);
}

const COMPLETE_RECORD: &str = r#"cat <<EOF
Here is the corrected module:
\`\`\`json
{"module_name": "$NAME", "responsibilities": ["Handle $NAME work"], "key_apis": ["api_$NAME"], "data_inputs": ["Request"], "data_outputs": ["Response"], "depends_on": [], "target_path": "src/$NAME.rs"}
\`\`\`
EOF"#;

#[test]
fn test_repair_converges() {
    let project = TestProject::initialized();
    project.add_module("A", &["Ghost"]).add_module("B", &[]);
    install_proposer(&project, COMPLETE_RECORD);

    archfix_cmd(&project)
        .arg("repair")
        .assert()
        .success()
        .stdout(predicate::str::contains("no issues left"));

    assert_eq!(project.read_record("A")["depends_on"], serde_json::json!([]));
    assert!(project.file_exists("validator_report.json"));
    assert!(!project.checkpoint_ids().is_empty());

    archfix_cmd(&project).arg("validate").assert().success();
}

#[test]
fn test_repair_failing_proposer_leaves_records() {
    let project = TestProject::initialized();
    project.add_module("A", &["Ghost"]).add_module("B", &[]);
    let before = project.read_file("modules/A/full_summary.json");
    install_proposer(&project, "echo 'model unavailable' >&2\nexit 3");

    archfix_cmd(&project)
        .arg("repair")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Unrepaired: A"));

    assert_eq!(project.read_file("modules/A/full_summary.json"), before);
}

#[test]
fn test_repair_regression_rolled_back() {
    let project = TestProject::initialized();
    project.add_module("A", &["Ghost"]).add_module("B", &[]);
    let before = project.read_file("modules/A/full_summary.json");
    install_proposer(
        &project,
        r#"printf '{"module_name": "%s", "responsibilities": ["Handle %s work"], "key_apis": ["x"], "data_inputs": ["Request"], "data_outputs": ["Response"], "depends_on": ["G1", "G2", "G3", "G4"], "target_path": "src/x.rs"}' "$NAME" "$NAME""#,
    );

    archfix_cmd(&project)
        .args(["repair", "--tolerance", "0"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("1 rolled back"));

    assert_eq!(project.read_file("modules/A/full_summary.json"), before);
}

#[test]
fn test_repair_clean_project() {
    let project = TestProject::initialized();
    project.add_module("A", &[]).add_module("B", &["A"]);
    install_proposer(&project, "exit 1");

    archfix_cmd(&project)
        .arg("repair")
        .assert()
        .success()
        .stdout(predicate::str::contains("none"));
}
