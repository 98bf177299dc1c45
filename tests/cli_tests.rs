// Integration tests for the loggraph binary
//
// The JVM analyzer is replaced by a shell script that prints fixed analyzer
// rows, configured through a TOML file passed with --config.

#![cfg(unix)]

use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_ANALYZER: &str = r#"#!/bin/sh
case "$5" in
  *broken*) echo "boom: cannot parse Server.java" >&2; exit 3 ;;
esac
cat <<'ROWS'
"","0","src/Server.java","org.demo","Server","handle","10","info","accepted {requestId}"
"0","1","src/Server.java","org.demo","Server","handle","20","info","validated"
"1","2","src/Server.java","org.demo","Server","handle","30","debug","stored in {path}"
ROWS
"#;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();

        let analyzer = dir.path().join("fake-analyzer.sh");
        fs::write(&analyzer, FAKE_ANALYZER).unwrap();
        fs::set_permissions(&analyzer, fs::Permissions::from_mode(0o755)).unwrap();

        let config = dir.path().join("loggraph.toml");
        fs::write(
            &config,
            format!("[analyzer]\nprogram = {:?}\n", analyzer.display().to_string()),
        )
        .unwrap();

        fs::create_dir(dir.path().join("repo")).unwrap();
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn repo(&self) -> PathBuf {
        self.path("repo")
    }

    fn write_log(&self, name: &str, events: &[(u32, u32)]) -> PathBuf {
        let lines: Vec<String> = events
            .iter()
            .map(|(ms, line)| {
                format!(
                    "2023-01-01 00:00:00,{:03} INFO [main] org.demo.Server: x (Server.java:handle({}))",
                    ms, line
                )
            })
            .collect();
        let path = self.path(name);
        fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("loggraph");
        cmd.env_remove("LOGGRAPH_CLASSPATH")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

fn request_log(fixture: &Fixture) -> PathBuf {
    fixture.write_log(
        "app.log",
        &[(0, 10), (1, 20), (2, 30), (100, 10), (101, 20), (102, 30)],
    )
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_graph_text_output() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("graph")
        .arg(fixture.repo())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 statements, 2 edges"))
        .stdout(predicate::str::contains("roots: 0"))
        .stdout(predicate::str::contains("0 -> 1 -> 2"));
}

#[test]
fn test_graph_csv_output() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["graph", "--format", "csv"])
        .arg(fixture.repo())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""1","2","Server.java","org.demo","Server","handle","30","DEBUG","stored in {path}""#,
        ));
}

#[test]
fn test_compare_json_output() {
    let fixture = Fixture::new();
    let log = request_log(&fixture);

    let output = fixture
        .cmd()
        .args(["compare", "--format", "json", "--min-support", "2"])
        .arg(fixture.repo())
        .arg(arg(&log))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["source_paths"], 1);
    assert_eq!(report["sequences"], 4);
    assert_eq!(report["matching_paths"], 1);
    assert_eq!(report["beam_matched_paths"], 1);
}

#[test]
fn test_compare_skips_missing_log_file() {
    let fixture = Fixture::new();
    let log = request_log(&fixture);
    let missing = fixture.path("rotated.log");

    let output = fixture
        .cmd()
        .args(["compare", "--format", "json", "--min-support", "2"])
        .arg(fixture.repo())
        .arg(arg(&missing))
        .arg(arg(&log))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sequences"], 4);
    assert_eq!(report["matching_paths"], 1);
}

#[test]
fn test_compare_rejects_invalid_overrides() {
    let fixture = Fixture::new();
    let log = request_log(&fixture);
    fixture
        .cmd()
        .args(["compare", "--similarity-threshold", "1.5"])
        .arg(fixture.repo())
        .arg(arg(&log))
        .assert()
        .failure()
        .stderr(predicate::str::contains("similarity_threshold"));
}

#[test]
fn test_segment_text_output() {
    let fixture = Fixture::new();
    let log = request_log(&fixture);
    fixture
        .cmd()
        .args(["segment", "--min-support", "2"])
        .arg(fixture.repo())
        .arg(arg(&log))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 runs"))
        .stdout(predicate::str::contains("[0, 1, 2]"));
}

#[test]
fn test_analyzer_failure_is_reported() {
    let fixture = Fixture::new();
    let broken = fixture.path("broken");
    fs::create_dir(&broken).unwrap();

    fixture
        .cmd()
        .arg("graph")
        .arg(&broken)
        .assert()
        .failure()
        .stderr(predicate::str::contains("code 3"))
        .stderr(predicate::str::contains("boom: cannot parse Server.java"));
}

#[test]
fn test_missing_source_tree() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("graph")
        .arg(fixture.path("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_stats_isolates_failing_project() {
    let fixture = Fixture::new();
    let projects = fixture.path("projects");
    fs::create_dir_all(projects.join("alpha")).unwrap();
    fs::create_dir_all(projects.join("broken")).unwrap();

    fixture
        .cmd()
        .arg("stats")
        .arg("--path")
        .arg(&projects)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "alpha: 3 statements, 2 with id, 2 injection opportunities",
        ))
        .stdout(predicate::str::contains("broken: FAILED"));
}
