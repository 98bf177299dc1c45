//! External static analyzer invocation
//!
//! The analyzer is a separately versioned JVM program. It is launched as
//!
//! ```text
//! java -cp <classpath> ltid.log_graph.Launcher --environment <launcher>:<path> <output|gather>
//! ```
//!
//! and its standard output is consumed as a row stream while it runs.
//! Standard error is drained on a helper thread so neither pipe can fill up
//! and stall the child. The exit code is checked once stdout is exhausted.

use crate::log_graph::rows::{AnalyzerCommand, AnalyzerRow, RecordReader};
use serde::{Deserialize, Serialize};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the analyzer classpath
pub const CLASSPATH_ENV: &str = "LOGGRAPH_CLASSPATH";

/// Errors raised while running the analyzer
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("source path does not exist: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to launch analyzer `{}` (classpath {classpath}): {source}", .command.join(" "))]
    Spawn {
        command: Vec<String>,
        classpath: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "analyzer `{}` exited with {} (classpath {classpath}):\n{stderr}",
        .command.join(" "),
        .exit_code.map_or_else(|| "a signal".to_string(), |code| format!("code {}", code))
    )]
    Failed {
        command: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
        classpath: String,
    },

    #[error("malformed analyzer row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("IO error while reading analyzer output: {0}")]
    Io(#[from] io::Error),
}

/// How to find and launch the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// JVM launcher program
    pub program: String,
    /// Classpath pointing at the bundled analyzer archive
    pub classpath: String,
    pub main_class: String,
    /// Environment launcher kind passed as `<launcher>:<path>`
    pub launcher: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            classpath: default_classpath(),
            main_class: "ltid.log_graph.Launcher".to_string(),
            launcher: "file".to_string(),
        }
    }
}

/// `$LOGGRAPH_CLASSPATH`, else `include/*` next to the running executable
fn default_classpath() -> String {
    if let Ok(classpath) = std::env::var(CLASSPATH_ENV) {
        return classpath;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("include").join("*")))
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "include/*".to_string())
}

/// Runs the analyzer over a source tree
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Full command line (program first) for analyzing `source`
    pub fn command_line(&self, source: &Path, command: AnalyzerCommand) -> Vec<String> {
        vec![
            self.config.program.clone(),
            "-cp".to_string(),
            self.config.classpath.clone(),
            self.config.main_class.clone(),
            "--environment".to_string(),
            format!("{}:{}", self.config.launcher, source.display()),
            command.keyword().to_string(),
        ]
    }

    /// Run the analyzer and decode every row it prints
    pub fn rows(
        &self,
        source: &Path,
        command: AnalyzerCommand,
    ) -> Result<Vec<AnalyzerRow>, AnalysisError> {
        if !source.exists() {
            return Err(AnalysisError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let command_line = self.command_line(source, command);
        debug!("running analyzer: {}", command_line.join(" "));

        let mut child = Command::new(&command_line[0])
            .args(&command_line[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AnalysisError::Spawn {
                command: command_line.clone(),
                classpath: self.config.classpath.clone(),
                source,
            })?;

        let stderr_pipe = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            if let Some(mut pipe) = stderr_pipe {
                if let Err(e) = pipe.read_to_end(&mut bytes) {
                    debug!("analyzer stderr truncated: {}", e);
                }
            }
            String::from_utf8_lossy(&bytes).into_owned()
        });

        // Keep reading to EOF even after a bad row so the child is never
        // blocked on a full pipe; the first decode problem is reported after
        // the exit status.
        let mut rows = Vec::new();
        let mut first_problem: Option<AnalysisError> = None;
        if let Some(stdout) = child.stdout.take() {
            let mut reader = RecordReader::new(BufReader::new(stdout));
            loop {
                match reader.next_record() {
                    Ok(Some(fields)) => match AnalyzerRow::from_record(command, &fields) {
                        Ok(row) => rows.push(row),
                        Err(reason) => {
                            first_problem.get_or_insert(AnalysisError::MalformedRow {
                                line: reader.line_number(),
                                reason,
                            });
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        first_problem.get_or_insert(AnalysisError::Io(e));
                        break;
                    }
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(AnalysisError::Failed {
                command: command_line,
                exit_code: status.code(),
                stderr,
                classpath: self.config.classpath.clone(),
            });
        }
        if let Some(problem) = first_problem {
            return Err(problem);
        }

        debug!("analyzer produced {} rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_layout() {
        let analyzer = Analyzer::new(AnalyzerConfig {
            program: "java".to_string(),
            classpath: "/opt/ltid/*".to_string(),
            main_class: "ltid.log_graph.Launcher".to_string(),
            launcher: "maven".to_string(),
        });
        let line = analyzer.command_line(Path::new("/src/app"), AnalyzerCommand::Output);
        assert_eq!(
            line,
            vec![
                "java",
                "-cp",
                "/opt/ltid/*",
                "ltid.log_graph.Launcher",
                "--environment",
                "maven:/src/app",
                "output"
            ]
        );
    }

    #[test]
    fn test_missing_source_path() {
        let analyzer = Analyzer::default();
        let err = analyzer
            .rows(Path::new("/definitely/not/here"), AnalyzerCommand::Output)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SourceNotFound { .. }));
    }

    #[test]
    fn test_spawn_failure_carries_command() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(AnalyzerConfig {
            program: "/nonexistent/analyzer-binary".to_string(),
            ..AnalyzerConfig::default()
        });
        let err = analyzer
            .rows(dir.path(), AnalyzerCommand::Gather)
            .unwrap_err();
        match err {
            AnalysisError::Spawn { command, .. } => {
                assert_eq!(command[0], "/nonexistent/analyzer-binary");
                assert_eq!(command.last().map(String::as_str), Some("gather"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    fn script_analyzer(dir: &Path, body: &str) -> Analyzer {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("analyzer.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        Analyzer::new(AnalyzerConfig {
            program: script.display().to_string(),
            ..AnalyzerConfig::default()
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_keeps_non_utf8_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = script_analyzer(
            dir.path(),
            r"printf 'Exception in Caf\351.java: boom' >&2; exit 3",
        );
        let err = analyzer
            .rows(dir.path(), AnalyzerCommand::Output)
            .unwrap_err();
        match err {
            AnalysisError::Failed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.starts_with("Exception in Caf"));
                assert!(stderr.ends_with(".java: boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_error_message() {
        let err = AnalysisError::Failed {
            command: vec!["java".to_string(), "-cp".to_string()],
            exit_code: Some(3),
            stderr: "boom".to_string(),
            classpath: "lib/*".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("java -cp"));
        assert!(message.contains("code 3"));
        assert!(message.contains("lib/*"));
        assert!(message.contains("boom"));
    }
}
