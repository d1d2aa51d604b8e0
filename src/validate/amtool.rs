//! Alertmanager configuration checks through `amtool check-config`.

use crate::types::{ProcessError, ValidationResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, trace};

/// Default validator binary.
pub const DEFAULT_TOOL: &str = "amtool";

/// Runs an external validator against in-memory config text.
///
/// The command line is `<program> <args...> <file>`; the default is
/// `amtool check-config <file>`.
#[derive(Debug, Clone)]
pub struct ConfigChecker {
    program: String,
    args: Vec<String>,
}

impl ConfigChecker {
    /// Create a checker invoking `tool check-config <file>`.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            program: tool.into(),
            args: vec!["check-config".to_string()],
        }
    }

    /// Create a checker with an arbitrary base command. The file path is
    /// appended after `args`.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.program
    }

    /// Validate `text`, returning the validator's stdout on success.
    ///
    /// Failures to write the file, to start the tool, or a non-zero exit all
    /// produce a failed result instead of an error. The temporary file is
    /// removed before this returns.
    pub async fn check_config(&self, text: &str) -> ValidationResult {
        match self.run(text).await {
            Ok(stdout) => ValidationResult::success(stdout),
            Err(cause) => {
                debug!("{} failed: {}", self.program, cause);
                ValidationResult::failure(format!("Error running {}: {}", self.program, cause))
            }
        }
    }

    async fn run(&self, text: &str) -> Result<String, ProcessError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        // `file` must outlive the child process; dropping it deletes the path.
        self.run_on_file(file.path()).await
    }

    async fn run_on_file(&self, path: &Path) -> Result<String, ProcessError> {
        let command = format!("{} {} {}", self.program, self.args.join(" "), path.display());
        trace!("Running {}", command);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProcessError::Exit {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for ConfigChecker {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

/// Check `text` with the default `amtool` binary.
pub async fn check_config(text: &str) -> ValidationResult {
    ConfigChecker::default().check_config(text).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A `sh -c` script standing in for the validator. Inside the script
    /// `$1` is `check-config` and `$2` is the temporary file.
    fn fake_tool(script: &str) -> ConfigChecker {
        ConfigChecker::with_command("sh", ["-c", script, "fake-amtool", "check-config"])
    }

    #[tokio::test]
    async fn test_success_returns_stdout() {
        let checker = fake_tool(r#"[ "$1" = "check-config" ] || exit 3; cat "$2""#);

        let result = checker.check_config("route:\n  receiver: default\n").await;

        assert!(result.succeeded());
        assert_eq!(result.output(), "route:\n  receiver: default\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let checker = fake_tool("echo 'yaml: line 1: bad' >&2; exit 1");

        let result = checker.check_config("not: [valid").await;

        assert!(!result.succeeded());
        assert!(result.output().starts_with("Error running sh: "));
        assert!(result.output().contains("yaml: line 1: bad"));
    }

    #[tokio::test]
    async fn test_run_reports_exit_status_and_stderr() {
        let checker = fake_tool("echo 'unknown receiver' >&2; exit 4");

        match checker.run("route: {}").await {
            Err(ProcessError::Exit {
                command,
                status,
                stderr,
            }) => {
                assert!(command.starts_with("sh -c "));
                assert_eq!(status.code(), Some(4));
                assert_eq!(stderr, "unknown receiver");
            }
            other => panic!("expected exit failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_reports_spawn_failure_as_io() {
        let checker = ConfigChecker::new("/nonexistent/quaykit-amtool");

        let err = checker.run("global: {}").await.unwrap_err();

        assert!(matches!(err, ProcessError::Io(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let checker = ConfigChecker::new("/nonexistent/quaykit-amtool");
        let result = checker.check_config("global: {}").await;

        assert!(!result.succeeded());
        assert!(result
            .output()
            .starts_with("Error running /nonexistent/quaykit-amtool: "));
    }

    #[tokio::test]
    async fn test_temp_file_removed_on_success() {
        let checker = fake_tool(r#"printf '%s' "$2""#);

        let result = checker.check_config("global: {}").await;

        assert!(result.succeeded());
        let used = Path::new(result.output());
        assert!(used.is_absolute());
        assert!(!used.exists());
    }

    #[tokio::test]
    async fn test_temp_file_removed_on_failure() {
        let dir = TempDir::new().unwrap();
        let record = dir.path().join("seen-path");
        let script = format!(r#"printf '%s' "$2" > '{}'; exit 2"#, record.display());
        let checker = fake_tool(&script);

        let result = checker.check_config("global: {}").await;

        assert!(!result.succeeded());
        let used = std::fs::read_to_string(&record).unwrap();
        assert!(!used.is_empty());
        assert!(!Path::new(&used).exists());
    }

    #[test]
    fn test_default_tool() {
        assert_eq!(ConfigChecker::default().tool(), DEFAULT_TOOL);
    }
}
