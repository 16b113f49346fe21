//! Script operator: runs a shell script inside the workspace

use std::io::Write;

use crate::context::OperatorContext;
use crate::error::{Error, Result};
use crate::runner;
use crate::types::ApplyResult;

use super::Operator;

/// Plan key for script steps
pub const KIND: &str = "script";

/// Interpreter used when none is configured
pub const DEFAULT_SHELL: &str = "bash";

/// Flags that make the shell abort on errors, unset variables and failed pipelines
const STRICT_FLAGS: &str = "-euo";
const STRICT_OPTION: &str = "pipefail";

/// Runs a script body under strict shell mode
#[derive(Debug, Clone)]
pub struct ScriptOperator {
    pub run: String,
    pub shell: String,
}

impl ScriptOperator {
    pub fn new(run: &str) -> Self {
        Self {
            run: run.to_string(),
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }

    fn first_line(&self) -> &str {
        self.run
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
    }
}

impl Operator for ScriptOperator {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        let lines = self.run.lines().filter(|l| !l.trim().is_empty()).count();
        if lines > 1 {
            format!("Run {} script: {} (+{} lines)", self.shell, self.first_line(), lines - 1)
        } else {
            format!("Run {} script: {}", self.shell, self.first_line())
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.run.trim().is_empty() {
            return Err("script.run must not be empty".to_string());
        }
        if self.shell.trim().is_empty() {
            return Err("shell must not be empty".to_string());
        }
        Ok(())
    }

    fn apply(&self, ctx: &OperatorContext<'_>) -> Result<ApplyResult> {
        let mut file = tempfile::Builder::new()
            .prefix("script-")
            .suffix(".sh")
            .tempfile()?;
        file.write_all(self.run.as_bytes())?;
        file.flush()?;

        // Closes the handle; the file is removed when `script` drops
        let script = file.into_temp_path();
        let script_path = script.to_string_lossy().to_string();

        let output = runner::run_inherit(
            &self.shell,
            &[STRICT_FLAGS, STRICT_OPTION, &script_path],
            Some(ctx.dir),
        )?;

        if !output.success {
            return Err(Error::ScriptExecution { code: output.code });
        }

        log::debug!("script finished in {}", ctx.dir.display());
        Ok(ApplyResult::Executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn apply(run: &str, dir: &std::path::Path) -> Result<ApplyResult> {
        ScriptOperator::new(run).apply(&OperatorContext::new(dir))
    }

    #[test]
    fn test_script_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let result = apply("echo generated > out.txt\n", dir.path()).unwrap();

        assert_eq!(result, ApplyResult::Executed);
        assert_eq!(
            fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "generated\n"
        );
    }

    #[test]
    fn test_script_failure_carries_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply("exit 7\n", dir.path()).unwrap_err();
        assert!(matches!(err, Error::ScriptExecution { code: Some(7) }));
    }

    #[test]
    fn test_script_aborts_on_first_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply("false\ntouch after.txt\n", dir.path()).unwrap_err();

        assert!(matches!(err, Error::ScriptExecution { .. }));
        assert!(!dir.path().join("after.txt").exists());
    }

    #[test]
    fn test_script_aborts_on_unset_variable() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply("echo \"$BULK_SURELY_UNSET_VARIABLE\"\n", dir.path()).unwrap_err();
        assert!(matches!(err, Error::ScriptExecution { .. }));
    }

    #[test]
    fn test_script_aborts_on_pipeline_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply("false | cat\ntouch after.txt\n", dir.path()).unwrap_err();

        assert!(matches!(err, Error::ScriptExecution { .. }));
        assert!(!dir.path().join("after.txt").exists());
    }

    #[test]
    fn test_script_file_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        apply("echo \"$0\" > path.txt\n", dir.path()).unwrap();

        let script = fs::read_to_string(dir.path().join("path.txt")).unwrap();
        assert!(script.trim().ends_with(".sh"));
        assert!(!std::path::Path::new(script.trim()).exists());
    }

    #[test]
    fn test_script_file_removed_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply("echo \"$0\" > path.txt\nexit 1\n", dir.path()).unwrap_err();
        assert!(matches!(err, Error::ScriptExecution { code: Some(1) }));

        let script = fs::read_to_string(dir.path().join("path.txt")).unwrap();
        assert!(script.trim().ends_with(".sh"));
        assert!(!std::path::Path::new(script.trim()).exists());
    }

    #[test]
    fn test_validate() {
        assert!(ScriptOperator::new("echo ok").validate().is_ok());
        assert!(ScriptOperator::new("").validate().is_err());
        assert!(ScriptOperator::new("echo ok").with_shell(" ").validate().is_err());
    }

    #[test]
    fn test_description_summarises_script() {
        let op = ScriptOperator::new("\nnpm install\nnpm run build\n");
        assert_eq!(op.description(), "Run bash script: npm install (+1 lines)");
    }
}
