//! Thin wrappers around `std::process::Command` used by the backends.
//!
//! Every command runs in an explicit working directory; nothing in bulkkit
//! relies on the process-wide current directory.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::types::CommandOutput;

fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn command(program: &str, args: &[&str], dir: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// Run a command and capture its output, whatever the exit status
pub fn output(program: &str, args: &[&str], dir: Option<&Path>) -> Result<CommandOutput> {
    log::debug!("running: {}", command_line(program, args));

    let output = command(program, args, dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            command: command_line(program, args),
            source,
        })?;

    Ok(output.into())
}

/// Run a command, capture stdout, and fail on a non-zero exit status
pub fn run_capture(program: &str, args: &[&str], dir: Option<&Path>) -> Result<String> {
    let output = output(program, args, dir)?;
    ensure_success(program, args, &output)?;
    Ok(output.stdout_str())
}

/// Run a command with inherited stdio (output shows in real time)
pub fn run_inherit(program: &str, args: &[&str], dir: Option<&Path>) -> Result<CommandOutput> {
    log::debug!("running: {}", command_line(program, args));

    let status = command(program, args, dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::Spawn {
            command: command_line(program, args),
            source,
        })?;

    Ok(CommandOutput {
        stdout: Vec::new(),
        stderr: Vec::new(),
        success: status.success(),
        code: status.code(),
    })
}

/// Turn an unsuccessful exit into `Error::CommandFailed`
pub fn ensure_success(program: &str, args: &[&str], output: &CommandOutput) -> Result<()> {
    if output.success {
        return Ok(());
    }
    Err(Error::CommandFailed {
        command: command_line(program, args),
        status: output.status_label(),
        stderr: output.stderr_str(),
    })
}
