//! External process invocation.
//!
//! The builders in [`crate::mux`] only describe an invocation; this module
//! actually runs it. Success is derived from the tool's exit status and
//! nothing else. The tool's stderr is forwarded to the log for diagnostics,
//! never parsed.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;

use crate::mux::ToolCommand;

/// Error from launching or completing an external tool.
#[derive(Debug, Error)]
pub enum RunError {
    /// The process could not be spawned or waited on.
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited with a non-zero status.
    #[error("{tool} failed with exit code {exit_code}")]
    ToolFailed { tool: String, exit_code: i32 },
}

/// Collaborator that executes a built command and reports the exit code.
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand) -> Result<i32, RunError>;
}

/// Runs commands as real child processes.
///
/// The calling thread blocks until the tool exits; a separate thread drains
/// stderr continuously so the child never stalls on a full pipe. No timeout
/// is applied, so a hung tool hangs the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<i32, RunError> {
        let tool = command.tool_name();
        tracing::debug!("{}: {}", tool, command.args.join(" "));

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let mut child = process.spawn().map_err(|e| RunError::Launch {
            tool: tool.clone(),
            source: e,
        })?;

        let drain = child.stderr.take().map(|stderr| {
            let tool = tool.clone();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if !line.is_empty() {
                        tracing::warn!("[{}] {}", tool, line);
                    }
                }
            })
        });

        let status = child.wait().map_err(|e| RunError::Launch {
            tool: tool.clone(),
            source: e,
        })?;
        if let Some(handle) = drain {
            let _ = handle.join();
        }

        Ok(status.code().unwrap_or(-1))
    }
}

/// Run a command and require a zero exit status.
///
/// Any non-zero exit code becomes [`RunError::ToolFailed`]; there is no
/// partial-success interpretation and no retry.
pub fn run_to_completion(runner: &dyn ToolRunner, command: &ToolCommand) -> Result<(), RunError> {
    let exit_code = runner.run(command)?;
    if exit_code != 0 {
        return Err(RunError::ToolFailed {
            tool: command.tool_name(),
            exit_code,
        });
    }
    Ok(())
}
