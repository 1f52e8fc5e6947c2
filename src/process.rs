//! Subprocess runner abstraction
//!
//! Credential helpers are external binaries invoked with bytes on stdin
//! and JSON on stdout. The invocation goes through the narrow
//! [`CommandRunner`] trait so the resolution logic can be exercised in
//! tests with a fake runner instead of spawning real processes.

use std::io::Write;
use std::process::{Command, Stdio};

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Narrow seam over subprocess execution: program + args + stdin bytes
/// in, captured output out.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], stdin: &[u8]) -> std::io::Result<CommandOutput>;
}

/// Runner backed by [`std::process::Command`]
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], stdin: &[u8]) -> std::io::Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut pipe) = child.stdin.take() {
            // The helper reads stdin to EOF; dropping the pipe closes it.
            pipe.write_all(stdin)?;
        }

        let output = child.wait_with_output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
