//! Script runtimes.
//!
//! The manager does not interpret scripts itself. A [`ScriptRuntime`] is
//! handed each script and reports success or failure.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use anyhow::{bail, Context};

use super::ScriptHandle;

/// Opaque script execution capability.
pub trait ScriptRuntime {
    fn run(&mut self, script: &ScriptHandle) -> anyhow::Result<()>;
}

impl<F> ScriptRuntime for F
where
    F: FnMut(&ScriptHandle) -> anyhow::Result<()>,
{
    fn run(&mut self, script: &ScriptHandle) -> anyhow::Result<()> {
        self(script)
    }
}

/// Runs scripts through an external interpreter process.
///
/// The interpreter receives the source loaded by the manager on stdin, so
/// edits made to the file after loading have no effect.
#[derive(Debug, Clone)]
pub struct InterpreterRuntime {
    program: String,
    args: Vec<String>,
}

impl InterpreterRuntime {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// The stock `lua` interpreter found on `PATH`, reading the chunk from stdin.
    pub fn lua() -> Self {
        Self::new("lua").with_args(["-"])
    }

    /// Arguments passed to the interpreter.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl ScriptRuntime for InterpreterRuntime {
    fn run(&mut self, script: &ScriptHandle) -> anyhow::Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);

        // Set environment variables for context
        command.env("SPECTRUM_SCRIPT_ID", script.id());
        command.env("SPECTRUM_SCRIPT_PATH", script.path());

        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start interpreter '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(script.source().as_bytes()) {
                // The interpreter may exit before reading everything.
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e).context("failed to send the script to the interpreter");
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("interpreter '{}' did not finish", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("interpreter exited with {}: {}", output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("[{}] {}", script.id(), stdout.trim());
        }
        Ok(())
    }
}
