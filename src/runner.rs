//! Launching external tools.
//!
//! Stages describe an external tool call as an [`Invocation`] and hand it to
//! a [`Runner`]. [`ProcessRunner`] spawns the process and blocks until it
//! exits; nothing is streamed between stages, every boundary is a finished
//! file on disk.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;

/// One fully-resolved external tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    stage: Stage,
    program: PathBuf,
    args: Vec<OsString>,
    outputs: Vec<PathBuf>,
}

impl Invocation {
    pub fn new(stage: Stage, program: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            program: program.into(),
            args: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Declare a file the tool must leave behind on success.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy UTF-8, for assertions and logging.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Space-joined command line.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Fail with [`PipelineError::MissingOutput`] if a declared output is absent.
    pub fn verify_outputs(&self) -> Result<()> {
        match self.outputs.iter().find(|p| !p.exists()) {
            Some(missing) => Err(PipelineError::MissingOutput {
                stage: self.stage,
                path: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// `KEY=<path>` argument without a lossy UTF-8 round trip.
pub fn key_value(key: &str, path: &Path) -> OsString {
    let mut arg = OsString::with_capacity(key.len() + 1 + path.as_os_str().len());
    arg.push(key);
    arg.push("=");
    arg.push(path);
    arg
}

/// Executes invocations. Implementations must block until the tool has exited.
pub trait Runner {
    fn run(&mut self, invocation: &Invocation) -> Result<()>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }
}

/// Spawns each invocation as a child process with inherited stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        tracing::info!(stage = %invocation.stage(), "{}", invocation.command_line());

        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|source| PipelineError::Spawn {
                stage: invocation.stage(),
                program: invocation.program().display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(PipelineError::ProcessFailed {
                stage: invocation.stage(),
                command: invocation.command_line(),
                code: status.code(),
            });
        }

        invocation.verify_outputs()
    }
}
