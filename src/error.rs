//! Error taxonomy for a pipeline run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// Errors that can abort a pipeline run.
///
/// Configuration errors are raised before any workspace is acquired or any
/// external process is launched. Every other variant is fatal for the run and
/// is reported after the workspace has been released.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to launch {program} for {stage} stage: {source}")]
    Spawn {
        stage: Stage,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} stage failed ({}): {command}", describe_exit(.code))]
    ProcessFailed {
        stage: Stage,
        command: String,
        code: Option<i32>,
    },

    #[error("{stage} stage exited cleanly but did not produce {}", .path.display())]
    MissingOutput { stage: Stage, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        PipelineError::Config(message.into())
    }

    /// Process exit code reported by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 2,
            _ => 1,
        }
    }

    /// True for errors raised before any resource was acquired.
    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::Config(_))
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PipelineError::config("missing --R1").exit_code(), 2);
        let failed = PipelineError::ProcessFailed {
            stage: Stage::Align,
            command: "bowtie2 -x idx".to_string(),
            code: Some(1),
        };
        assert_eq!(failed.exit_code(), 1);
        assert!(!failed.is_config());
    }

    #[test]
    fn test_process_failure_message() {
        let failed = PipelineError::ProcessFailed {
            stage: Stage::Sort,
            command: "samtools sort -o out.bam in.bam".to_string(),
            code: None,
        };
        let message = failed.to_string();
        assert!(message.contains("sort stage failed"));
        assert!(message.contains("terminated by signal"));
        assert!(message.contains("samtools sort"));
    }
}
