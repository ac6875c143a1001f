//! Bowtie2 alignment.

use std::path::PathBuf;

use crate::config::ToolConfig;
use crate::pipeline::{ReadSet, Stage};
use crate::runner::Invocation;

/// A `bowtie2 -p N -x index -S out.sam (-U r | -1 r1 -2 r2)` call.
#[derive(Debug, Clone)]
pub struct Bowtie2Command {
    pub index: PathBuf,
    pub reads: ReadSet,
    pub output: PathBuf,
    pub threads: usize,
}

impl Bowtie2Command {
    pub fn new(index: PathBuf, reads: ReadSet, output: PathBuf) -> Self {
        Self {
            index,
            reads,
            output,
            threads: 1,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        let inv = Invocation::new(Stage::Align, &tools.bowtie2)
            .arg("-p")
            .arg(self.threads.to_string())
            .arg("-x")
            .arg(&self.index)
            .arg("-S")
            .arg(&self.output)
            .output(&self.output);

        match &self.reads.r2 {
            Some(r2) => inv.arg("-1").arg(&self.reads.r1).arg("-2").arg(r2),
            None => inv.arg("-U").arg(&self.reads.r1),
        }
    }
}
