//! Pipeline stages.
//!
//! Each stage builds one or more typed tool commands, runs them through the
//! [`Runner`] and returns the workspace artifact the next stage consumes.

use std::path::{Path, PathBuf};

use crate::commands::{
    Bowtie2Command, MergeCommand, MpileupCommand, SamToFastqCommand, SortCommand, TrimLayout,
    TrimmomaticCommand, ViewCommand,
};
use crate::config::{AdapterProfile, ToolConfig, TrimProfile};
use crate::error::Result;
use crate::flags::{FlagFilter, Partition};
use crate::pipeline::fastq::{mates_consistent, relative_size_difference};
use crate::pipeline::{ReadSet, Stage};
use crate::runner::Runner;
use crate::workspace::Workspace;

// Workspace-relative artifact names
pub const TRIMMED: &str = "trimmed.fq";
pub const FORWARD_PAIRED: &str = "forward_paired.fq";
pub const FORWARD_UNPAIRED: &str = "forward_unpaired.fq";
pub const REVERSE_PAIRED: &str = "reverse_paired.fq";
pub const REVERSE_UNPAIRED: &str = "reverse_unpaired.fq";
pub const ALIGNMENT: &str = "wambam.sam";
pub const MAPPED: &str = "mapped.bam";
pub const UNMAPPED: &str = "unmapped.bam";
pub const MERGED: &str = "merged.bam";
pub const EXTRACTED_R1: &str = "extracted-R1.fastq";
pub const EXTRACTED_R2: &str = "extracted-R2.fastq";

// Final outputs are staged under these names until the run has succeeded
pub const STAGED_READS: &str = "final.fastq";
pub const STAGED_R1: &str = "final-R1.fastq";
pub const STAGED_R2: &str = "final-R2.fastq";
pub const STAGED_TRIM: &str = "final-trim.fastq.gz";
pub const STAGED_TRIM_R1: &str = "final-trim-R1.fastq.gz";
pub const STAGED_TRIM_R2: &str = "final-trim-R2.fastq.gz";
pub const STAGED_PILEUP: &str = "final-pileup";

/// Sorted counterpart of a BAM artifact: `merged.bam` -> `merged.sorted.bam`.
pub fn sorted_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.sorted.bam", stem))
}

/// Stage driver bound to one run's workspace, tools and runner.
pub struct Stages<'a, R: Runner> {
    runner: R,
    tools: &'a ToolConfig,
    workspace: &'a Workspace,
    threads: usize,
}

impl<'a, R: Runner> Stages<'a, R> {
    pub fn new(runner: R, tools: &'a ToolConfig, workspace: &'a Workspace, threads: usize) -> Self {
        Self {
            runner,
            tools,
            workspace,
            threads,
        }
    }

    /// Reconstruct reads from an alignment file.
    ///
    /// Both mate files are always requested. When their sizes differ by more
    /// than the mate tolerance the input is treated as single-end and the
    /// second file is dropped from the returned set.
    pub fn extract(&mut self, alignment: &Path) -> Result<ReadSet> {
        let r1 = self.workspace.artifact(EXTRACTED_R1);
        let r2 = self.workspace.artifact(EXTRACTED_R2);
        let cmd = SamToFastqCommand::new(
            Stage::Extract,
            alignment.to_path_buf(),
            r1.clone(),
            Some(r2.clone()),
        );
        self.runner.run(&cmd.invocation(self.tools))?;

        let r1_len = std::fs::metadata(&r1)?.len();
        let r2_len = std::fs::metadata(&r2)?.len();
        if mates_consistent(r1_len, r2_len) {
            Ok(ReadSet::paired(r1, r2))
        } else {
            tracing::warn!(
                r1_bytes = r1_len,
                r2_bytes = r2_len,
                difference = relative_size_difference(r1_len, r2_len),
                "mate files differ in size; treating alignment input as single-end"
            );
            Ok(ReadSet::single(r1))
        }
    }

    /// Adapter and quality trimming. Unpaired leftovers of a paired run stay
    /// in the workspace and are not used further.
    pub fn trim(
        &mut self,
        reads: &ReadSet,
        adapter: AdapterProfile,
        profile: TrimProfile,
    ) -> Result<ReadSet> {
        let (layout, trimmed) = match &reads.r2 {
            Some(r2) => {
                let r1_paired = self.workspace.artifact(FORWARD_PAIRED);
                let r2_paired = self.workspace.artifact(REVERSE_PAIRED);
                let layout = TrimLayout::Paired {
                    r1: reads.r1.clone(),
                    r2: r2.clone(),
                    r1_paired: r1_paired.clone(),
                    r1_unpaired: self.workspace.artifact(FORWARD_UNPAIRED),
                    r2_paired: r2_paired.clone(),
                    r2_unpaired: self.workspace.artifact(REVERSE_UNPAIRED),
                };
                (layout, ReadSet::paired(r1_paired, r2_paired))
            }
            None => {
                let output = self.workspace.artifact(TRIMMED);
                let layout = TrimLayout::Single {
                    input: reads.r1.clone(),
                    output: output.clone(),
                };
                (layout, ReadSet::single(output))
            }
        };

        tracing::info!(adapter = %adapter, paired = reads.is_paired(), "trimming reads");
        let cmd = TrimmomaticCommand::new(layout, self.tools.adapter_fasta(adapter))
            .with_threads(self.threads)
            .with_profile(profile);
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(trimmed)
    }

    /// Align reads against `index`, producing the run's single alignment file.
    pub fn align(&mut self, index: &Path, reads: &ReadSet) -> Result<PathBuf> {
        let output = self.workspace.artifact(ALIGNMENT);
        let cmd = Bowtie2Command::new(index.to_path_buf(), reads.clone(), output.clone())
            .with_threads(self.threads);
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(output)
    }

    /// Apply a single flag filter to an alignment file.
    pub fn filter(
        &mut self,
        stage: Stage,
        filter: FlagFilter,
        input: &Path,
        name: &str,
    ) -> Result<PathBuf> {
        let output = self.workspace.artifact(name);
        let cmd = ViewCommand::new(stage, filter, input.to_path_buf(), output.clone());
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(output)
    }

    /// Split a paired alignment into the three disjoint partitions, in
    /// [`Partition::ALL`] order.
    pub fn classify(&mut self, alignment: &Path) -> Result<Vec<PathBuf>> {
        Partition::ALL
            .iter()
            .map(|partition| {
                self.filter(
                    Stage::Classify,
                    partition.filter(),
                    alignment,
                    partition.file_name(),
                )
            })
            .collect()
    }

    /// Concatenate partitions into one alignment file.
    pub fn merge(&mut self, partitions: Vec<PathBuf>) -> Result<PathBuf> {
        let output = self.workspace.artifact(MERGED);
        let cmd = MergeCommand::new(output.clone(), partitions);
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(output)
    }

    /// Coordinate-sort an alignment file next to its input.
    pub fn sort(&mut self, input: &Path) -> Result<PathBuf> {
        let output = sorted_name(input);
        let cmd = SortCommand::new(input.to_path_buf(), output.clone()).with_threads(self.threads);
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(output)
    }

    /// Per-base pileup of a sorted alignment file.
    pub fn pileup(&mut self, sorted: &Path, output: PathBuf) -> Result<PathBuf> {
        let cmd = MpileupCommand::new(sorted.to_path_buf(), output.clone());
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(output)
    }

    /// Convert a sorted alignment file back to FASTQ at the given paths.
    pub fn export(&mut self, sorted: &Path, outputs: ReadSet) -> Result<ReadSet> {
        let cmd = SamToFastqCommand::new(
            Stage::Export,
            sorted.to_path_buf(),
            outputs.r1.clone(),
            outputs.r2.clone(),
        );
        self.runner.run(&cmd.invocation(self.tools))?;
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_name() {
        assert_eq!(
            sorted_name(Path::new("/ws/merged.bam")),
            PathBuf::from("/ws/merged.sorted.bam")
        );
        assert_eq!(
            sorted_name(Path::new("/ws/mapped.bam")),
            PathBuf::from("/ws/mapped.sorted.bam")
        );
    }

    #[test]
    fn test_partition_artifacts_are_distinct() {
        let names: Vec<&str> = Partition::ALL.iter().map(|p| p.file_name()).collect();
        for name in &names {
            assert_ne!(*name, MERGED);
            assert_ne!(*name, MAPPED);
        }
        assert_eq!(names.len(), 3);
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
    }
}
