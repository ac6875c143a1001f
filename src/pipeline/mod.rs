//! The read-extraction pipeline.
//!
//! A run is a strictly sequential chain of stages selected from the read
//! layout and the run mode:
//!
//! ```text
//! paired:  [Extract] -> Trim -> Align -> Classify x3 -> Merge -> Sort -> Pileup -> Export
//! single:  [Extract] -> Trim -> Align -> FilterMapped -> Sort -> Pileup -> Export
//! trim:    [Extract] -> Trim -> Compress
//! extract:  Extract
//! ```
//!
//! Final outputs are staged inside the workspace and moved to their
//! `<prefix>` paths only once every stage has succeeded.
//!
//! With [`FilterMode::Deplete`] the classify/merge (or mapped filter) steps
//! are replaced by one unmapped filter and no pileup is produced.
//!
//! Every stage blocks until its tool exits, and the first failure aborts the
//! run. The workspace is released exactly once in [`run`], whatever the
//! outcome.

pub mod fastq;
pub mod stages;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{FilterMode, PipelineRequest, ReadSource, RunMode};
use crate::error::{PipelineError, Result};
use crate::flags::FlagFilter;
use crate::runner::Runner;
use crate::workspace::Workspace;

use stages::Stages;

/// Pipeline stage, used to label invocations, log records and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Trim,
    Align,
    FilterMapped,
    FilterUnmapped,
    Classify,
    Merge,
    Sort,
    Pileup,
    Export,
    Compress,
}

impl Stage {
    /// Stages that only exist on the paired-end path.
    pub fn is_paired_only(&self) -> bool {
        matches!(self, Stage::Classify | Stage::Merge)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Trim => "trim",
            Stage::Align => "align",
            Stage::FilterMapped => "filter-mapped",
            Stage::FilterUnmapped => "filter-unmapped",
            Stage::Classify => "classify",
            Stage::Merge => "merge",
            Stage::Sort => "sort",
            Stage::Pileup => "pileup",
            Stage::Export => "export",
            Stage::Compress => "compress",
        };
        f.write_str(name)
    }
}

/// First mate and optional second mate FASTQ files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSet {
    pub r1: PathBuf,
    pub r2: Option<PathBuf>,
}

impl ReadSet {
    pub fn single(r1: impl Into<PathBuf>) -> Self {
        Self {
            r1: r1.into(),
            r2: None,
        }
    }

    pub fn paired(r1: impl Into<PathBuf>, r2: impl Into<PathBuf>) -> Self {
        Self {
            r1: r1.into(),
            r2: Some(r2.into()),
        }
    }

    pub fn is_paired(&self) -> bool {
        self.r2.is_some()
    }

    /// All files in mate order.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.r1).chain(self.r2.as_ref())
    }
}

/// FASTQ records written per mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadCounts {
    pub r1: u64,
    pub r2: Option<u64>,
}

impl ReadCounts {
    /// Count records in a set of plain FASTQ files; mates are counted in
    /// parallel.
    pub fn of(reads: &ReadSet) -> std::io::Result<Self> {
        let (r1, r2) = rayon::join(
            || fastq::count_records(&reads.r1),
            || reads.r2.as_deref().map(fastq::count_records).transpose(),
        );
        Ok(Self { r1: r1?, r2: r2? })
    }
}

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub mode: RunMode,
    /// Final read files.
    pub reads: ReadSet,
    pub counts: ReadCounts,
    /// `<prefix>-pileup`, when a pileup was produced.
    pub pileup: Option<PathBuf>,
    /// Workspace directory, when preserved.
    pub workspace: Option<PathBuf>,
}

/// Run the pipeline for `request`, driving external tools through `runner`.
///
/// Configuration errors are reported before the workspace is created. Any
/// later failure aborts the run after the workspace has been released
/// (removed, or kept when the request asks to preserve it).
pub fn run<R: Runner>(request: &PipelineRequest, runner: &mut R) -> Result<PipelineResult> {
    let mode = request.validate()?;

    let workspace = match &request.workspace_root {
        Some(root) => Workspace::acquire_in(root)?,
        None => Workspace::acquire()?,
    };
    let span = tracing::info_span!("run", run_id = %workspace.run_id());
    let _enter = span.enter();
    tracing::info!(
        mode = %mode,
        prefix = %request.prefix,
        workspace = %workspace.path().display(),
        "starting pipeline"
    );
    if let Some(faidx) = &request.faidx {
        tracing::debug!(faidx = %faidx.display(), "reference index supplied");
    }

    let outcome = Pipeline {
        request,
        workspace: &workspace,
        runner,
    }
    .execute(mode);

    let released = workspace.release(request.preserve_workspace);
    match (outcome, released) {
        (Ok(mut result), Ok(kept)) => {
            result.workspace = kept;
            tracing::info!(
                r1_reads = result.counts.r1,
                r2_reads = result.counts.r2,
                "pipeline complete"
            );
            Ok(result)
        }
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(kept)) => {
            if let Some(path) = kept {
                tracing::warn!(workspace = %path.display(), "run failed; workspace preserved");
            }
            Err(e)
        }
        (Err(e), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, "run failed and workspace could not be removed");
            Err(e)
        }
    }
}

struct Pipeline<'a, R: Runner> {
    request: &'a PipelineRequest,
    workspace: &'a Workspace,
    runner: &'a mut R,
}

impl<R: Runner> Pipeline<'_, R> {
    fn execute(self, mode: RunMode) -> Result<PipelineResult> {
        let request = self.request;
        let mut stages = Stages::new(
            self.runner,
            &request.tools,
            self.workspace,
            request.threads,
        );

        let reads = match &request.source {
            ReadSource::Single(r1) => ReadSet::single(r1),
            ReadSource::Paired(r1, r2) => ReadSet::paired(r1, r2),
            ReadSource::Alignment(bam) => stages.extract(bam)?,
        };
        tracing::info!(paired = reads.is_paired(), "read layout resolved");

        if mode == RunMode::ExtractOnly {
            let counts = ReadCounts::of(&reads)?;
            let outputs = final_reads(request, reads.is_paired());
            return deliver(mode, &reads, outputs, None, counts);
        }

        let adapter = request.adapter_for(reads.is_paired());
        let trimmed = stages.trim(&reads, adapter, request.trim)?;

        if mode == RunMode::JustTrim {
            let staged = staged_trim(self.workspace, trimmed.is_paired());
            let counts = ReadCounts::of(&trimmed)?;
            for (src, dst) in trimmed.files().zip(staged.files()) {
                let bytes = fastq::gzip_file(src, dst)?;
                tracing::info!(
                    stage = %Stage::Compress,
                    output = %dst.display(),
                    bytes,
                    "compressed trimmed reads"
                );
            }
            let outputs = trimmed_outputs(request, trimmed.is_paired());
            return deliver(mode, &staged, outputs, None, counts);
        }

        let index = request
            .index
            .as_deref()
            .ok_or_else(|| PipelineError::config("--index is required for alignment"))?;
        let alignment = stages.align(index, &trimmed)?;

        let selected = match (trimmed.is_paired(), request.filter) {
            (true, FilterMode::Isolate) => {
                let partitions = stages.classify(&alignment)?;
                stages.merge(partitions)?
            }
            (false, FilterMode::Isolate) => stages.filter(
                Stage::FilterMapped,
                FlagFilter::mapped(),
                &alignment,
                stages::MAPPED,
            )?,
            (true, FilterMode::Deplete) => stages.filter(
                Stage::FilterUnmapped,
                FlagFilter::neither_end_mapped(),
                &alignment,
                stages::UNMAPPED,
            )?,
            (false, FilterMode::Deplete) => stages.filter(
                Stage::FilterUnmapped,
                FlagFilter::unmapped(),
                &alignment,
                stages::UNMAPPED,
            )?,
        };

        let sorted = stages.sort(&selected)?;
        let pileup = match request.filter {
            FilterMode::Isolate => {
                let staged = self.workspace.artifact(stages::STAGED_PILEUP);
                let staged = stages.pileup(&sorted, staged)?;
                Some((staged, request.output_path("-pileup")))
            }
            FilterMode::Deplete => None,
        };
        let staged = stages.export(&sorted, staged_reads(self.workspace, trimmed.is_paired()))?;
        let counts = ReadCounts::of(&staged)?;
        deliver(
            mode,
            &staged,
            final_reads(request, trimmed.is_paired()),
            pileup,
            counts,
        )
    }
}

/// Move staged files to their final paths and build the result.
///
/// Nothing is written outside the workspace before this point, so a failed
/// run leaves no prefixed outputs behind.
fn deliver(
    mode: RunMode,
    staged: &ReadSet,
    outputs: ReadSet,
    pileup: Option<(PathBuf, PathBuf)>,
    counts: ReadCounts,
) -> Result<PipelineResult> {
    let mut moves: Vec<(PathBuf, PathBuf)> = staged
        .files()
        .cloned()
        .zip(outputs.files().cloned())
        .collect();
    let pileup = pileup.map(|(src, dst)| {
        moves.push((src, dst.clone()));
        dst
    });
    publish(&moves)?;
    Ok(PipelineResult {
        mode,
        reads: outputs,
        counts,
        pileup,
        workspace: None,
    })
}

/// Move each `(staged, final)` pair into place. On failure, files already
/// published are removed again.
pub fn publish(moves: &[(PathBuf, PathBuf)]) -> std::io::Result<()> {
    for (i, (src, dst)) in moves.iter().enumerate() {
        if let Err(e) = move_file(src, dst) {
            discard(dst);
            for (_, done) in &moves[..i] {
                discard(done);
            }
            return Err(e);
        }
        tracing::debug!(output = %dst.display(), "published");
    }
    Ok(())
}

fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    // Rename fails across filesystems
    std::fs::copy(src, dst)?;
    std::fs::remove_file(src)
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial output")
        }
    }
}

/// `<prefix>.fastq`, or `<prefix>-R1.fastq` / `<prefix>-R2.fastq`.
pub fn final_reads(request: &PipelineRequest, paired: bool) -> ReadSet {
    if paired {
        ReadSet::paired(
            request.output_path("-R1.fastq"),
            request.output_path("-R2.fastq"),
        )
    } else {
        ReadSet::single(request.output_path(".fastq"))
    }
}

/// `<prefix>-trim.fastq.gz`, or `<prefix>-trim-R1.fastq.gz` / `<prefix>-trim-R2.fastq.gz`.
pub fn trimmed_outputs(request: &PipelineRequest, paired: bool) -> ReadSet {
    if paired {
        ReadSet::paired(
            request.output_path("-trim-R1.fastq.gz"),
            request.output_path("-trim-R2.fastq.gz"),
        )
    } else {
        ReadSet::single(request.output_path("-trim.fastq.gz"))
    }
}

fn staged_reads(workspace: &Workspace, paired: bool) -> ReadSet {
    if paired {
        ReadSet::paired(
            workspace.artifact(stages::STAGED_R1),
            workspace.artifact(stages::STAGED_R2),
        )
    } else {
        ReadSet::single(workspace.artifact(stages::STAGED_READS))
    }
}

fn staged_trim(workspace: &Workspace, paired: bool) -> ReadSet {
    if paired {
        ReadSet::paired(
            workspace.artifact(stages::STAGED_TRIM_R1),
            workspace.artifact(stages::STAGED_TRIM_R2),
        )
    } else {
        ReadSet::single(workspace.artifact(stages::STAGED_TRIM))
    }
}
