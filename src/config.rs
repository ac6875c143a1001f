//! Run configuration: the immutable request a pipeline run is built from.
//!
//! A [`PipelineRequest`] is constructed once from caller input and validated
//! before any workspace is acquired, so configuration errors never leave
//! scratch state behind.

use std::fmt;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Trimmomatic adapter profiles shipped with the trimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterProfile {
    NexteraPePe,
    TruSeq2Pe,
    TruSeq2Se,
    TruSeq3Pe2,
    TruSeq3Pe,
    TruSeq3Se,
}

impl AdapterProfile {
    pub const ALL: [AdapterProfile; 6] = [
        AdapterProfile::NexteraPePe,
        AdapterProfile::TruSeq2Pe,
        AdapterProfile::TruSeq2Se,
        AdapterProfile::TruSeq3Pe2,
        AdapterProfile::TruSeq3Pe,
        AdapterProfile::TruSeq3Se,
    ];

    /// Parse a profile by its Trimmomatic name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterProfile::NexteraPePe => "NexteraPE-PE",
            AdapterProfile::TruSeq2Pe => "TruSeq2-PE",
            AdapterProfile::TruSeq2Se => "TruSeq2-SE",
            AdapterProfile::TruSeq3Pe2 => "TruSeq3-PE-2",
            AdapterProfile::TruSeq3Pe => "TruSeq3-PE",
            AdapterProfile::TruSeq3Se => "TruSeq3-SE",
        }
    }

    /// Default profile for the given read layout.
    pub fn default_for(paired: bool) -> Self {
        if paired {
            AdapterProfile::TruSeq3Pe
        } else {
            AdapterProfile::TruSeq3Se
        }
    }
}

impl fmt::Display for AdapterProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the reads for a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    Single(PathBuf),
    Paired(PathBuf, PathBuf),
    /// Reads are reconstructed from an existing alignment file.
    Alignment(PathBuf),
}

impl ReadSource {
    /// Resolve the read source from the raw `--R1`, `--R2` and `--bam` inputs.
    ///
    /// `--bam` wins when both an alignment file and reads are supplied.
    pub fn from_inputs(
        r1: Option<PathBuf>,
        r2: Option<PathBuf>,
        bam: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(bam) = bam {
            if r1.is_some() || r2.is_some() {
                tracing::warn!(bam = %bam.display(), "--bam supplied; ignoring --R1/--R2");
            }
            return Ok(ReadSource::Alignment(bam));
        }
        match (r1, r2) {
            (Some(r1), Some(r2)) => Ok(ReadSource::Paired(r1, r2)),
            (Some(r1), None) => Ok(ReadSource::Single(r1)),
            (None, Some(_)) => Err(PipelineError::config("--R2 given without --R1")),
            (None, None) => Err(PipelineError::config(
                "no reads supplied: give --R1 [--R2] or --bam",
            )),
        }
    }

    pub fn is_alignment(&self) -> bool {
        matches!(self, ReadSource::Alignment(_))
    }
}

/// What the run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Trim, align, classify, sort and export.
    Full,
    /// Stop after trimming and emit gzip-compressed reads.
    JustTrim,
    /// Reconstruct reads from an alignment file and emit them as-is.
    ExtractOnly,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Full => "full",
            RunMode::JustTrim => "just-trim",
            RunMode::ExtractOnly => "extract-only",
        };
        f.write_str(name)
    }
}

/// Which reads survive the alignment filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Keep reads with at least one mapped end.
    #[default]
    Isolate,
    /// Keep only reads with no mapped end. No pileup is produced.
    Deplete,
}

/// Quality-trim settings passed to Trimmomatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimProfile {
    pub seed_mismatches: u32,
    pub palindrome_clip: u32,
    pub simple_clip: u32,
    pub window_size: u32,
    pub window_quality: u32,
    pub leading: u32,
    pub trailing: u32,
    pub min_len: u32,
}

impl Default for TrimProfile {
    fn default() -> Self {
        Self {
            seed_mismatches: 2,
            palindrome_clip: 30,
            simple_clip: 10,
            window_size: 4,
            window_quality: 5,
            leading: 5,
            trailing: 5,
            min_len: 25,
        }
    }
}

/// Locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub bowtie2: PathBuf,
    pub samtools: PathBuf,
    pub java: PathBuf,
    pub trimmomatic_jar: PathBuf,
    pub adapters_dir: PathBuf,
    pub picard_jar: PathBuf,
}

pub const DEFAULT_TRIMMOMATIC_JAR: &str = "/opt/trim/trimmomatic-0.39.jar";
pub const DEFAULT_ADAPTERS_DIR: &str = "/opt/trim/adapters";
pub const DEFAULT_PICARD_JAR: &str = "/opt/pipeline/bin/picard.jar";

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bowtie2: PathBuf::from("bowtie2"),
            samtools: PathBuf::from("samtools"),
            java: PathBuf::from("java"),
            trimmomatic_jar: PathBuf::from(DEFAULT_TRIMMOMATIC_JAR),
            adapters_dir: PathBuf::from(DEFAULT_ADAPTERS_DIR),
            picard_jar: PathBuf::from(DEFAULT_PICARD_JAR),
        }
    }
}

impl ToolConfig {
    /// Adapter FASTA for a profile.
    pub fn adapter_fasta(&self, profile: AdapterProfile) -> PathBuf {
        self.adapters_dir.join(format!("{}.fa", profile.as_str()))
    }
}

/// Everything a pipeline run needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Output naming stem.
    pub prefix: String,
    /// Aligner index.
    pub index: Option<PathBuf>,
    /// Reference index; carried through but not consumed by any stage.
    pub faidx: Option<PathBuf>,
    pub source: ReadSource,
    /// Explicit adapter profile; `None` selects by read layout.
    pub adapter: Option<AdapterProfile>,
    /// Thread count forwarded to the tools that support it.
    pub threads: usize,
    pub preserve_workspace: bool,
    pub just_trim: bool,
    pub filter: FilterMode,
    pub trim: TrimProfile,
    pub tools: ToolConfig,
    /// Directory the workspace is created in (system temp dir when unset).
    pub workspace_root: Option<PathBuf>,
}

impl PipelineRequest {
    pub fn new(prefix: impl Into<String>, source: ReadSource) -> Self {
        Self {
            prefix: prefix.into(),
            index: None,
            faidx: None,
            source,
            adapter: None,
            threads: 1,
            preserve_workspace: false,
            just_trim: false,
            filter: FilterMode::Isolate,
            trim: TrimProfile::default(),
            tools: ToolConfig::default(),
            workspace_root: None,
        }
    }

    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_faidx(mut self, faidx: Option<PathBuf>) -> Self {
        self.faidx = faidx;
        self
    }

    pub fn with_adapter(mut self, adapter: Option<AdapterProfile>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_preserve_workspace(mut self, preserve: bool) -> Self {
        self.preserve_workspace = preserve;
        self
    }

    pub fn with_just_trim(mut self, just_trim: bool) -> Self {
        self.just_trim = just_trim;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_tools(mut self, tools: ToolConfig) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Resolve what this request asks the pipeline to do.
    pub fn mode(&self) -> Result<RunMode> {
        if self.just_trim {
            Ok(RunMode::JustTrim)
        } else if self.index.is_some() {
            Ok(RunMode::Full)
        } else if self.source.is_alignment() {
            Ok(RunMode::ExtractOnly)
        } else {
            Err(PipelineError::config(
                "--index is required unless --bam or --just-trim is given",
            ))
        }
    }

    /// Check the request is runnable. Called before any resource is acquired.
    pub fn validate(&self) -> Result<RunMode> {
        if self.prefix.trim().is_empty() {
            return Err(PipelineError::config("--prefix must not be empty"));
        }
        if self.threads == 0 {
            return Err(PipelineError::config("--CPU must be at least 1"));
        }
        if let ReadSource::Paired(r1, r2) = &self.source {
            if r1 == r2 {
                return Err(PipelineError::config(format!(
                    "--R1 and --R2 both point at {}",
                    r1.display()
                )));
            }
        }
        self.mode()
    }

    /// Adapter profile for the given layout: the explicit choice, or the
    /// layout default.
    pub fn adapter_for(&self, paired: bool) -> AdapterProfile {
        self.adapter
            .unwrap_or_else(|| AdapterProfile::default_for(paired))
    }

    /// Final output path `<prefix><suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        prefixed(&self.prefix, suffix)
    }
}

/// `<prefix><suffix>` as a path.
pub fn prefixed(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", prefix, suffix))
}
