//! Trimmomatic adapter and quality trimming.

use std::path::PathBuf;

use crate::config::{ToolConfig, TrimProfile};
use crate::pipeline::Stage;
use crate::runner::Invocation;

/// Input/output layout for one Trimmomatic call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimLayout {
    Single {
        input: PathBuf,
        output: PathBuf,
    },
    Paired {
        r1: PathBuf,
        r2: PathBuf,
        r1_paired: PathBuf,
        r1_unpaired: PathBuf,
        r2_paired: PathBuf,
        r2_unpaired: PathBuf,
    },
}

/// A `java -jar trimmomatic.jar SE|PE ...` call.
#[derive(Debug, Clone)]
pub struct TrimmomaticCommand {
    pub layout: TrimLayout,
    pub adapter_fasta: PathBuf,
    pub threads: usize,
    pub profile: TrimProfile,
}

impl TrimmomaticCommand {
    pub fn new(layout: TrimLayout, adapter_fasta: PathBuf) -> Self {
        Self {
            layout,
            adapter_fasta,
            threads: 1,
            profile: TrimProfile::default(),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_profile(mut self, profile: TrimProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Trailing trim steps, in the order Trimmomatic applies them.
    pub fn steps(&self) -> Vec<String> {
        let p = &self.profile;
        vec![
            format!(
                "ILLUMINACLIP:{}:{}:{}:{}",
                self.adapter_fasta.display(),
                p.seed_mismatches,
                p.palindrome_clip,
                p.simple_clip
            ),
            format!("SLIDINGWINDOW:{}:{}", p.window_size, p.window_quality),
            format!("LEADING:{}", p.leading),
            format!("TRAILING:{}", p.trailing),
            format!("MINLEN:{}", p.min_len),
        ]
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        let mode = match self.layout {
            TrimLayout::Single { .. } => "SE",
            TrimLayout::Paired { .. } => "PE",
        };
        let inv = Invocation::new(Stage::Trim, &tools.java)
            .arg("-jar")
            .arg(&tools.trimmomatic_jar)
            .arg(mode)
            .arg("-threads")
            .arg(self.threads.to_string())
            .arg("-phred33");

        let inv = match &self.layout {
            TrimLayout::Single { input, output } => inv.arg(input).arg(output).output(output),
            TrimLayout::Paired {
                r1,
                r2,
                r1_paired,
                r1_unpaired,
                r2_paired,
                r2_unpaired,
            } => inv
                .args([r1, r2, r1_paired, r1_unpaired, r2_paired, r2_unpaired])
                .output(r1_paired)
                .output(r2_paired),
        };
        inv.args(self.steps())
    }
}
