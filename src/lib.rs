// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! WAMBAM: pull the reads that map to a reference region out of a sequencing
//! run, or strip them.
//!
//! The crate drives external tools (Trimmomatic, Bowtie2, samtools, Picard)
//! through a strictly sequential pipeline inside a per-run scratch
//! [`Workspace`](workspace::Workspace). Its own logic is the staging: which
//! tools run for a single- or paired-end input, how alignment records are
//! partitioned by their flag bits, and how the workspace is torn down.
//!
//! # Features
//!
//! - **Paired-aware classification**: paired alignments are split into
//!   disjoint this-end / that-end / both-ends partitions and merged back
//! - **Alignment-file input**: reads can be reconstructed from an existing BAM
//! - **Trim-only mode**: stop after trimming and emit gzip-compressed FASTQ
//!
//! # Example
//!
//! ```rust,no_run
//! use wambam::config::{PipelineRequest, ReadSource};
//! use wambam::runner::ProcessRunner;
//!
//! let source = ReadSource::Paired("sample_R1.fq".into(), "sample_R2.fq".into());
//! let request = PipelineRequest::new("sample", source)
//!     .with_index("/ref/L1HS")
//!     .with_threads(4);
//!
//! let result = wambam::pipeline::run(&request, &mut ProcessRunner).unwrap();
//! println!("{} reads kept", result.counts.r1);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod flags;
pub mod pipeline;
pub mod runner;
pub mod workspace;

// Re-export commonly used types
pub use config::{AdapterProfile, FilterMode, PipelineRequest, ReadSource, RunMode};
pub use error::PipelineError;
pub use pipeline::{run, PipelineResult, ReadSet, Stage};
pub use runner::{Invocation, ProcessRunner, Runner};
pub use workspace::Workspace;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
