//! Typed configurations for the external tools the pipeline drives.
//!
//! Each command holds its inputs, outputs and options as plain fields and is
//! turned into an [`Invocation`](crate::runner::Invocation) only at the call
//! boundary.

pub mod bowtie2;
pub mod picard;
pub mod samtools;
pub mod trimmomatic;

pub use bowtie2::Bowtie2Command;
pub use picard::SamToFastqCommand;
pub use samtools::{MergeCommand, MpileupCommand, SortCommand, ViewCommand};
pub use trimmomatic::{TrimLayout, TrimmomaticCommand};
