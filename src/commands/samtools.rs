//! samtools view / merge / sort / mpileup.

use std::path::PathBuf;

use crate::config::ToolConfig;
use crate::flags::FlagFilter;
use crate::pipeline::Stage;
use crate::runner::Invocation;

/// `samtools view -b [-F x] [-f y] -o out in`: flag-filter an alignment file
/// into BAM.
#[derive(Debug, Clone)]
pub struct ViewCommand {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filter: FlagFilter,
    pub stage: Stage,
}

impl ViewCommand {
    pub fn new(stage: Stage, filter: FlagFilter, input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            filter,
            stage,
        }
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        Invocation::new(self.stage, &tools.samtools)
            .args(["view", "-b"])
            .args(self.filter.to_args())
            .arg("-o")
            .arg(&self.output)
            .arg(&self.input)
            .output(&self.output)
    }
}

/// `samtools merge -c -p out in...`.
///
/// `-c` and `-p` collapse identical `@RG`/`@PG` header lines across inputs.
#[derive(Debug, Clone)]
pub struct MergeCommand {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
}

impl MergeCommand {
    pub fn new(output: PathBuf, inputs: Vec<PathBuf>) -> Self {
        Self { output, inputs }
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        Invocation::new(Stage::Merge, &tools.samtools)
            .args(["merge", "-c", "-p"])
            .arg(&self.output)
            .args(&self.inputs)
            .output(&self.output)
    }
}

/// `samtools sort -@ N -o out in`: coordinate sort.
#[derive(Debug, Clone)]
pub struct SortCommand {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threads: usize,
}

impl SortCommand {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            threads: 1,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        Invocation::new(Stage::Sort, &tools.samtools)
            .arg("sort")
            .arg("-@")
            .arg(self.threads.to_string())
            .arg("-o")
            .arg(&self.output)
            .arg(&self.input)
            .output(&self.output)
    }
}

/// `samtools mpileup -a -o out in`: per-base pileup including zero-depth
/// positions.
#[derive(Debug, Clone)]
pub struct MpileupCommand {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl MpileupCommand {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self { input, output }
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        Invocation::new(Stage::Pileup, &tools.samtools)
            .args(["mpileup", "-a", "-o"])
            .arg(&self.output)
            .arg(&self.input)
            .output(&self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Partition;

    fn tools() -> ToolConfig {
        ToolConfig::default()
    }

    #[test]
    fn test_view_partition_args() {
        let cmd = ViewCommand::new(
            Stage::Classify,
            Partition::ThisEndMapped.filter(),
            "/ws/wambam.sam".into(),
            "/ws/thisEndMapped.bam".into(),
        );
        assert_eq!(
            cmd.invocation(&tools()).command_line(),
            "samtools view -b -F 4 -f 8 -o /ws/thisEndMapped.bam /ws/wambam.sam"
        );

        let cmd = ViewCommand::new(
            Stage::Classify,
            Partition::ThatEndMapped.filter(),
            "in.sam".into(),
            "that.bam".into(),
        );
        assert_eq!(
            cmd.invocation(&tools()).args_lossy(),
            ["view", "-b", "-F", "8", "-f", "4", "-o", "that.bam", "in.sam"]
        );
    }

    #[test]
    fn test_view_mapped_only() {
        let cmd = ViewCommand::new(
            Stage::FilterMapped,
            FlagFilter::mapped(),
            "in.sam".into(),
            "mapped.bam".into(),
        );
        let inv = cmd.invocation(&tools());
        assert_eq!(inv.stage(), Stage::FilterMapped);
        assert_eq!(
            inv.args_lossy(),
            ["view", "-b", "-F", "4", "-o", "mapped.bam", "in.sam"]
        );
    }

    #[test]
    fn test_merge_order_is_preserved() {
        let inputs: Vec<PathBuf> = Partition::ALL
            .iter()
            .map(|p| PathBuf::from(p.file_name()))
            .collect();
        let cmd = MergeCommand::new("merged.bam".into(), inputs);
        assert_eq!(
            cmd.invocation(&tools()).args_lossy(),
            [
                "merge",
                "-c",
                "-p",
                "merged.bam",
                "thisEndMapped.bam",
                "thatEndMapped.bam",
                "bothEndsMapped.bam",
            ]
        );
    }

    #[test]
    fn test_sort_forwards_threads() {
        let cmd = SortCommand::new("merged.bam".into(), "merged.sorted.bam".into()).with_threads(6);
        assert_eq!(
            cmd.invocation(&tools()).command_line(),
            "samtools sort -@ 6 -o merged.sorted.bam merged.bam"
        );
    }

    #[test]
    fn test_mpileup_args() {
        let cmd = MpileupCommand::new("sorted.bam".into(), "sample-pileup".into());
        let inv = cmd.invocation(&tools());
        assert_eq!(inv.stage(), Stage::Pileup);
        assert_eq!(
            inv.args_lossy(),
            ["mpileup", "-a", "-o", "sample-pileup", "sorted.bam"]
        );
        assert_eq!(inv.outputs(), [PathBuf::from("sample-pileup")]);
    }
}
