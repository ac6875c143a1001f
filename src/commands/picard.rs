//! Picard SamToFastq: reconstruct FASTQ reads from an alignment file.

use std::path::PathBuf;

use crate::config::ToolConfig;
use crate::pipeline::Stage;
use crate::runner::{key_value, Invocation};

/// A `java -jar picard.jar SamToFastq ...` call.
///
/// With `second` set, mates are split into `FASTQ` and `SECOND_END_FASTQ`;
/// otherwise every read goes to `FASTQ`.
#[derive(Debug, Clone)]
pub struct SamToFastqCommand {
    pub input: PathBuf,
    pub first: PathBuf,
    pub second: Option<PathBuf>,
    pub stage: Stage,
}

impl SamToFastqCommand {
    pub fn new(stage: Stage, input: PathBuf, first: PathBuf, second: Option<PathBuf>) -> Self {
        Self {
            input,
            first,
            second,
            stage,
        }
    }

    pub fn invocation(&self, tools: &ToolConfig) -> Invocation {
        let inv = Invocation::new(self.stage, &tools.java)
            .arg("-jar")
            .arg(&tools.picard_jar)
            .arg("SamToFastq")
            .arg("VALIDATION_STRINGENCY=LENIENT")
            .arg(key_value("I", &self.input))
            .arg(key_value("FASTQ", &self.first))
            .output(&self.first);

        match &self.second {
            Some(second) => inv
                .arg(key_value("SECOND_END_FASTQ", second))
                .output(second),
            None => inv,
        }
    }
}
