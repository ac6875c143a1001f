//! WAMBAM: extract (or deplete) reads mapping to a reference region.
//!
//! Usage: wambam --prefix STEM (--R1 FQ [--R2 FQ] | --bam BAM) [--index IDX] [OPTIONS]

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use wambam::config::{
    AdapterProfile, FilterMode, PipelineRequest, ReadSource, ToolConfig, DEFAULT_ADAPTERS_DIR,
    DEFAULT_PICARD_JAR, DEFAULT_TRIMMOMATIC_JAR,
};
use wambam::error::PipelineError;
use wambam::runner::ProcessRunner;

#[derive(Parser, Debug)]
#[command(name = "wambam")]
#[command(version)]
#[command(
    about = "Extract reads that map to a reference region (or remove them) from FASTQ or BAM input",
    long_about = None
)]
struct Cli {
    /// Path to the bowtie2 index (not needed with --bam or --just-trim)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Path to the reference index
    #[arg(long)]
    faidx: Option<PathBuf>,

    /// Output file name stem
    #[arg(long)]
    prefix: String,

    /// Read 1 FASTQ
    #[arg(short = '1', long = "R1")]
    r1: Option<PathBuf>,

    /// Read 2 FASTQ (omit for single-end input)
    #[arg(short = '2', long = "R2")]
    r2: Option<PathBuf>,

    /// Derive reads from this alignment file instead of --R1/--R2
    #[arg(short = 'b', long)]
    bam: Option<PathBuf>,

    /// Trimmomatic adapter profile: NexteraPE-PE, TruSeq2-PE, TruSeq2-SE,
    /// TruSeq3-PE-2, TruSeq3-PE, TruSeq3-SE
    /// [default: TruSeq3-PE for paired input, TruSeq3-SE otherwise]
    #[arg(long, value_parser = parse_adapter)]
    adapter: Option<AdapterProfile>,

    /// Threads forwarded to the trimmer, aligner and sorter
    #[arg(long = "CPU", default_value_t = 1)]
    cpu: usize,

    /// Keep the temporary workspace and print its path
    #[arg(long)]
    save: bool,

    /// Stop after trimming and write gzip-compressed reads
    #[arg(long)]
    just_trim: bool,

    /// Keep reads with no mapped end instead of reads with a mapped end
    #[arg(long)]
    deplete: bool,

    /// Directory to create the temporary workspace in
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    quiet: bool,

    /// bowtie2 executable
    #[arg(long, env = "WAMBAM_BOWTIE2", default_value = "bowtie2")]
    bowtie2: PathBuf,

    /// samtools executable
    #[arg(long, env = "WAMBAM_SAMTOOLS", default_value = "samtools")]
    samtools: PathBuf,

    /// java executable
    #[arg(long, env = "WAMBAM_JAVA", default_value = "java")]
    java: PathBuf,

    /// Trimmomatic jar
    #[arg(long, env = "WAMBAM_TRIMMOMATIC", default_value = DEFAULT_TRIMMOMATIC_JAR)]
    trimmomatic: PathBuf,

    /// Directory holding the Trimmomatic adapter FASTA files
    #[arg(long, env = "WAMBAM_ADAPTERS", default_value = DEFAULT_ADAPTERS_DIR)]
    adapters_dir: PathBuf,

    /// Picard jar
    #[arg(long, env = "WAMBAM_PICARD", default_value = DEFAULT_PICARD_JAR)]
    picard: PathBuf,
}

fn parse_adapter(s: &str) -> Result<AdapterProfile, String> {
    AdapterProfile::parse(s).ok_or_else(|| {
        let names: Vec<&str> = AdapterProfile::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown adapter profile '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let source = ReadSource::from_inputs(cli.r1, cli.r2, cli.bam)?;
    let tools = ToolConfig {
        bowtie2: cli.bowtie2,
        samtools: cli.samtools,
        java: cli.java,
        trimmomatic_jar: cli.trimmomatic,
        adapters_dir: cli.adapters_dir,
        picard_jar: cli.picard,
    };
    let filter = if cli.deplete {
        FilterMode::Deplete
    } else {
        FilterMode::Isolate
    };

    let mut request = PipelineRequest::new(cli.prefix, source)
        .with_faidx(cli.faidx)
        .with_adapter(cli.adapter)
        .with_threads(cli.cpu)
        .with_preserve_workspace(cli.save)
        .with_just_trim(cli.just_trim)
        .with_filter(filter)
        .with_tools(tools)
        .with_workspace_root(cli.tmpdir);
    if let Some(index) = cli.index {
        request = request.with_index(index);
    }

    let result = wambam::pipeline::run(&request, &mut ProcessRunner)?;

    if let Some(path) = &result.workspace {
        println!("TEMP FILES: \n{}", path.display());
    }
    Ok(())
}
