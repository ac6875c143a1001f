//! Alignment-record flag filters and read classification.
//!
//! The pipeline never decodes alignment records itself: classification is
//! delegated to `samtools view -f/-F`. The filters are declared here so the
//! predicate each partition applies is explicit and can be checked without
//! spawning anything.

use std::fmt;

/// Read is paired in sequencing.
pub const PAIRED: u16 = 0x1;
/// This read is unmapped.
pub const UNMAPPED: u16 = 0x4;
/// The mate of this read is unmapped.
pub const MATE_UNMAPPED: u16 = 0x8;

/// A `-f required` / `-F excluded` flag filter pair.
///
/// A record passes when every bit in `required` is set and no bit in
/// `excluded` is set, which is how `samtools view` combines the two options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagFilter {
    pub required: u16,
    pub excluded: u16,
}

impl FlagFilter {
    pub const fn new(required: u16, excluded: u16) -> Self {
        Self { required, excluded }
    }

    /// Keep records whose own sequence is mapped.
    pub const fn mapped() -> Self {
        Self::new(0, UNMAPPED)
    }

    /// Keep records whose own sequence is unmapped.
    pub const fn unmapped() -> Self {
        Self::new(UNMAPPED, 0)
    }

    /// Keep records where neither mate is mapped.
    pub const fn neither_end_mapped() -> Self {
        Self::new(UNMAPPED | MATE_UNMAPPED, 0)
    }

    #[inline]
    pub fn matches(&self, flag: u16) -> bool {
        flag & self.required == self.required && flag & self.excluded == 0
    }

    /// `samtools view` arguments for this filter. Empty masks are omitted.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if self.excluded != 0 {
            args.push("-F".to_string());
            args.push(self.excluded.to_string());
        }
        if self.required != 0 {
            args.push("-f".to_string());
            args.push(self.required.to_string());
        }
        args
    }
}

/// One of the three classification partitions of a paired alignment stream.
///
/// Records with neither end mapped fall in no partition and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    /// This end mapped, mate unmapped.
    ThisEndMapped,
    /// This end unmapped, mate mapped.
    ThatEndMapped,
    /// Both ends mapped.
    BothEndsMapped,
}

impl Partition {
    /// All partitions in merge order.
    pub const ALL: [Partition; 3] = [
        Partition::ThisEndMapped,
        Partition::ThatEndMapped,
        Partition::BothEndsMapped,
    ];

    pub fn filter(&self) -> FlagFilter {
        match self {
            Partition::ThisEndMapped => FlagFilter::new(MATE_UNMAPPED, UNMAPPED),
            Partition::ThatEndMapped => FlagFilter::new(UNMAPPED, MATE_UNMAPPED),
            Partition::BothEndsMapped => FlagFilter::new(0, UNMAPPED | MATE_UNMAPPED),
        }
    }

    /// Workspace-relative artifact name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Partition::ThisEndMapped => "thisEndMapped.bam",
            Partition::ThatEndMapped => "thatEndMapped.bam",
            Partition::BothEndsMapped => "bothEndsMapped.bam",
        }
    }

    /// The partition a record with `flag` lands in, if any.
    pub fn of(flag: u16) -> Option<Partition> {
        Partition::ALL.into_iter().find(|p| p.filter().matches(flag))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partition::ThisEndMapped => "thisEndMapped",
            Partition::ThatEndMapped => "thatEndMapped",
            Partition::BothEndsMapped => "bothEndsMapped",
        };
        f.write_str(name)
    }
}

/// True when at least one end of the fragment is mapped.
#[inline]
pub fn any_end_mapped(flag: u16) -> bool {
    flag & UNMAPPED == 0 || flag & MATE_UNMAPPED == 0
}
