//! Per-run scratch directory.
//!
//! Every intermediate artifact of a run lives under one [`Workspace`]. The
//! directory is removed by [`Workspace::release`], or by `Drop` when a run
//! unwinds past its owner, unless it is explicitly preserved.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Directory name prefix for workspaces.
pub const WORKSPACE_PREFIX: &str = "wambam-";

/// Random identifier of one pipeline run, formatted like a v4 UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        let mut rng = SmallRng::from_entropy();
        let bits: u128 = rng.gen();
        // Stamp version 4 / RFC 4122 variant bits
        let bits = (bits & !(0xf_u128 << 76) & !(0x3_u128 << 62))
            | (0x4_u128 << 76)
            | (0x2_u128 << 62);
        let hex = format!("{:032x}", bits);
        Self(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An exclusively owned scratch directory for one run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    run_id: RunId,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn acquire() -> io::Result<Self> {
        Self::acquire_in(std::env::temp_dir())
    }

    /// Create a workspace under `root`.
    ///
    /// The directory name embeds a fresh [`RunId`]; creation fails rather than
    /// reusing a directory that already exists.
    pub fn acquire_in<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let run_id = RunId::generate();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}", WORKSPACE_PREFIX, run_id))
            .rand_bytes(0)
            .tempdir_in(root)?;
        tracing::debug!(run_id = %run_id, path = %dir.path().display(), "workspace acquired");
        Ok(Self { dir, run_id })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Path of a workspace-relative artifact.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Tear the workspace down, or hand it over to the caller.
    ///
    /// Returns the directory path when `preserve` is set; the directory is then
    /// no longer owned by anything and survives the process.
    pub fn release(self, preserve: bool) -> io::Result<Option<PathBuf>> {
        if preserve {
            let path = self.dir.keep();
            tracing::debug!(path = %path.display(), "workspace preserved");
            Ok(Some(path))
        } else {
            let path = self.dir.path().to_path_buf();
            self.dir.close()?;
            tracing::debug!(path = %path.display(), "workspace removed");
            Ok(None)
        }
    }
}
