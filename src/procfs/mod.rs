//! Accessor for a procfs mount point.
//!
//! This module provides the `ProcFs` handle used by collectors to locate and
//! read files below a configurable procfs mount (conventionally `/proc`).

pub mod pressure;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use pressure::{parse_pressure, PressureRecord, PressureStats};

/// Default procfs mount point.
pub const DEFAULT_MOUNT_POINT: &str = "/proc";

/// Errors raised while opening or reading procfs.
#[derive(Debug, thiserror::Error)]
pub enum ProcfsError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data in {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl ProcfsError {
    /// True when the error means the requested file or mount is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcfsError::NotFound(_))
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            ProcfsError::NotFound(path.to_path_buf())
        } else {
            ProcfsError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Handle on a procfs mount point.
#[derive(Debug, Clone)]
pub struct ProcFs {
    mount_point: PathBuf,
}

impl ProcFs {
    /// Opens the procfs mount at `mount_point`.
    ///
    /// The path must exist and be a directory.
    pub fn new(mount_point: impl AsRef<Path>) -> Result<Self, ProcfsError> {
        let mount_point = mount_point.as_ref();
        let meta = fs::metadata(mount_point).map_err(|e| ProcfsError::from_io(mount_point, e))?;
        if !meta.is_dir() {
            return Err(ProcfsError::NotADirectory(mount_point.to_path_buf()));
        }

        Ok(Self {
            mount_point: mount_point.to_path_buf(),
        })
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Joins path components below the mount point.
    pub fn path<I, P>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut path = self.mount_point.clone();
        for part in parts {
            path.push(part);
        }
        path
    }

    /// Reads and parses `<mount>/pressure/<resource>`.
    ///
    /// Kernels without PSI support (or with it disabled for a resource) do not
    /// create the file; that case is reported as `ProcfsError::NotFound`.
    pub fn resource_pressure(&self, resource: &str) -> Result<PressureStats, ProcfsError> {
        let path = self.path(["pressure", resource]);
        let content = fs::read_to_string(&path).map_err(|e| ProcfsError::from_io(&path, e))?;

        parse_pressure(&content).map_err(|reason| ProcfsError::Malformed { path, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_missing_mount() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = ProcFs::new(&missing).unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[test]
    fn test_new_rejects_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();

        let err = ProcFs::new(&file).unwrap_err();
        assert!(matches!(err, ProcfsError::NotADirectory(_)));
    }

    #[test]
    fn test_path_joins_below_mount() {
        let dir = TempDir::new().unwrap();
        let procfs = ProcFs::new(dir.path()).unwrap();

        assert_eq!(
            procfs.path(["pressure", "cpu"]),
            dir.path().join("pressure").join("cpu")
        );
    }

    #[test]
    fn test_resource_pressure_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let procfs = ProcFs::new(dir.path()).unwrap();

        let err = procfs.resource_pressure("memory").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resource_pressure_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pressure")).unwrap();
        fs::write(
            dir.path().join("pressure/io"),
            "some avg10=1.50 avg60=0.75 avg300=0.10 total=2500000\n\
             full avg10=0.50 avg60=0.25 avg300=0.05 total=1000000\n",
        )
        .unwrap();

        let procfs = ProcFs::new(dir.path()).unwrap();
        let stats = procfs.resource_pressure("io").unwrap();

        assert_eq!(stats.some.unwrap().total, 2_500_000);
        assert_eq!(stats.full.unwrap().total, 1_000_000);
    }

    #[test]
    fn test_resource_pressure_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pressure")).unwrap();
        fs::write(dir.path().join("pressure/cpu"), "garbage\n").unwrap();

        let procfs = ProcFs::new(dir.path()).unwrap();
        let err = procfs.resource_pressure("cpu").unwrap_err();

        assert!(matches!(err, ProcfsError::Malformed { .. }));
        assert!(!err.is_not_found());
    }
}
