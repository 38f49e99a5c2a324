//! Managed output directory shared by download jobs and the retention sweeper

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffixes the engine uses for in-progress files.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Directory that receives finished downloads
#[derive(Debug, Clone)]
pub struct StorageDir {
    root: PathBuf,
}

impl StorageDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory if missing
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Engine output template for `stem`; the engine fills in the extension.
    pub fn output_template(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.%(ext)s"))
    }

    /// Find the finished file the engine produced for `stem`.
    ///
    /// Matches `<stem>.` as a prefix, so `clip1` never picks up `clip10.mp4`,
    /// and skips partial files. A leftover from an earlier job with the same
    /// name loses to the most recently modified match; ties go to the
    /// lexically first name.
    pub fn find_output(&self, stem: &str) -> io::Result<Option<PathBuf>> {
        let prefix = format!("{stem}.");
        let mut matches = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if !name.starts_with(&prefix) {
                continue;
            }
            if PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                continue;
            }
            let meta = entry.metadata()?;
            if meta.is_file() {
                matches.push((meta.modified()?, entry.path()));
            }
        }

        Ok(matches
            .into_iter()
            .max_by(|(a_time, a_path), (b_time, b_path)| {
                a_time.cmp(b_time).then_with(|| b_path.cmp(a_path))
            })
            .map(|(_, path)| path))
    }

    /// Delete a file, logging instead of failing.
    pub fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }

    /// Free space on the volume in whole MB, or -1 if it cannot be read.
    pub fn free_space_mb(&self) -> i64 {
        match fs2::available_space(&self.root) {
            Ok(bytes) => (bytes as f64 / BYTES_PER_MB).round() as i64,
            Err(e) => {
                tracing::debug!(path = %self.root.display(), error = %e, "Free space unavailable");
                -1
            }
        }
    }
}

/// Bytes to megabytes (MiB).
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
