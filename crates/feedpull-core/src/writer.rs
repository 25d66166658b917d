//! Ordered append of fetched chunk bodies.
//!
//! The output is staged as `<path>.part` and renamed to the final path only
//! after the whole plan has been written, so a failed download never leaves
//! a truncated file under the final name. The staging file is opened once in
//! append mode for the duration of the download and is never written from
//! fetch tasks; only this writer touches it, one fully joined batch at a
//! time. Strict in-order append across batch and within-batch boundaries is
//! what makes the reassembled file byte-identical to the remote resource.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Staging suffix used before the atomic rename.
pub const PART_SUFFIX: &str = ".part";

/// Path of the staging file for a given final path.
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PART_SUFFIX);
    PathBuf::from(o)
}

/// Append-only writer for a feed download.
pub struct FeedWriter {
    file: File,
    part: PathBuf,
    final_path: PathBuf,
}

impl FeedWriter {
    /// Starts a fresh download targeting `final_path`.
    ///
    /// Any stale staging file from an earlier failed run is discarded. The
    /// staging file is opened in append mode without an exclusive lock, so
    /// concurrent readers are tolerated.
    pub fn create(final_path: &Path) -> Result<Self> {
        let part = part_path(final_path);
        match std::fs::remove_file(&part) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("remove stale {}", part.display()));
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&part)
            .with_context(|| format!("create staging file {}", part.display()))?;
        Ok(Self {
            file,
            part,
            final_path: final_path.to_path_buf(),
        })
    }

    /// Appends one joined batch of bodies, in the order given.
    pub fn append_batch<I, B>(&mut self, bodies: I) -> Result<u64>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut written = 0u64;
        for body in bodies {
            let bytes = body.as_ref();
            self.file
                .write_all(bytes)
                .with_context(|| format!("append to {}", self.part.display()))?;
            written += bytes.len() as u64;
        }
        Ok(written)
    }

    /// Path of the staging file currently being written.
    pub fn part_path(&self) -> &Path {
        &self.part
    }

    /// Syncs appended data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("sync staging file")
    }

    /// Atomically renames the staging file to the final path.
    /// Consumes the writer and closes the file.
    pub fn finalize(self) -> Result<PathBuf> {
        let Self {
            file,
            part,
            final_path,
        } = self;
        drop(file);
        std::fs::rename(&part, &final_path).with_context(|| {
            format!("rename {} to {}", part.display(), final_path.display())
        })?;
        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("feed.gz")).to_string_lossy(),
            "feed.gz.part"
        );
        assert_eq!(
            part_path(Path::new("/tmp/out/feed.gz")).to_string_lossy(),
            "/tmp/out/feed.gz.part"
        );
    }

    #[test]
    fn append_batches_in_order_and_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.gz");
        let mut w = FeedWriter::create(&out).unwrap();
        w.append_batch([b"abc".as_slice(), b"def".as_slice()]).unwrap();
        w.append_batch([b"ghi".as_slice()]).unwrap();
        w.sync().unwrap();
        assert!(w.part_path().exists());
        assert!(!out.exists());
        let final_path = w.finalize().unwrap();
        assert_eq!(final_path, out);
        assert!(!part_path(&out).exists());
        assert_eq!(std::fs::read(&out).unwrap(), b"abcdefghi");
    }

    #[test]
    fn create_discards_stale_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.gz");
        std::fs::write(part_path(&out), b"stale bytes").unwrap();
        let mut w = FeedWriter::create(&out).unwrap();
        w.append_batch([b"fresh".as_slice()]).unwrap();
        w.finalize().unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"fresh");
    }

    #[test]
    fn empty_plan_produces_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.gz");
        let w = FeedWriter::create(&out).unwrap();
        w.finalize().unwrap();
        assert_eq!(std::fs::read(&out).unwrap().len(), 0);
    }

    #[test]
    fn append_reports_bytes_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("n.bin");
        let mut w = FeedWriter::create(&out).unwrap();
        let n = w
            .append_batch([vec![0u8; 10], vec![0u8; 32]])
            .unwrap();
        assert_eq!(n, 42);
    }
}
