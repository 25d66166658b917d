//! Gzip decompression of a fully downloaded feed archive.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Streams the gzip archive at `src` into `dst`, returning the decompressed
/// size in bytes. Memory use is bounded regardless of archive size.
pub fn gunzip(src: &Path, dst: &Path) -> Result<u64> {
    let input = File::open(src).with_context(|| format!("open {}", src.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let output = File::create(dst).with_context(|| format!("create {}", dst.display()))?;
    let mut writer = BufWriter::new(output);
    let n = std::io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("decompress {}", src.display()))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip_bytes(content: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(content).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn gunzip_restores_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("feed.gz");
        let dst = dir.path().join("feed.tsv");
        let content = b"v1|1\tseller\ttitle\nv1|2\tother\tthing\n";
        std::fs::write(&src, gzip_bytes(content)).unwrap();
        let n = gunzip(&src, &dst).unwrap();
        assert_eq!(n, content.len() as u64);
        assert_eq!(std::fs::read(&dst).unwrap(), content);
    }

    #[test]
    fn gunzip_rejects_non_gzip_input() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("not.gz");
        let dst = dir.path().join("out");
        std::fs::write(&src, b"plain text").unwrap();
        assert!(gunzip(&src, &dst).is_err());
    }
}
