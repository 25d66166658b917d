//! Checksum command: compute SHA-256 of a downloaded file.

use anyhow::Result;
use feedpull_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_file(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
