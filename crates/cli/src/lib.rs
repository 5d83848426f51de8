use std::env;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

pub mod commands;
pub mod tracing_config;

/// Environment variable used by reproducible builds to pin timestamps.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Canonicalize the path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Paths that do not exist yet (e.g. report outputs) cannot be canonicalized.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

/// Parse a `SOURCE_DATE_EPOCH` value (seconds since the Unix epoch).
pub fn parse_epoch(value: &str) -> Result<DateTime<Utc>> {
    let seconds: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("{SOURCE_DATE_EPOCH} is not an integer: {value:?}"))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| anyhow!("{SOURCE_DATE_EPOCH} is out of range: {seconds}"))
}

/// Report timestamp pinned by the environment, if any.
pub fn timestamp_from_env() -> Result<Option<DateTime<Utc>>> {
    match env::var(SOURCE_DATE_EPOCH) {
        Ok(value) if !value.trim().is_empty() => parse_epoch(&value).map(Some),
        _ => Ok(None),
    }
}
