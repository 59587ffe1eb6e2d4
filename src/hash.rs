//! BLAKE3 content hashes for checkpoint manifests
//!
//! Hashes are stored as `blake3:<hex>`. Comparison tolerates a missing
//! prefix so manifests edited by hand still verify.

use std::fs::File;
use std::path::Path;

use blake3::Hasher;

use crate::error::{Result, fs as fs_err};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Hash a file's contents, streaming it from disk
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| fs_err::read_failed(path, e))?;

    let mut hasher = Hasher::new();
    hasher
        .update_reader(file)
        .map_err(|e| fs_err::read_failed(path, e))?;

    Ok(prefixed(&hasher.finalize().to_hex()))
}

/// Whether two hashes name the same content
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    strip(expected).eq_ignore_ascii_case(strip(actual))
}

fn prefixed(hex: &str) -> String {
    format!("{HASH_PREFIX}{hex}")
}

fn strip(hash: &str) -> &str {
    hash.strip_prefix(HASH_PREFIX).unwrap_or(hash)
}
