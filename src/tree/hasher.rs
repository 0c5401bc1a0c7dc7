//! Content etags for leaf nodes

use std::fs::File;
use std::io;
use std::path::Path;

/// Etag of an in-memory buffer: hex-encoded blake3 digest.
pub fn compute_etag(content: &[u8]) -> String {
    hex::encode(blake3::hash(content).as_bytes())
}

/// Etag of a file on disk, hashed in streaming fashion.
pub fn etag_for_file(path: &Path) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize().as_bytes()))
}
