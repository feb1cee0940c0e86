//! Content identity
//!
//! Deterministic identifiers for deduplicating sources: the SHA-256 digest
//! of the raw bytes, hex-encoded and truncated to 16 characters.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::EngineError;

/// Length of a content identifier in hex characters
pub const CONTENT_ID_LEN: usize = 16;

/// Content identifier of a byte slice
///
/// # Example
///
/// ```
/// use mixgrid_dsp::identity::content_hash;
///
/// let id = content_hash(b"abc");
/// assert_eq!(id, "ba7816bf8f01cfea");
/// ```
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    digest[..CONTENT_ID_LEN].to_string()
}

/// Content identifier of a file, streamed in chunks
///
/// # Errors
///
/// Returns `EngineError::IoError` if the file cannot be read.
pub fn file_content_hash<P: AsRef<Path>>(path: P) -> Result<String, EngineError> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = hex::encode(hasher.finalize());
    log::debug!("Content hash of {}: {}", path.as_ref().display(), &digest[..CONTENT_ID_LEN]);
    Ok(digest[..CONTENT_ID_LEN].to_string())
}
