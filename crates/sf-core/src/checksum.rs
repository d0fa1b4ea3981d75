//! MD5 fingerprints for change detection against stage listings.
//!
//! Stage listings report an MD5 digest per file, so local files are
//! fingerprinted with the same algorithm.

use crate::error::{CoreError, CoreResult};
use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Compute the MD5 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the MD5 checksum of a file's contents, streaming in chunks
pub fn file_md5(path: &Path) -> CoreResult<String> {
    let io_err = |e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
