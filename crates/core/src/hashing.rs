//! Shared SHA-256 hex digest utility.
//!
//! Migration checksums in the ledger are computed with this so that a
//! changed SQL file is detected on the next run.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
