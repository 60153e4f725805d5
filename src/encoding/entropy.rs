//! # PLATFORM_PROJECT_ENTROPY

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// sha256 of 32 random bytes from the OS, as lowercase hex
///
/// A new value is produced on every run.
#[must_use]
pub fn generate_project_entropy() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    hex::encode(Sha256::digest(seed))
}
