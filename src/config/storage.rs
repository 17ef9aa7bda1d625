//! Certificate storage configuration from environment variables.
//!
//! Certificate documents are written below a single directory. The directory is read
//! from `CERTIFICATE_STORAGE_DIR` in the `.env` file or the environment and falls back
//! to `storage/certificates` relative to the working directory.

use std::path::PathBuf;

const DEFAULT_STORAGE_DIR: &str = "storage/certificates";

/// Gets the directory certificate documents are stored in.
#[must_use]
pub fn get_certificate_storage_dir() -> PathBuf {
    std::env::var("CERTIFICATE_STORAGE_DIR")
        .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from)
}
