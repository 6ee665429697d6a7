use serde::Serialize;

use crate::store::StoredObject;

/// Key prefix for proof uploads inside the bucket.
pub const PROOF_PREFIX: &str = "attendance-proofs";

/// Largest accepted proof upload, in bytes.
pub const MAX_PROOF_SIZE: u64 = 5 * 1024 * 1024;

/// Declared content types accepted for proof uploads.
pub const ALLOWED_PROOF_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

#[derive(Debug, Clone, Serialize)]
pub struct UploadedProof {
    pub message: String,
    pub url: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileUrlResponse {
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDeletedResponse {
    pub message: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileListResponse {
    pub files: Vec<StoredObject>,
    pub count: usize,
}
