//! Proof-of-teaching uploads.
//!
//! A received file is spooled to a request-scoped temp file, checked against
//! the size ceiling and the content-type allow-list, then written to the
//! bucket under a generated key. The spool file is removed on every path.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::files::{
        FileDeletedResponse, FileListResponse, FileUrlResponse, UploadedProof, ALLOWED_PROOF_TYPES,
        MAX_PROOF_SIZE, PROOF_PREFIX,
    },
    store::BlobStore,
};

const TOKEN_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 13;
const LIST_LIMIT: u32 = 100;

/// A received file part held on local disk for the duration of a request.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
    file: Option<fs::File>,
    size: u64,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl SpooledFile {
    pub async fn create(
        upload_dir: &Path,
        file_name: Option<String>,
        content_type: Option<String>,
    ) -> Result<Self> {
        fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create upload directory: {}", e)))?;

        let path = upload_dir.join(format!("proof-{}.upload", Uuid::new_v4()));
        let file = fs::File::create(&path)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create temp file: {}", e)))?;

        Ok(Self {
            path,
            file: Some(file),
            size: 0,
            file_name,
            content_type,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Appends a chunk, refusing to grow past the size ceiling.
    pub async fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let next = self.size + chunk.len() as u64;
        if next > MAX_PROOF_SIZE {
            return Err(Error::FileTooLarge(
                "File too large. Maximum size is 5MB.".to_string(),
            ));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::Internal("Temp file already closed".to_string()))?;
        file.write_all(chunk)
            .await
            .map_err(|e| Error::Internal(format!("Failed to write temp file: {}", e)))?;
        self.size = next;
        Ok(())
    }

    /// Flushes and closes the handle, then reads the content back.
    async fn into_bytes(&mut self) -> Result<Bytes> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| Error::Internal(format!("Failed to flush temp file: {}", e)))?;
        }
        fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|e| Error::Internal(format!("Failed to read temp file: {}", e)))
    }

    /// Deletes the temp file. Failure is logged, never returned.
    pub async fn remove(mut self) {
        drop(self.file.take());
        if let Err(e) = fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove temp upload");
            }
        }
    }
}

/// Rejects declared types outside the allow-list. The declared type is
/// trusted as is.
pub fn validate_content_type(content_type: Option<&str>) -> Result<&str> {
    match content_type {
        Some(ct) if ALLOWED_PROOF_TYPES.contains(&ct) => Ok(ct),
        _ => Err(Error::UnsupportedType(
            "Invalid file type. Only JPEG, PNG, and WebP images are allowed.".to_string(),
        )),
    }
}

/// Extension of `file_name` including the dot, empty when there is none.
pub fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// `attendance-proofs/<epoch-millis>-<13 char base36 token><ext>`
pub fn generate_object_key(file_name: Option<&str>) -> String {
    format!(
        "{}/{}-{}{}",
        PROOF_PREFIX,
        Utc::now().timestamp_millis(),
        random_token(),
        extension_of(file_name)
    )
}

/// Validates the spooled file and writes it to the bucket.
pub async fn store_proof(blobs: &dyn BlobStore, spooled: &mut SpooledFile) -> Result<UploadedProof> {
    if spooled.size() > MAX_PROOF_SIZE {
        return Err(Error::FileTooLarge("File too large. Maximum size is 5MB.".to_string()));
    }
    let content_type = validate_content_type(spooled.content_type.as_deref())?.to_string();

    let key = generate_object_key(spooled.file_name.as_deref());
    let body = spooled.into_bytes().await?;

    tracing::info!(operation = "upload_proof", key = %key, size = spooled.size(), content_type = %content_type, "Uploading proof");
    blobs.upload(&key, body, &content_type).await?;

    Ok(UploadedProof {
        message: "File uploaded successfully to cloud storage".to_string(),
        url: blobs.public_url(&key),
        file_name: key,
        file_size: spooled.size(),
        file_type: content_type,
    })
}

fn require_file_name(file_name: &str) -> Result<&str> {
    let file_name = file_name.trim_start_matches('/');
    if file_name.is_empty() {
        return Err(Error::MissingField("File name is required".to_string()));
    }
    if file_name.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidParameter("Invalid file name".to_string()));
    }
    Ok(file_name)
}

pub fn file_url(blobs: &dyn BlobStore, file_name: &str) -> Result<FileUrlResponse> {
    let file_name = require_file_name(file_name)?;
    Ok(FileUrlResponse {
        url: blobs.public_url(file_name),
        file_name: file_name.to_string(),
    })
}

pub async fn delete_file(blobs: &dyn BlobStore, file_name: &str) -> Result<FileDeletedResponse> {
    let file_name = require_file_name(file_name)?;
    blobs.remove(file_name).await?;
    tracing::info!(operation = "delete_file", file_name = %file_name, "File deleted");
    Ok(FileDeletedResponse {
        message: "File deleted successfully from cloud storage".to_string(),
        file_name: file_name.to_string(),
    })
}

pub async fn list_files(blobs: &dyn BlobStore) -> Result<FileListResponse> {
    let files = blobs.list(PROOF_PREFIX, LIST_LIMIT, 0).await?;
    Ok(FileListResponse {
        count: files.len(),
        files,
    })
}
