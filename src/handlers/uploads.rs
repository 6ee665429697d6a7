//! Proof upload and bucket file handlers

use std::path::Path as FsPath;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};

use super::log_handler_error;
use crate::{
    error::{Error, Result},
    middleware::auth::AuthenticatedUser,
    models::files::{FileDeletedResponse, FileListResponse, FileUrlResponse, UploadedProof},
    services::uploads::{self, SpooledFile},
    state::AppState,
};

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::FileTooLarge("File too large. Maximum size is 5MB.".to_string())
    } else {
        Error::InvalidParameter(e.body_text())
    }
}

/// Streams the single `file` part into a temp file held in `slot`.
///
/// Other parts are skipped. The caller owns cleanup of whatever ends up in
/// `slot`, including on error.
async fn receive_proof(
    upload_dir: &FsPath,
    multipart: &mut Multipart,
    slot: &mut Option<SpooledFile>,
) -> Result<()> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if slot.is_some() {
            return Err(Error::InvalidParameter(
                "Only one file may be uploaded".to_string(),
            ));
        }

        let spooled = slot.insert(
            SpooledFile::create(
                upload_dir,
                field.file_name().map(str::to_string),
                field.content_type().map(str::to_string),
            )
            .await?,
        );

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            spooled.append(&chunk).await?;
        }
    }
    Ok(())
}

/// Reads and discards the rest of a rejected body so the client gets the
/// error response rather than a reset connection. Bounded by the body limit.
async fn drain(multipart: &mut Multipart) {
    while let Ok(Some(mut field)) = multipart.next_field().await {
        while let Ok(Some(_)) = field.chunk().await {}
    }
}

/// POST /api/upload-proof
///
/// Multipart upload with exactly one `file` part: a JPEG, PNG or WebP image
/// of at most 5 MiB. Every rejection happens before the bucket is written,
/// and the temp file is removed whatever the outcome.
///
/// # Returns
/// `{message, url, file_name, file_size, file_type}`
pub async fn upload_proof(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedProof>> {
    let mut multipart = multipart.map_err(|e| Error::InvalidParameter(e.body_text()))?;
    let upload_dir = FsPath::new(&state.config.server.upload_dir);

    let mut slot = None;
    let result = match receive_proof(upload_dir, &mut multipart, &mut slot).await {
        Ok(()) => match slot.as_mut() {
            Some(spooled) => uploads::store_proof(state.blobs.admin.as_ref(), spooled).await,
            None => Err(Error::MissingField("No file uploaded".to_string())),
        },
        Err(e) => {
            drain(&mut multipart).await;
            Err(e)
        }
    };

    if let Some(spooled) = slot {
        spooled.remove().await;
    }

    let uploaded = result.inspect_err(|e| log_handler_error("upload_proof", e))?;
    tracing::info!(operation = "upload_proof", user_id = %user.id, file_name = %uploaded.file_name, "Proof uploaded");
    Ok(Json(uploaded))
}

/// GET /api/file/{*file_name}
///
/// Public URL of an object; the object itself is not checked.
pub async fn get_file_url(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<FileUrlResponse>> {
    let response = uploads::file_url(state.blobs.anon.as_ref(), &file_name)
        .inspect_err(|e| log_handler_error("get_file_url", e))?;
    Ok(Json(response))
}

/// DELETE /api/file/{*file_name}
pub async fn delete_file(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<FileDeletedResponse>> {
    tracing::info!(operation = "delete_file", user_id = %user.id, file_name = %file_name, "Deleting file");
    let response = uploads::delete_file(state.blobs.admin.as_ref(), &file_name)
        .await
        .inspect_err(|e| log_handler_error("delete_file", e))?;
    Ok(Json(response))
}

/// GET /api/files
///
/// First 100 objects under the proof prefix.
pub async fn list_files(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>> {
    let response = uploads::list_files(state.blobs.anon.as_ref())
        .await
        .inspect_err(|e| log_handler_error("list_files", e))?;
    Ok(Json(response))
}
