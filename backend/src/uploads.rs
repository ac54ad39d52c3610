//! Multipart image uploads shared by the media library and product images.

use actix_multipart::Multipart;
use actix_web::web;
use common::upload::{PreparedImage, UploadPolicy};
use futures_util::StreamExt;
use log::debug;

use crate::error::{ApiError, ApiResult};

/// The parts of an upload form this server understands.
#[derive(Debug)]
pub struct UploadForm {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub folder: Option<String>,
}

/// Reads the `file` and optional `folder` fields.
///
/// The file's type is checked against `policy` as soon as its headers arrive,
/// before any of its bytes are read. `max_bytes` bounds the raw upload.
pub async fn read_form(
    mut payload: Multipart,
    policy: &UploadPolicy,
    max_bytes: usize,
) -> ApiResult<UploadForm> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut folder = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .filter(|mime| mime != "application/octet-stream")
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&filename)
                            .first_or_octet_stream()
                            .essence_str()
                            .to_string()
                    });
                policy.check_type(&content_type)?;

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk?;
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "Uploads are limited to {} MB",
                            max_bytes / (1024 * 1024)
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((filename, content_type, bytes));
            }
            Some("folder") => {
                let mut value = Vec::new();
                while let Some(chunk) = field.next().await {
                    value.extend_from_slice(&chunk?);
                }
                folder = Some(String::from_utf8_lossy(&value).trim().to_string())
                    .filter(|f| !f.is_empty());
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    Ok(UploadForm {
        filename,
        content_type,
        bytes,
        folder,
    })
}

/// Downloads an image for the media library's URL import. The response must
/// declare an `image/*` content type; the policy check still runs on it.
pub async fn fetch_image(
    url: &str,
    folder: Option<String>,
    policy: &UploadPolicy,
    max_bytes: usize,
) -> ApiResult<UploadForm> {
    let mut response = reqwest::get(url)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Could not fetch {}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(ApiError::BadRequest(format!(
            "Fetching {} returned {}",
            url,
            response.status()
        )));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest("URL does not point to an image".to_string()));
    }
    policy.check_type(&content_type)?;

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "Uploads are limited to {} MB",
                max_bytes / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    debug!("Fetched {} bytes from {}", bytes.len(), url);

    let filename = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_string();
    Ok(UploadForm {
        filename,
        content_type,
        bytes,
        folder,
    })
}

/// Runs the compression pipeline on the blocking pool.
pub async fn prepare(
    policy: UploadPolicy,
    bytes: Vec<u8>,
    content_type: String,
) -> ApiResult<PreparedImage> {
    Ok(web::block(move || policy.prepare(bytes, &content_type)).await??)
}
