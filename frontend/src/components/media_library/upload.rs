//! Browser side of an upload: type check, compression in WASM, multipart body.

use common::jobs::JobStatus;
use common::model::media::UploadedMedia;
use common::upload::UploadPolicy;
use gloo_file::futures::read_as_bytes;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Array, Uint8Array};
use web_sys::{Blob, BlobPropertyBag, FormData};

use crate::api::{ApiClient, ApiError};

const POLL_INTERVAL_MS: u32 = 1500;
const MAX_POLLS: u32 = 80;

fn form_error(e: wasm_bindgen::JsValue) -> String {
    format!("Could not build the upload: {:?}", e)
}

fn multipart(bytes: &[u8], mime_type: &str, filename: &str, folder: &str) -> Result<FormData, String> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let bag = BlobPropertyBag::new();
    bag.set_type(mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &bag).map_err(form_error)?;
    let form = FormData::new().map_err(form_error)?;
    form.append_with_blob_and_filename("file", &blob, filename)
        .map_err(form_error)?;
    form.append_with_str("folder", folder).map_err(form_error)?;
    Ok(form)
}

/// Checks, shrinks and sends one file. Errors are already user-facing text.
pub async fn upload_file(
    client: &ApiClient,
    policy: UploadPolicy,
    file: gloo_file::File,
    folder: &str,
) -> Result<UploadedMedia, String> {
    let mime_type = file.raw_mime_type();
    policy.check_type(&mime_type).map_err(|e| e.to_string())?;
    let bytes = read_as_bytes(&file)
        .await
        .map_err(|e| format!("Could not read {}: {}", file.name(), e))?;
    let prepared = policy.prepare(bytes, &mime_type).map_err(|e| e.to_string())?;
    if prepared.compressed {
        gloo_console::log!(format!(
            "{}: {} -> {} bytes",
            file.name(),
            prepared.original_size,
            prepared.size()
        ));
    }
    let form = multipart(&prepared.bytes, &prepared.mime_type, &file.name(), folder)?;
    client.upload_media(form).await.map_err(|e| e.to_string())
}

/// Polls a job until it finishes or the poll budget runs out.
pub async fn wait_for_job(client: &ApiClient, job_id: &str) -> Result<JobStatus, ApiError> {
    for _ in 0..MAX_POLLS {
        TimeoutFuture::new(POLL_INTERVAL_MS).await;
        let status = client.job_status(job_id).await?;
        if status.is_finished() {
            return Ok(status);
        }
    }
    Ok(JobStatus::Failed("Analysis is taking too long".to_string()))
}
