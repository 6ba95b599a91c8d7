//! Upload-and-verify endpoint.
//!
//! Reads the `file` field, decodes it off the async runtime, then runs the
//! blocking model call under the concurrency limiter. The response body is
//! always an `UploadOutcome` once the image has decoded.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::extraction::load_document_image;
use crate::pipeline::UploadOutcome;

/// Multipart field carrying the document photo.
pub const FILE_FIELD: &str = "file";

/// Response header echoing the outcome's request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP status for each outcome. Verdicts are successful responses even when
/// the document is rejected.
pub fn status_for(outcome: &UploadOutcome) -> StatusCode {
    match outcome {
        UploadOutcome::Verified(_) | UploadOutcome::Rejected(_) => StatusCode::OK,
        UploadOutcome::Unstructured { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        UploadOutcome::SystemError { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// `POST /api/verify`
pub async fn verify(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<UploadOutcome>), ApiError> {
    let request_id = Uuid::new_v4();
    let bytes = read_file_field(&mut multipart, ctx.max_upload_bytes).await?;
    tracing::info!(%request_id, size = bytes.len(), "Upload received");

    let image = tokio::task::spawn_blocking(move || load_document_image(bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("image decode task failed: {e}")))??;

    let permit = ctx
        .limiter
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::Internal(format!("concurrency limiter closed: {e}")))?;

    // The permit lives with the blocking call; a dropped request must not free
    // the slot while the model call is still running.
    let pipeline = ctx.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        pipeline.process(request_id, &image)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?;

    let request_header = [(REQUEST_ID_HEADER, outcome.request_id().to_string())];
    Ok((status_for(&outcome), request_header, Json(outcome)))
}

/// Pull the first `file` field out of the form, ignoring any others.
async fn read_file_field(multipart: &mut Multipart, limit_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let mut file: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e, limit_bytes)),
        };

        if file.is_some() || field.name() != Some(FILE_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit_bytes))?;
        file = Some(bytes.to_vec());
    }

    let bytes = file.ok_or_else(|| ApiError::BadRequest("No file provided.".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty.".into()));
    }
    if bytes.len() > limit_bytes {
        return Err(ApiError::PayloadTooLarge { limit_bytes });
    }
    Ok(bytes)
}

fn multipart_error(err: MultipartError, limit_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit_bytes }
    } else {
        tracing::warn!("Failed to read upload: {}", err.body_text());
        ApiError::BadRequest("Failed to read file data.".into())
    }
}
