/// Shorts handlers - encoding webhook and shorts lookup
use actix_web::{web, HttpResponse};

use crate::error::{AppError, Result};
use crate::models::{CallbackOutcome, EncodingCallback, ShortsResponse};
use crate::services::ShortsService;

/// Encoding provider webhook.
///
/// Unrecognized statuses are logged and still acknowledged with 200 so the
/// provider does not keep retrying them. Parse and storage errors answer
/// non-2xx, which lets the provider's own retry policy kick in.
pub async fn encoding_callback(
    service: web::Data<ShortsService>,
    req: web::Json<EncodingCallback>,
) -> Result<HttpResponse> {
    let callback = req.into_inner();
    let outcome = service
        .process_encoding_callback(&callback)
        .await
        .map_err(|err| {
            tracing::warn!(file_path = %callback.file_path, error = %err, "Rejected encoding callback");
            err
        })?;

    if let CallbackOutcome::UnrecognizedStatus(status) = &outcome {
        tracing::error!(
            file_path = %callback.file_path,
            %status,
            "Undefined encoding callback status"
        );
    }

    Ok(HttpResponse::Ok().finish())
}

/// Get the shorts record for an upload key
pub async fn get_shorts(
    service: web::Data<ShortsService>,
    upload_key: web::Path<String>,
) -> Result<HttpResponse> {
    let shorts = service
        .find_by_upload_key(&upload_key)
        .await?
        .ok_or_else(|| AppError::NotFound("Shorts not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ShortsResponse::from(shorts)))
}
