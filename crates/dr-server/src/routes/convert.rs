//! DWG to DXF conversion endpoint.

use std::fmt::Write as _;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use dr_convert::{ConversionRequest, ConvertedFile};
use dr_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Preferred name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// POST /api/dwg2dxf
///
/// Accepts one uploaded `.dwg` file and answers with the converted DXF bytes
/// as an attachment.
pub async fn dwg2dxf(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let with_id = |e: Error| AppError::new(e).with_request_id(request_id.0.clone());

    let multipart = multipart.map_err(|rejection| {
        with_id(Error::BadInput(format!(
            "Expected a multipart upload: {}",
            rejection.body_text()
        )))
    })?;

    let request = read_upload(multipart).await.map_err(with_id)?;
    tracing::info!(
        filename = %request.filename,
        bytes = request.input.len(),
        "Received conversion upload"
    );

    let file = ctx.runner.run(request).await.map_err(with_id)?;
    file_response(file).map_err(with_id)
}

/// Pull the upload out of the multipart body.
///
/// The field named [`FILE_FIELD`] wins; otherwise the first part that carries
/// a filename is used.
async fn read_upload(mut multipart: Multipart) -> dr_core::Result<ConversionRequest> {
    let mut fallback: Option<ConversionRequest> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file_field = field.name() == Some(FILE_FIELD);
        let filename = field.file_name().map(str::to_owned);

        if !is_file_field && (filename.is_none() || fallback.is_some()) {
            continue;
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        let request = ConversionRequest::new(filename.unwrap_or_default(), data);

        if is_file_field {
            return Ok(request);
        }
        fallback = Some(request);
    }

    fallback.ok_or_else(|| Error::BadInput("No file was uploaded".into()))
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge("The uploaded file is too large".into())
    } else {
        Error::BadInput(format!("Malformed multipart upload: {}", e.body_text()))
    }
}

fn file_response(file: ConvertedFile) -> dr_core::Result<Response> {
    let disposition = HeaderValue::from_str(&content_disposition(&file.filename))
        .map_err(|e| Error::Internal(format!("invalid Content-Disposition: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// Build an `attachment` disposition. Non-ASCII names get an ASCII fallback
/// plus an RFC 5987 `filename*` parameter.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if filename.is_ascii() && fallback == filename {
        return format!("attachment; filename=\"{fallback}\"");
    }

    let mut encoded = String::with_capacity(filename.len() * 3);
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
