//! # Certificate API
//!
//! Issuance (multipart upload or JSON with pre-stored blob refs),
//! resolution by content hash, and integrity verification.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use certchain_core::{BlobKind, BlobRef, ContentHash, RecordFields, ValidationError};
use certchain_registry::{ResolvedRecord, Verification};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blobs::BlobError;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

// -- DTOs ---------------------------------------------------------------------

/// Multipart form accepted by `POST /api/certificates`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateUploadForm {
    pub name: String,
    pub course_name: String,
    pub institute_name: String,
    /// Certificate document, `application/pdf`.
    #[schema(value_type = String, format = Binary)]
    pub pdf: Vec<u8>,
    /// Student photo, `image/*`.
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
}

/// Submission with blobs that were uploaded earlier.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub name: Option<String>,
    pub course_name: Option<String>,
    pub institute_name: Option<String>,
    pub pdf_ref: Option<String>,
    pub photo_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub success: bool,
    /// 64 lowercase hex characters; commit this on-chain.
    pub hash: String,
}

/// A resolved certificate.
///
/// `pdfFilename` and `photoFilename` repeat the refs under the names older
/// clients read.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    pub hash: String,
    pub name: String,
    pub course_name: String,
    pub institute_name: String,
    pub pdf_ref: String,
    pub photo_ref: String,
    pub pdf_filename: String,
    pub photo_filename: String,
    /// ISO 8601 UTC with milliseconds.
    pub created_at: String,
    pub pdf_url: String,
    pub photo_url: String,
}

impl From<ResolvedRecord> for CertificateView {
    fn from(resolved: ResolvedRecord) -> Self {
        let record = resolved.record;
        Self {
            hash: resolved.hash.to_hex(),
            name: record.name().to_string(),
            course_name: record.course_name().to_string(),
            institute_name: record.institute_name().to_string(),
            pdf_ref: record.pdf_ref().to_string(),
            photo_ref: record.photo_ref().to_string(),
            pdf_filename: record.pdf_ref().to_string(),
            photo_filename: record.photo_ref().to_string(),
            created_at: record.created_at().to_canonical_string(),
            pdf_url: resolved.pdf_url,
            photo_url: resolved.photo_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CertificateResponse {
    pub success: bool,
    pub certificate: CertificateView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub hash: String,
    /// Whether the stored record still hashes to `hash`.
    pub intact: bool,
    pub recomputed: String,
}

/// Build the certificates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/certificates", post(upload_certificate))
        .route("/api/records", post(create_record))
        .route("/api/certificates/:hash", get(get_certificate))
        .route("/api/certificates/:hash/verify", get(verify_certificate))
}

// -- Handlers -----------------------------------------------------------------

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// POST /api/certificates: Upload the PDF and photo, then issue the record.
///
/// Presence of both files and all text fields is checked before anything
/// is written. Blobs are removed again if the record is rejected.
#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body(content = CertificateUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Certificate issued", body = SubmitResponse),
        (status = 400, description = "Malformed multipart body", body = crate::error::ErrorBody),
        (status = 413, description = "File too large", body = crate::error::ErrorBody),
        (status = 422, description = "Missing or invalid field or file", body = crate::error::ErrorBody),
        (status = 500, description = "Record could not be stored", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn upload_certificate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut fields = RecordFields::default();
    let mut pdf: Option<Upload> = None;
    let mut photo: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "pdf" | "photo" => {
                let upload = Upload {
                    file_name: field.file_name().map(str::to_string),
                    content_type: field.content_type().map(str::to_string),
                    bytes: field.bytes().await?,
                };
                if name == "pdf" {
                    pdf = Some(upload);
                } else {
                    photo = Some(upload);
                }
            }
            "name" => fields.name = Some(field.text().await?),
            "courseName" => fields.course_name = Some(field.text().await?),
            "instituteName" => fields.institute_name = Some(field.text().await?),
            _ => {}
        }
    }

    let (pdf, photo) = match (pdf, photo) {
        (Some(pdf), Some(photo)) => (pdf, photo),
        (pdf, photo) => {
            let kinds = [(BlobKind::Pdf, pdf.is_none()), (BlobKind::Photo, photo.is_none())]
                .into_iter()
                .filter_map(|(kind, missing)| missing.then_some(kind))
                .collect();
            return Err(ValidationError::MissingBlobRef { kinds }.into());
        }
    };
    fields.validate()?;
    state
        .blobs
        .check(BlobKind::Pdf, pdf.content_type.as_deref(), pdf.bytes.len())?;
    state
        .blobs
        .check(BlobKind::Photo, photo.content_type.as_deref(), photo.bytes.len())?;

    let blobs = state.blobs.clone();
    let (pdf_ref, photo_ref) = tokio::task::spawn_blocking(move || -> Result<(BlobRef, BlobRef), BlobError> {
        let pdf_ref = blobs.store(
            BlobKind::Pdf,
            pdf.file_name.as_deref(),
            pdf.content_type.as_deref(),
            &pdf.bytes,
        )?;
        match blobs.store(
            BlobKind::Photo,
            photo.file_name.as_deref(),
            photo.content_type.as_deref(),
            &photo.bytes,
        ) {
            Ok(photo_ref) => Ok((pdf_ref, photo_ref)),
            Err(e) => {
                blobs.remove(&pdf_ref);
                Err(e)
            }
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("blob write task failed: {e}")))??;

    match state
        .service
        .submit(&fields, Some(pdf_ref.as_str()), Some(photo_ref.as_str()))
        .await
    {
        Ok(hash) => Ok(Json(SubmitResponse {
            success: true,
            hash: hash.to_hex(),
        })),
        Err(e) => {
            // No error leaves a record behind, timeouts included.
            state.blobs.remove(&pdf_ref);
            state.blobs.remove(&photo_ref);
            Err(e.into())
        }
    }
}

/// POST /api/records: Issue a record for blobs already in the blob store.
#[utoipa::path(
    post,
    path = "/api/records",
    request_body = CreateRecordRequest,
    responses(
        (status = 200, description = "Certificate issued", body = SubmitResponse),
        (status = 400, description = "Malformed JSON", body = crate::error::ErrorBody),
        (status = 422, description = "Missing field or unknown blob", body = crate::error::ErrorBody),
        (status = 500, description = "Record could not be stored", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let req = extract_json(body)?;
    let fields = RecordFields {
        name: req.name,
        course_name: req.course_name,
        institute_name: req.institute_name,
    };
    let record = state
        .service
        .prepare(&fields, req.pdf_ref.as_deref(), req.photo_ref.as_deref())?;

    for (kind, blob) in [
        (BlobKind::Pdf, record.pdf_ref()),
        (BlobKind::Photo, record.photo_ref()),
    ] {
        if !state.blobs.exists(blob) {
            return Err(ValidationError::InvalidBlobRef {
                kind,
                value: blob.to_string(),
                reason: "no such blob".to_string(),
            }
            .into());
        }
    }

    let hash = state.service.commit(record).await?;
    Ok(Json(SubmitResponse {
        success: true,
        hash: hash.to_hex(),
    }))
}

/// GET /api/certificates/:hash: Resolve a content hash to its certificate.
#[utoipa::path(
    get,
    path = "/api/certificates/{hash}",
    params(("hash" = String, Path, description = "64-character hex content hash")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateResponse),
        (status = 400, description = "Malformed hash", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn get_certificate(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<CertificateResponse>, AppError> {
    let hash = ContentHash::parse(&hash)?;
    let resolved = state
        .service
        .resolve(&hash)
        .ok_or_else(|| AppError::NotFound(format!("certificate {hash}")))?;
    Ok(Json(CertificateResponse {
        success: true,
        certificate: resolved.into(),
    }))
}

/// GET /api/certificates/:hash/verify: Re-hash the stored record.
#[utoipa::path(
    get,
    path = "/api/certificates/{hash}/verify",
    params(("hash" = String, Path, description = "64-character hex content hash")),
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse),
        (status = 400, description = "Malformed hash", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn verify_certificate(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<VerifyResponse>, AppError> {
    let hash = ContentHash::parse(&hash)?;
    let (intact, recomputed) = match state.service.verify(&hash) {
        Verification::Intact => (true, hash),
        Verification::Mismatch { recomputed } => (false, recomputed),
        Verification::NotFound => {
            return Err(AppError::NotFound(format!("certificate {hash}")));
        }
    };
    Ok(Json(VerifyResponse {
        hash: hash.to_hex(),
        intact,
        recomputed: recomputed.to_hex(),
    }))
}
