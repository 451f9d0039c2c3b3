//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the CertChain API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CertChain API",
        description = "Issues certificate records, returns their content hash for on-chain anchoring, and resolves hashes back to records.\n\nThe hash is SHA-256 over a domain-separated, length-prefixed encoding of the record fields, so equal records always produce equal hashes.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server"),
    ),
    paths(
        crate::routes::certificates::upload_certificate,
        crate::routes::certificates::create_record,
        crate::routes::certificates::get_certificate,
        crate::routes::certificates::verify_certificate,
    ),
    components(
        schemas(
            crate::routes::certificates::CertificateUploadForm,
            crate::routes::certificates::CreateRecordRequest,
            crate::routes::certificates::SubmitResponse,
            crate::routes::certificates::CertificateView,
            crate::routes::certificates::CertificateResponse,
            crate::routes::certificates::VerifyResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "certificates", description = "Certificate issuance, resolution, and verification"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_certificate_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/certificates",
            "/api/records",
            "/api/certificates/{hash}",
            "/api/certificates/{hash}/verify",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn document_registers_error_body_schema() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("ErrorBody"));
        assert!(schemas.contains_key("CertificateView"));
    }

    #[test]
    fn document_serializes_to_json() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("CertChain API"));
    }

    #[test]
    fn router_builds() {
        let _router = router();
    }
}
