//! Route handlers.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Form, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};

use super::session::{session_cookie, SessionContext};
use super::{pages, AppState};
use crate::error::{Error, RejectReason, Result};
use crate::record::Draft;
use crate::upload::{IncomingUpload, MAX_UPLOAD_BYTES};

/// Name of the multipart field carrying the image.
const PHOTO_FIELD: &str = "photo";

pub(super) async fn questionnaire_page() -> Html<String> {
    Html(pages::questionnaire())
}

pub(super) async fn submit_questionnaire(
    State(state): State<AppState>,
    session: SessionContext,
    Form(draft): Form<Draft>,
) -> Response {
    let (id, is_new) = session.id_or_new();
    state.drafts().put(id, draft);
    debug!("Stored questionnaire for session {id}");

    let mut response = Redirect::to("/upload").into_response();
    if is_new {
        match session_cookie(state.cookie_name(), id) {
            Some(cookie) => {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            None => warn!("Cookie name {:?} is not usable", state.cookie_name()),
        }
    }
    response
}

pub(super) async fn upload_page(session: SessionContext) -> Response {
    if session.draft.is_none() {
        return Redirect::to("/").into_response();
    }
    Html(pages::upload()).into_response()
}

pub(super) async fn submit_photo(
    State(state): State<AppState>,
    session: SessionContext,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let (Some(id), Some(draft)) = (session.id, session.draft) else {
        debug!("Upload without a draft, sending back to the questionnaire");
        return Ok(Redirect::to("/").into_response());
    };

    if declared_length(&headers).is_some_and(|len| len > MAX_UPLOAD_BYTES) {
        return Err(Error::PayloadTooLarge {
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }

    let mut multipart = multipart.map_err(|e| Error::malformed_upload(e.body_text()))?;
    let upload = read_photo(&mut multipart).await?;

    let intake = state.intake().clone();
    let record = tokio::task::spawn_blocking(move || intake.accept(&draft, &upload))
        .await
        .map_err(|e| Error::internal(format!("upload task failed: {e}")))??;

    state.drafts().clear(id);
    info!("Session {id} contributed {}", record.filename);
    Ok(Redirect::to("/thankyou").into_response())
}

pub(super) async fn thank_you(State(state): State<AppState>) -> Result<Html<String>> {
    let intake = state.intake().clone();
    let count = tokio::task::spawn_blocking(move || intake.contribution_count())
        .await
        .map_err(|e| Error::internal(format!("count task failed: {e}")))??;
    Ok(Html(pages::thank_you(count)))
}

pub(super) async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Read the first `photo` file field from the body.
///
/// Fields with other names, and `photo` fields without a filename, are
/// skipped the way a form parser ignores non-file parts.
async fn read_photo(multipart: &mut Multipart) -> Result<IncomingUpload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(IncomingUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(RejectReason::MissingFile.into())
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload exceeded {MAX_UPLOAD_BYTES} bytes");
        return Error::PayloadTooLarge {
            limit_bytes: MAX_UPLOAD_BYTES,
        };
    }
    Error::malformed_upload(e.body_text())
}
