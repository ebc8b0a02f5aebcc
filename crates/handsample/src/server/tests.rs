use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::*;
use crate::error::RejectReason;
use crate::upload::UploadPolicy;

const BOUNDARY: &str = "handsample-test-boundary";

struct TestApp {
    _dir: tempfile::TempDir,
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let intake = Intake::open(dir.path(), UploadPolicy::default()).unwrap();
        let state = AppState::new(intake, DraftStore::new(Duration::from_secs(60)), "sid");
        let router = router(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    fn count(&self) -> usize {
        self.state.intake().contribution_count().unwrap()
    }

    fn files(&self) -> usize {
        self.state.intake().uploads().file_count().unwrap()
    }

    /// Submit the questionnaire and return the session cookie.
    async fn answer(&self, answers: &str) -> String {
        let response = self
            .send(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(answers.to_string()))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/upload");

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("new session should get a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A multipart body with a single file part.
fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(cookie: Option<&str>, body: Vec<u8>, with_length: bool) -> Request<Body> {
    let mut builder = Request::post("/upload").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if with_length {
        builder = builder.header(header::CONTENT_LENGTH, body.len());
    }
    builder.body(Body::from(body)).unwrap()
}

const ANSWERS: &str = "writing_style=cursive&handedness=right&age_group=18-25&gender=female";

#[test]
fn test_error_status_codes() {
    let cases = [
        (
            Error::UploadRejected(RejectReason::MissingFile),
            StatusCode::BAD_REQUEST,
        ),
        (Error::malformed_upload("x"), StatusCode::BAD_REQUEST),
        (
            Error::PayloadTooLarge {
                limit_bytes: MAX_UPLOAD_BYTES,
            },
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
        (
            Error::UploadSave {
                path: "/x".into(),
                source: std::io::Error::other("disk full"),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (err, status) in cases {
        assert_eq!(err.into_response().status(), status);
    }
}

#[test]
fn test_app_state_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = Some(dir.path().to_path_buf());
    config.session.cookie_name = "hs".to_string();

    let state = AppState::from_config(&config).unwrap();
    assert_eq!(state.cookie_name(), "hs");
    assert!(state.drafts().is_empty());
    assert_eq!(
        state.intake().store().path(),
        dir.path().join("metadata.json")
    );
}

#[tokio::test]
async fn test_draft_sweeper_drops_idle_drafts() {
    let drafts = Arc::new(DraftStore::new(Duration::from_millis(50)));
    drafts.put(crate::SessionId::new(), crate::Draft::default());
    drafts.put(crate::SessionId::new(), crate::Draft::default());

    let sweeper = spawn_draft_sweeper(Arc::clone(&drafts), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(300)).await;
    sweeper.abort();

    assert!(drafts.is_empty());
}

#[tokio::test]
async fn test_questionnaire_page() {
    let app = TestApp::new();
    let response = app.send(Request::get("/").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"writing_style\""));
}

#[tokio::test]
async fn test_healthz() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/healthz").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_upload_page_requires_draft() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/upload").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = app.answer(ANSWERS).await;
    let response = app
        .send(
            Request::get("/upload")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"photo\""));
}

#[tokio::test]
async fn test_full_contribution() {
    let app = TestApp::new();
    let before = app.count();
    let cookie = app.answer(ANSWERS).await;

    let image = vec![0xAB; 2 * 1024 * 1024];
    let body = multipart_body("photo", "sample.jpg", "image/jpeg", &image);
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/thankyou");

    assert_eq!(app.count(), before + 1);
    let records = app.state.intake().store().load().unwrap();
    let record = records.last().unwrap();
    assert_eq!(record.answers.writing_style, "cursive");
    assert_eq!(record.answers.handedness, "right");
    assert_eq!(record.answers.age_group, "18-25");
    assert_eq!(record.answers.gender, "female");
    assert_eq!(record.original_name, "sample.jpg");

    let saved = std::fs::read(app.state.intake().uploads().path_for(&record.filename)).unwrap();
    assert_eq!(saved.len(), image.len());

    // The draft is merged, so the session starts over.
    assert!(app.state.drafts().is_empty());

    let response = app
        .send(Request::get("/thankyou").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains(&format!("<strong id=\"count\">{}</strong>", before + 1)));
}

#[tokio::test]
async fn test_upload_without_draft_persists_nothing() {
    let app = TestApp::new();
    let body = multipart_body("photo", "sample.png", "image/png", b"png");

    let response = app.send(upload_request(None, body, true)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(app.count(), 0);
    assert_eq!(app.files(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::new();
    let cookie = app.answer(ANSWERS).await;
    let image = vec![0; 7 * 1024 * 1024];

    for with_length in [true, false] {
        let body = multipart_body("photo", "big.jpg", "image/jpeg", &image);
        let response = app
            .send(upload_request(Some(&cookie), body, with_length))
            .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_text(response).await,
            "Uploaded file is too large (max 6MB)"
        );
    }

    assert_eq!(app.count(), 0);
    assert_eq!(app.files(), 0);
}

#[tokio::test]
async fn test_disallowed_type_then_retry() {
    let app = TestApp::new();
    let cookie = app.answer(ANSWERS).await;

    let body = multipart_body("photo", "notes.txt", "text/plain", b"hello");
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "File type not allowed");
    assert_eq!(app.files(), 0);

    // The draft survives a rejected upload.
    let body = multipart_body("photo", "page.png", "image/png", b"png");
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.count(), 1);
}

#[tokio::test]
async fn test_missing_photo_field() {
    let app = TestApp::new();
    let cookie = app.answer(ANSWERS).await;

    let body = multipart_body("document", "page.png", "image/png", b"png");
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file uploaded");
    assert_eq!(app.count(), 0);
}

#[tokio::test]
async fn test_empty_filename() {
    let app = TestApp::new();
    let cookie = app.answer(ANSWERS).await;

    let body = multipart_body("photo", "", "application/octet-stream", b"");
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No selected file");
}

#[tokio::test]
async fn test_resubmitting_questionnaire_keeps_session() {
    let app = TestApp::new();
    let cookie = app.answer(ANSWERS).await;

    let response = app
        .send(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::COOKIE, &cookie)
                .body(Body::from("writing_style=print"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(app.state.drafts().len(), 1);

    let body = multipart_body("photo", "page.jpeg", "image/jpeg", b"jpg");
    let response = app
        .send(upload_request(Some(&cookie), body, true))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let records = app.state.intake().store().load().unwrap();
    assert_eq!(records[0].answers.writing_style, "print");
    assert_eq!(records[0].answers.handedness, "");
}
