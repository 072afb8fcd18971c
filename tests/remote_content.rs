#![deny(clippy::all, clippy::pedantic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use httpmock::MockServer;
use postdesk::application::error::{FailureKind, SubmissionError};
use postdesk::application::form::{FormEvent, PostForm};
use postdesk::application::ports::{
    ContentService, CreatePostParams, ErrorReporter, Navigator, ServiceError, UpdatePostParams,
};
use postdesk::application::submission::{
    PostSubmissionService, SubmissionOutcome, SubmissionPolicy,
};
use postdesk::domain::types::{AuthenticatedUser, FileId, PostId, PostStatus};
use postdesk::domain::uploads::ImageUpload;
use postdesk::infra::http::RemoteContentService;
use serde_json::json;
use url::Url;

const API_KEY: &str = "test-key";
const BEARER: &str = "Bearer test-key";

const GIF_1X1: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

fn client(server: &MockServer) -> RemoteContentService {
    let base = Url::parse(&server.base_url()).expect("base url");
    RemoteContentService::new(base, API_KEY, Duration::from_secs(5)).expect("client")
}

fn gif(name: &str) -> ImageUpload {
    ImageUpload::new(name, GIF_1X1.to_vec()).expect("valid gif")
}

fn post_json(id: &str, slug: &str, image: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Hello World",
        "slug": slug,
        "content": "<p>body</p>",
        "status": "active",
        "featured_image": image,
        "user_id": "user-1",
        "created_at": "2026-01-02T03:04:05Z",
        "updated_at": null
    })
}

#[derive(Default)]
struct RecordingNavigator(Mutex<Vec<String>>);

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        self.0.lock().expect("lock").push(path.to_string());
    }
}

#[derive(Default)]
struct RecordingReporter(Mutex<Vec<FailureKind>>);

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &SubmissionError) {
        self.0.lock().expect("lock").push(error.kind());
    }
}

#[tokio::test]
async fn upload_sends_multipart_with_bearer_auth() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST")
                .path("/api/v1/files")
                .header("authorization", BEARER);
            then.status(201).json_body(json!({
                "id": "file-1",
                "name": "cover.gif",
                "content_type": "image/gif",
                "size_bytes": 43
            }));
        })
        .await;

    let file = client(&server)
        .upload_file(&gif("cover.gif"))
        .await
        .expect("upload")
        .expect("file stored");

    assert_eq!(file.id, FileId::new("file-1"));
    assert_eq!(file.content_type, "image/gif");
    assert_eq!(file.size_bytes, 43);
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_with_null_body_yields_no_file() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("POST").path("/api/v1/files");
            then.status(200).json_body(json!(null));
        })
        .await;

    let file = client(&server)
        .upload_file(&gif("cover.gif"))
        .await
        .expect("upload");
    assert!(file.is_none());
}

#[tokio::test]
async fn create_post_sends_exact_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST")
                .path("/api/v1/posts")
                .header("authorization", BEARER)
                .json_body(json!({
                    "title": "Hello World",
                    "slug": "hello-world",
                    "content": "<p>body</p>",
                    "status": "active",
                    "featured_image": "file-1",
                    "user_id": "user-1"
                }));
            then.status(201)
                .json_body(post_json("post-1", "hello-world", "file-1"));
        })
        .await;

    let post = client(&server)
        .create_post(CreatePostParams {
            title: "Hello World".into(),
            slug: "hello-world".into(),
            content: "<p>body</p>".into(),
            status: PostStatus::Active,
            featured_image: FileId::new("file-1"),
            user_id: "user-1".into(),
        })
        .await
        .expect("create");

    assert_eq!(post.id, PostId::new("post-1"));
    assert!(post.created_at.is_some());
    assert!(post.updated_at.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn update_without_image_omits_featured_image() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("PATCH")
                .path("/api/v1/posts/post-1")
                .json_body(json!({
                    "title": "Hello World",
                    "slug": "hello-world",
                    "content": "<p>body</p>",
                    "status": "inactive"
                }));
            then.status(200)
                .json_body(post_json("post-1", "hello-world", "file-1"));
        })
        .await;

    let updated = client(&server)
        .update_post(
            &PostId::new("post-1"),
            UpdatePostParams {
                title: "Hello World".into(),
                slug: "hello-world".into(),
                content: "<p>body</p>".into(),
                status: PostStatus::Inactive,
                featured_image: None,
            },
        )
        .await
        .expect("update");

    assert!(updated.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_posts_map_to_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/v1/posts/gone");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("PATCH").path("/api/v1/posts/gone");
            then.status(404);
        })
        .await;

    let svc = client(&server);
    let id = PostId::new("gone");
    assert!(svc.get_post(&id).await.expect("get").is_none());

    let updated = svc
        .update_post(
            &id,
            UpdatePostParams {
                title: "t".into(),
                slug: "t".into(),
                content: String::new(),
                status: PostStatus::Active,
                featured_image: None,
            },
        )
        .await
        .expect("update");
    assert!(updated.is_none());
}

#[tokio::test]
async fn server_errors_map_to_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("DELETE").path("/api/v1/files/file-1");
            then.status(500).body("boom");
        })
        .await;

    let err = client(&server)
        .delete_file(&FileId::new("file-1"))
        .await
        .expect_err("delete fails");

    match err {
        ServiceError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_maps_to_protocol_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/v1/posts/post-1");
            then.status(200).body("not json");
        })
        .await;

    let err = client(&server)
        .get_post(&PostId::new("post-1"))
        .await
        .expect_err("decode fails");
    assert!(matches!(err, ServiceError::Protocol(_)));
}

fn workflow(
    server: &MockServer,
    policy: SubmissionPolicy,
) -> (
    PostSubmissionService,
    Arc<RecordingNavigator>,
    Arc<RecordingReporter>,
) {
    let navigator = Arc::new(RecordingNavigator::default());
    let reporter = Arc::new(RecordingReporter::default());
    let service = PostSubmissionService::new(
        Arc::new(client(server)),
        navigator.clone(),
        reporter.clone(),
        policy,
    );
    (service, navigator, reporter)
}

#[tokio::test]
async fn edit_with_new_image_replaces_the_stored_file() {
    let server = MockServer::start_async().await;
    let fetch = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/v1/posts/post-1");
            then.status(200)
                .json_body(post_json("post-1", "hello-world", "file-old"));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method("POST").path("/api/v1/files");
            then.status(201).json_body(json!({
                "id": "file-new",
                "name": "next.gif",
                "content_type": "image/gif",
                "size_bytes": 43
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method("DELETE").path("/api/v1/files/file-old");
            then.status(204);
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method("PATCH")
                .path("/api/v1/posts/post-1")
                .json_body(json!({
                    "title": "Hello Again",
                    "slug": "hello-again",
                    "content": "<p>body</p>",
                    "status": "active",
                    "featured_image": "file-new"
                }));
            then.status(200)
                .json_body(post_json("post-1", "hello-again", "file-new"));
        })
        .await;

    let (service, navigator, reporter) = workflow(&server, SubmissionPolicy::Corrected);
    let post = service
        .content()
        .get_post(&PostId::new("post-1"))
        .await
        .expect("fetch")
        .expect("post exists");

    let mut form = PostForm::edit(post);
    form.apply(FormEvent::TitleChanged("Hello Again".into()));
    form.apply(FormEvent::ImageSelected(Some(gif("next.gif"))));

    let outcome = service
        .submit(&mut form, &AuthenticatedUser::new("user-1"))
        .await;

    assert!(matches!(outcome, SubmissionOutcome::Navigated { .. }));
    assert_eq!(*navigator.0.lock().expect("lock"), vec!["/post/post-1"]);
    assert!(reporter.0.lock().expect("lock").is_empty());
    assert!(!form.is_loading());
    fetch.assert_async().await;
    upload.assert_async().await;
    delete.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn failed_create_discards_the_uploaded_file() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("POST").path("/api/v1/files");
            then.status(201).json_body(json!({
                "id": "file-1",
                "name": "cover.gif",
                "content_type": "image/gif",
                "size_bytes": 43
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method("POST").path("/api/v1/posts");
            then.status(409).body("slug taken");
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method("DELETE").path("/api/v1/files/file-1");
            then.status(204);
        })
        .await;

    let (service, navigator, reporter) = workflow(&server, SubmissionPolicy::Corrected);
    let mut form = PostForm::create();
    form.apply(FormEvent::TitleChanged("Hello World".into()));
    form.apply(FormEvent::ImageSelected(Some(gif("cover.gif"))));

    let outcome = service
        .submit(&mut form, &AuthenticatedUser::new("user-1"))
        .await;

    match outcome {
        SubmissionOutcome::Failed(error) => {
            assert_eq!(error.kind(), FailureKind::Create);
            assert!(error.user_message().contains("slug taken"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(navigator.0.lock().expect("lock").is_empty());
    assert_eq!(*reporter.0.lock().expect("lock"), vec![FailureKind::Create]);
    assert!(!form.is_loading());
    create.assert_calls_async(1).await;
    delete.assert_calls_async(1).await;
}

#[tokio::test]
async fn legacy_update_failure_stalls_silently() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/v1/posts/post-1");
            then.status(200)
                .json_body(post_json("post-1", "hello-world", "file-old"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("PATCH").path("/api/v1/posts/post-1");
            then.status(500).body("unavailable");
        })
        .await;

    let (service, navigator, reporter) = workflow(&server, SubmissionPolicy::Legacy);
    let post = service
        .content()
        .get_post(&PostId::new("post-1"))
        .await
        .expect("fetch")
        .expect("post exists");
    let mut form = PostForm::edit(post);

    let outcome = service
        .submit(&mut form, &AuthenticatedUser::new("user-1"))
        .await;

    assert!(matches!(outcome, SubmissionOutcome::Stalled));
    assert!(navigator.0.lock().expect("lock").is_empty());
    assert!(reporter.0.lock().expect("lock").is_empty());
    assert!(form.is_loading());
}
