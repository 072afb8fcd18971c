//! Traits describing the collaborators the submission workflow calls.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::application::error::SubmissionError;
use crate::domain::entities::{PostRecord, StoredFile};
use crate::domain::types::{FileId, PostId, PostStatus};
use crate::domain::uploads::ImageUpload;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ServiceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn protocol(err: impl std::fmt::Display) -> Self {
        Self::Protocol(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub featured_image: FileId,
    pub user_id: String,
}

/// Partial update. `featured_image: None` leaves the attached file as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePostParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub featured_image: Option<FileId>,
}

#[async_trait]
pub trait ContentService: Send + Sync {
    /// Store a binary asset. `Ok(None)` means the service accepted the call
    /// but produced no file.
    async fn upload_file(&self, upload: &ImageUpload) -> Result<Option<StoredFile>, ServiceError>;

    async fn delete_file(&self, id: &FileId) -> Result<(), ServiceError>;

    fn file_preview(&self, id: &FileId) -> Result<Url, ServiceError>;

    async fn get_post(&self, id: &PostId) -> Result<Option<PostRecord>, ServiceError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, ServiceError>;

    /// `Ok(None)` when the post no longer exists.
    async fn update_post(
        &self,
        id: &PostId,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, ServiceError>;
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &SubmissionError);
}

/// Route of a post's detail view.
pub fn post_detail_path(id: &PostId) -> String {
    format!("/post/{id}")
}
