use std::error::Error as StdError;

use thiserror::Error;

use crate::application::form::FieldErrors;
use crate::application::ports::ServiceError;
use crate::domain::types::PostId;

/// The four ways a submit attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Upload,
    Create,
    Update,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Upload => "upload",
            FailureKind::Create => "create",
            FailureKind::Update => "update",
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("post form is incomplete: {0}")]
    Validation(FieldErrors),
    #[error("featured image upload failed")]
    Upload(#[source] ServiceError),
    #[error("featured image upload returned no file")]
    UploadEmpty,
    #[error("post could not be created")]
    Create(#[source] ServiceError),
    #[error("post `{post_id}` could not be updated")]
    Update {
        post_id: PostId,
        #[source]
        source: ServiceError,
    },
    #[error("post `{post_id}` no longer exists")]
    UpdateMissing { post_id: PostId },
}

impl SubmissionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmissionError::Validation(_) => FailureKind::Validation,
            SubmissionError::Upload(_) | SubmissionError::UploadEmpty => FailureKind::Upload,
            SubmissionError::Create(_) => FailureKind::Create,
            SubmissionError::Update { .. } | SubmissionError::UpdateMissing { .. } => {
                FailureKind::Update
            }
        }
    }

    /// Message for the user: the error followed by each of its causes.
    pub fn user_message(&self) -> String {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages.join(": ")
    }
}
