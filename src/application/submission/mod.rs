//! Create-vs-update submission workflow for the post form.
//!
//! A submit attempt holds the form's loading flag through a
//! [`LoadingGuard`](crate::application::lifecycle::LoadingGuard). Under
//! [`SubmissionPolicy::Corrected`] the guard is released on every exit and
//! every failure reaches the [`ErrorReporter`]. [`SubmissionPolicy::Legacy`]
//! keeps the older behavior: only create failures are reported, and the
//! other failure paths leave the form loading.

use std::str::FromStr;
use std::sync::Arc;

use metrics::counter;
use serde::Deserialize;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::application::error::{FailureKind, SubmissionError};
use crate::application::form::{PostFields, PostForm, SubmissionRequest, SubmissionTarget};
use crate::application::lifecycle::LoadingGuard;
use crate::application::ports::{
    ContentService, CreatePostParams, ErrorReporter, Navigator, ServiceError, UpdatePostParams,
    post_detail_path,
};
use crate::domain::entities::{PostRecord, StoredFile};
use crate::domain::types::{AuthenticatedUser, FileId, PostId};
use crate::domain::uploads::ImageUpload;


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPolicy {
    #[default]
    Corrected,
    Legacy,
}

impl SubmissionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionPolicy::Corrected => "corrected",
            SubmissionPolicy::Legacy => "legacy",
        }
    }

    fn reports(self, kind: FailureKind) -> bool {
        match self {
            SubmissionPolicy::Corrected => true,
            SubmissionPolicy::Legacy => kind == FailureKind::Create,
        }
    }

    fn releases_on_failure(self, kind: FailureKind) -> bool {
        match self {
            SubmissionPolicy::Corrected => true,
            SubmissionPolicy::Legacy => kind == FailureKind::Create,
        }
    }
}

impl FromStr for SubmissionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "corrected" => Ok(SubmissionPolicy::Corrected),
            "legacy" => Ok(SubmissionPolicy::Legacy),
            other => Err(format!(
                "unknown submission policy `{other}` (expected corrected|legacy)"
            )),
        }
    }
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// The post was stored and the navigator sent to its detail view.
    Navigated { post_id: PostId, path: String },
    Failed(SubmissionError),
    /// Legacy silent failure: nothing reported, form left loading.
    Stalled,
    /// A submission for this form was already in flight.
    Ignored,
}

impl SubmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionOutcome::Navigated { .. } => "navigated",
            SubmissionOutcome::Failed(_) => "failed",
            SubmissionOutcome::Stalled => "stalled",
            SubmissionOutcome::Ignored => "ignored",
        }
    }
}

#[derive(Clone)]
pub struct PostSubmissionService {
    content: Arc<dyn ContentService>,
    navigator: Arc<dyn Navigator>,
    reporter: Arc<dyn ErrorReporter>,
    policy: SubmissionPolicy,
}

impl PostSubmissionService {
    pub fn new(
        content: Arc<dyn ContentService>,
        navigator: Arc<dyn Navigator>,
        reporter: Arc<dyn ErrorReporter>,
        policy: SubmissionPolicy,
    ) -> Self {
        Self {
            content,
            navigator,
            reporter,
            policy,
        }
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    pub fn content(&self) -> &Arc<dyn ContentService> {
        &self.content
    }

    /// Validate the form and run the matching procedure.
    pub async fn submit(&self, form: &mut PostForm, user: &AuthenticatedUser) -> SubmissionOutcome {
        if form.is_loading() {
            debug!("submit ignored while a submission is in flight");
            return record(form.mode().as_str(), SubmissionOutcome::Ignored);
        }

        match form.prepare_submission() {
            Ok(request) => self.run(request, user).await,
            Err(errors) => {
                let error = SubmissionError::Validation(errors);
                if self.policy.reports(error.kind()) {
                    self.reporter.report(&error);
                }
                record(form.mode().as_str(), SubmissionOutcome::Failed(error))
            }
        }
    }

    /// Run an already validated request. The request is detached from its
    /// form, so this may outlive it.
    pub async fn run(&self, request: SubmissionRequest, user: &AuthenticatedUser) -> SubmissionOutcome {
        let SubmissionRequest {
            fields,
            target,
            lifecycle,
        } = request;
        let mode = target.mode_str();

        let Some(guard) = lifecycle.try_begin() else {
            debug!(mode, "submission already in flight or form unmounted");
            return record(mode, SubmissionOutcome::Ignored);
        };

        let span = info_span!(
            "post_submission",
            submission_id = %Uuid::new_v4(),
            mode,
            policy = self.policy.as_str(),
        );

        let outcome = async move {
            match target {
                SubmissionTarget::Create { image } => {
                    self.create(fields, image, user, guard).await
                }
                SubmissionTarget::Edit { post, image } => {
                    self.update(fields, post, image, guard).await
                }
            }
        }
        .instrument(span)
        .await;

        record(mode, outcome)
    }

    async fn create(
        &self,
        fields: PostFields,
        image: ImageUpload,
        user: &AuthenticatedUser,
        guard: LoadingGuard,
    ) -> SubmissionOutcome {
        let file = match self.upload(&image).await {
            Ok(Some(file)) => file,
            Ok(None) => return self.settle(SubmissionError::UploadEmpty, guard, None).await,
            Err(source) => {
                return self
                    .settle(SubmissionError::Upload(source), guard, None)
                    .await;
            }
        };

        let params = CreatePostParams {
            title: fields.title,
            slug: fields.slug,
            content: fields.content,
            status: fields.status,
            featured_image: file.id.clone(),
            user_id: user.id.clone(),
        };

        match self.content.create_post(params).await {
            Ok(post) => {
                info!(post_id = %post.id, slug = %post.slug, "post created");
                guard.release();
                self.navigate(post.id)
            }
            Err(source) => {
                self.settle(SubmissionError::Create(source), guard, Some(file.id))
                    .await
            }
        }
    }

    async fn update(
        &self,
        fields: PostFields,
        post: PostRecord,
        image: Option<ImageUpload>,
        guard: LoadingGuard,
    ) -> SubmissionOutcome {
        let candidate = match image {
            Some(image) => match self.upload(&image).await {
                Ok(Some(file)) => Some(file.id),
                Ok(None) if self.policy == SubmissionPolicy::Legacy => None,
                Ok(None) => return self.settle(SubmissionError::UploadEmpty, guard, None).await,
                Err(source) => {
                    return self
                        .settle(SubmissionError::Upload(source), guard, None)
                        .await;
                }
            },
            None => None,
        };

        // The replacement is stored, so the previous asset can go.
        if candidate.is_some() {
            self.discard(&post.featured_image).await;
        }

        let params = UpdatePostParams {
            title: fields.title,
            slug: fields.slug,
            content: fields.content,
            status: fields.status,
            featured_image: candidate.clone(),
        };

        match self.content.update_post(&post.id, params).await {
            Ok(Some(updated)) => {
                info!(post_id = %updated.id, slug = %updated.slug, "post updated");
                guard.release();
                self.navigate(post.id)
            }
            Ok(None) => {
                let error = SubmissionError::UpdateMissing { post_id: post.id };
                self.settle(error, guard, candidate).await
            }
            Err(source) => {
                let error = SubmissionError::Update {
                    post_id: post.id,
                    source,
                };
                self.settle(error, guard, candidate).await
            }
        }
    }

    /// Finish a failed attempt according to the policy. `orphan` is a file
    /// this attempt uploaded that no post will reference.
    async fn settle(
        &self,
        error: SubmissionError,
        guard: LoadingGuard,
        orphan: Option<FileId>,
    ) -> SubmissionOutcome {
        let kind = error.kind();

        if self.policy == SubmissionPolicy::Corrected
            && let Some(file_id) = orphan
        {
            self.discard(&file_id).await;
        }

        if self.policy.reports(kind) {
            error!(kind = kind.as_str(), error = %error.user_message(), "post submission failed");
            self.reporter.report(&error);
        } else {
            warn!(kind = kind.as_str(), error = %error.user_message(), "post submission failure not reported");
        }

        if self.policy.releases_on_failure(kind) {
            guard.release();
            SubmissionOutcome::Failed(error)
        } else {
            guard.leak();
            SubmissionOutcome::Stalled
        }
    }

    async fn upload(&self, image: &ImageUpload) -> Result<Option<StoredFile>, ServiceError> {
        let result = self.content.upload_file(image).await;
        if let Ok(Some(file)) = &result {
            counter!("postdesk_upload_bytes_total").increment(file.size_bytes);
            debug!(file_id = %file.id, name = %file.name, "featured image uploaded");
        }
        result
    }

    /// Best-effort delete; a failure leaves the file orphaned and is only logged.
    async fn discard(&self, file_id: &FileId) {
        if let Err(err) = self.content.delete_file(file_id).await {
            warn!(file_id = %file_id, error = %err, "failed to delete file; it is now orphaned");
            counter!("postdesk_asset_delete_failed_total").increment(1);
        }
    }

    fn navigate(&self, post_id: PostId) -> SubmissionOutcome {
        let path = post_detail_path(&post_id);
        self.navigator.navigate_to(&path);
        SubmissionOutcome::Navigated { post_id, path }
    }
}

fn record(mode: &'static str, outcome: SubmissionOutcome) -> SubmissionOutcome {
    counter!("postdesk_submission_total", "mode" => mode, "outcome" => outcome.as_str())
        .increment(1);
    outcome
}
