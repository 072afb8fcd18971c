//! Post form state and its reducer.
//!
//! Every mutation goes through [`PostFormState::apply`]. A title change
//! re-derives the slug. A slug edit is normalized through the same rule
//! and never writes back into the title.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::application::lifecycle::FormLifecycle;
use crate::domain::entities::PostRecord;
use crate::domain::slug::slug_transform;
use crate::domain::types::PostStatus;
use crate::domain::uploads::ImageUpload;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormState {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub image: Option<ImageUpload>,
}

impl PostFormState {
    /// Seed the form from a stored post. The image field starts empty; the
    /// stored featured image stays attached unless a new one is picked.
    pub fn from_post(post: &PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            status: post.status,
            image: None,
        }
    }

    /// Apply one input event and return the fields whose values changed.
    pub fn apply(&mut self, event: FormEvent) -> Vec<FormField> {
        match event {
            FormEvent::TitleChanged(title) => {
                self.slug = slug_transform(&title);
                self.title = title;
                vec![FormField::Title, FormField::Slug]
            }
            FormEvent::SlugChanged(slug) => {
                self.slug = slug_transform(&slug);
                vec![FormField::Slug]
            }
            FormEvent::ContentChanged(content) => {
                self.content = content;
                vec![FormField::Content]
            }
            FormEvent::StatusChanged(status) => {
                self.status = status;
                vec![FormField::Status]
            }
            FormEvent::ImageSelected(image) => {
                self.image = image;
                vec![FormField::Image]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    TitleChanged(String),
    SlugChanged(String),
    ContentChanged(String),
    StatusChanged(PostStatus),
    ImageSelected(Option<ImageUpload>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Title,
    Slug,
    Content,
    Status,
    Image,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Slug => "slug",
            FormField::Content => "content",
            FormField::Status => "status",
            FormField::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, FieldError>);

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: FormField) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    fn set(&mut self, field: FormField, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.0.insert(field, error);
            }
            None => {
                self.0.remove(&field);
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields().map(FormField::as_str).collect();
        write!(f, "required fields missing: {}", names.join(", "))
    }
}

/// Create mode has no backing post; edit mode carries the post being changed.
#[derive(Debug, Clone, Copy)]
pub enum FormMode<'a> {
    Create,
    Edit(&'a PostRecord),
}

impl FormMode<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::Create => "create",
            FormMode::Edit(_) => "edit",
        }
    }
}

/// Field values that passed validation, ready to hand to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
}

/// What a submit attempt works against, detached from the form so it can
/// outlive it.
#[derive(Debug, Clone)]
pub enum SubmissionTarget {
    Create { image: ImageUpload },
    Edit {
        post: PostRecord,
        image: Option<ImageUpload>,
    },
}

impl SubmissionTarget {
    pub fn mode_str(&self) -> &'static str {
        match self {
            SubmissionTarget::Create { .. } => "create",
            SubmissionTarget::Edit { .. } => "edit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub fields: PostFields,
    pub target: SubmissionTarget,
    pub lifecycle: Arc<FormLifecycle>,
}

#[derive(Debug)]
pub struct PostForm {
    state: PostFormState,
    existing: Option<PostRecord>,
    errors: FieldErrors,
    lifecycle: Arc<FormLifecycle>,
}

impl PostForm {
    pub fn create() -> Self {
        Self {
            state: PostFormState::default(),
            existing: None,
            errors: FieldErrors::default(),
            lifecycle: FormLifecycle::new(),
        }
    }

    pub fn edit(post: PostRecord) -> Self {
        Self {
            state: PostFormState::from_post(&post),
            existing: Some(post),
            errors: FieldErrors::default(),
            lifecycle: FormLifecycle::new(),
        }
    }

    pub fn mode(&self) -> FormMode<'_> {
        match &self.existing {
            Some(post) => FormMode::Edit(post),
            None => FormMode::Create,
        }
    }

    pub fn state(&self) -> &PostFormState {
        &self.state
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn lifecycle(&self) -> Arc<FormLifecycle> {
        Arc::clone(&self.lifecycle)
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle.is_loading()
    }

    /// Mark the form as torn down. Submissions still in flight keep running
    /// but no longer touch its loading flag.
    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }

    /// Apply an input event. The slug is re-validated whenever it changes;
    /// other fields are re-validated once they have shown an error.
    pub fn apply(&mut self, event: FormEvent) {
        for field in self.state.apply(event) {
            if field == FormField::Slug || self.errors.get(field).is_some() {
                let error = self.check(field);
                self.errors.set(field, error);
            }
        }
    }

    /// Validate every field and, when all pass, detach a request the
    /// workflow can run.
    pub fn prepare_submission(&mut self) -> Result<SubmissionRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        for field in [
            FormField::Title,
            FormField::Slug,
            FormField::Content,
            FormField::Status,
            FormField::Image,
        ] {
            errors.set(field, self.check(field));
        }
        self.errors = errors.clone();

        if !errors.is_empty() {
            return Err(errors);
        }

        let target = match (&self.existing, &self.state.image) {
            (Some(post), image) => SubmissionTarget::Edit {
                post: post.clone(),
                image: image.clone(),
            },
            (None, Some(image)) => SubmissionTarget::Create {
                image: image.clone(),
            },
            (None, None) => {
                let mut errors = FieldErrors::default();
                errors.set(FormField::Image, Some(FieldError::Required));
                return Err(errors);
            }
        };

        Ok(SubmissionRequest {
            fields: PostFields {
                title: self.state.title.clone(),
                slug: self.state.slug.clone(),
                content: self.state.content.clone(),
                status: self.state.status,
            },
            target,
            lifecycle: self.lifecycle(),
        })
    }

    fn check(&self, field: FormField) -> Option<FieldError> {
        let missing = match field {
            FormField::Title => self.state.title.trim().is_empty(),
            FormField::Slug => self.state.slug.is_empty(),
            FormField::Content | FormField::Status => false,
            FormField::Image => self.existing.is_none() && self.state.image.is_none(),
        };
        missing.then_some(FieldError::Required)
    }
}
