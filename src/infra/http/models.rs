//! Conversions between workflow types and the service's wire types.

use postdesk_api_types::{FileResponse, PostCreateRequest, PostResponse, PostUpdateRequest};

use crate::application::ports::{CreatePostParams, UpdatePostParams};
use crate::domain::entities::{PostRecord, StoredFile};
use crate::domain::error::DomainError;
use crate::domain::types::{FileId, PostId};

impl From<CreatePostParams> for PostCreateRequest {
    fn from(params: CreatePostParams) -> Self {
        Self {
            title: params.title,
            slug: params.slug,
            content: params.content,
            status: params.status,
            featured_image: params.featured_image.as_str().to_string(),
            user_id: params.user_id,
        }
    }
}

impl From<UpdatePostParams> for PostUpdateRequest {
    fn from(params: UpdatePostParams) -> Self {
        Self {
            title: params.title,
            slug: params.slug,
            content: params.content,
            status: params.status,
            featured_image: params.featured_image.map(|id| id.as_str().to_string()),
        }
    }
}

impl TryFrom<PostResponse> for PostRecord {
    type Error = DomainError;

    fn try_from(response: PostResponse) -> Result<Self, Self::Error> {
        if response.id.trim().is_empty() {
            return Err(DomainError::invariant("post response carries an empty id"));
        }
        if response.featured_image.trim().is_empty() {
            return Err(DomainError::invariant(format!(
                "post `{}` has no featured image",
                response.id
            )));
        }

        Ok(Self {
            id: PostId::new(response.id),
            title: response.title,
            slug: response.slug,
            content: response.content,
            status: response.status,
            featured_image: FileId::new(response.featured_image),
            user_id: response.user_id,
            created_at: response.created_at,
            updated_at: response.updated_at,
        })
    }
}

impl TryFrom<FileResponse> for StoredFile {
    type Error = DomainError;

    fn try_from(response: FileResponse) -> Result<Self, Self::Error> {
        if response.id.trim().is_empty() {
            return Err(DomainError::invariant("file response carries an empty id"));
        }

        Ok(Self {
            id: FileId::new(response.id),
            name: response.name,
            content_type: response.content_type,
            size_bytes: response.size_bytes,
        })
    }
}
