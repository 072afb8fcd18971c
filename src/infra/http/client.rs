use std::time::Duration;

use async_trait::async_trait;
use postdesk_api_types::{FileResponse, PostCreateRequest, PostResponse, PostUpdateRequest};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::ports::{
    ContentService, CreatePostParams, ServiceError, UpdatePostParams,
};
use crate::domain::entities::{PostRecord, StoredFile};
use crate::domain::types::{FileId, PostId};
use crate::domain::uploads::ImageUpload;
use crate::infra::error::InfraError;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// [`ContentService`] backed by the service's REST API.
#[derive(Clone, Debug)]
pub struct RemoteContentService {
    client: Client,
    base: Url,
    api_key: String,
}

impl RemoteContentService {
    pub fn new(base: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, InfraError> {
        if base.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "`{base}` cannot be used as a base URL"
            )));
        }
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("postdesk/", env!("CARGO_PKG_VERSION"))
    }

    fn auth_header(&self) -> Result<HeaderValue, InfraError> {
        HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|err| InfraError::configuration(format!("invalid api key: {err}")))
    }

    /// Build `<base>/api/v1/<segments..>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                InfraError::configuration(format!("`{}` cannot be used as a base URL", self.base))
            })?;
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, InfraError> {
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.auth_header()?))
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, InfraError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(InfraError::server(status.as_u16(), text));
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| InfraError::decode(format!("failed to parse body: {err}")))
    }

    /// Like [`Self::handle`], mapping `404` to `None`.
    async fn handle_optional<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, InfraError> {
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::handle(resp).await.map(Some)
    }

    async fn upload(&self, upload: &ImageUpload) -> Result<Option<StoredFile>, InfraError> {
        let url = self.endpoint(&["files"])?;
        let part = reqwest::multipart::Part::bytes(upload.data().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.content_type())?;
        let form = reqwest::multipart::Form::new().part("file", part);

        debug!(%url, file = upload.file_name(), bytes = upload.len(), "uploading file");
        let resp = self.request(Method::POST, url)?.multipart(form).send().await?;
        let file: Option<FileResponse> = Self::handle(resp).await?;
        Ok(file.map(StoredFile::try_from).transpose()?)
    }

    async fn delete(&self, id: &FileId) -> Result<(), InfraError> {
        let url = self.endpoint(&["files", id.as_str()])?;
        debug!(%url, "deleting file");
        let resp = self.request(Method::DELETE, url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(InfraError::server(status.as_u16(), text));
        }
        Ok(())
    }

    async fn fetch_post(&self, id: &PostId) -> Result<Option<PostRecord>, InfraError> {
        let url = self.endpoint(&["posts", id.as_str()])?;
        let resp = self.request(Method::GET, url)?.send().await?;
        let post: Option<PostResponse> = Self::handle_optional(resp).await?;
        Ok(post.map(PostRecord::try_from).transpose()?)
    }

    async fn create(&self, params: CreatePostParams) -> Result<PostRecord, InfraError> {
        let url = self.endpoint(&["posts"])?;
        let body = PostCreateRequest::from(params);
        debug!(%url, slug = %body.slug, "creating post");
        let resp = self.request(Method::POST, url)?.json(&body).send().await?;
        let post: PostResponse = Self::handle(resp).await?;
        Ok(PostRecord::try_from(post)?)
    }

    async fn update(
        &self,
        id: &PostId,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, InfraError> {
        let url = self.endpoint(&["posts", id.as_str()])?;
        let body = PostUpdateRequest::from(params);
        debug!(%url, replaces_image = body.featured_image.is_some(), "updating post");
        let resp = self.request(Method::PATCH, url)?.json(&body).send().await?;
        let post: Option<PostResponse> = Self::handle_optional(resp).await?;
        Ok(post.map(PostRecord::try_from).transpose()?)
    }
}

#[async_trait]
impl ContentService for RemoteContentService {
    async fn upload_file(&self, upload: &ImageUpload) -> Result<Option<StoredFile>, ServiceError> {
        Ok(self.upload(upload).await?)
    }

    async fn delete_file(&self, id: &FileId) -> Result<(), ServiceError> {
        Ok(self.delete(id).await?)
    }

    fn file_preview(&self, id: &FileId) -> Result<Url, ServiceError> {
        Ok(self.endpoint(&["files", id.as_str(), "preview"])?)
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<PostRecord>, ServiceError> {
        Ok(self.fetch_post(id).await?)
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, ServiceError> {
        Ok(self.create(params).await?)
    }

    async fn update_post(
        &self,
        id: &PostId,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, ServiceError> {
        Ok(self.update(id, params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> RemoteContentService {
        RemoteContentService::new(Url::parse(base).expect("url"), "key", Duration::from_secs(5))
            .expect("service")
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_ids() {
        let svc = service("https://content.example/backend/");
        let url = svc.endpoint(&["files", "a b/c"]).expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://content.example/backend/api/v1/files/a%20b%2Fc"
        );
    }

    #[test]
    fn endpoint_works_without_trailing_slash() {
        let svc = service("http://127.0.0.1:9000");
        let url = svc.endpoint(&["posts"]).expect("endpoint");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/api/v1/posts");
    }

    #[test]
    fn preview_url_is_built_locally() {
        let svc = service("https://content.example");
        let url = svc
            .file_preview(&FileId::new("file-1"))
            .expect("preview url");
        assert_eq!(url.as_str(), "https://content.example/api/v1/files/file-1/preview");
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = RemoteContentService::new(
            Url::parse("mailto:editor@example.com").expect("url"),
            "key",
            Duration::from_secs(5),
        )
        .expect_err("not a base");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }
}
