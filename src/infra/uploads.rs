//! Reading featured images from disk.

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::domain::uploads::ImageUpload;

use super::error::InfraError;

/// Load an image file and check that it is a png, jpeg or gif.
///
/// The format comes from the file contents. A mismatching extension is
/// logged but not rejected.
pub async fn load_image(path: &Path) -> Result<ImageUpload, InfraError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| InfraError::input(format!("`{}` has no usable file name", path.display())))?
        .to_string();

    let data = fs::read(path).await?;
    let upload = ImageUpload::new(file_name, data)?;

    if let Some(guessed) = mime_guess::from_path(path).first()
        && guessed.essence_str() != upload.content_type()
    {
        warn!(
            file = %path.display(),
            extension_type = guessed.essence_str(),
            detected_type = upload.content_type(),
            "image extension does not match its contents"
        );
    }

    debug!(
        file = upload.file_name(),
        bytes = upload.len(),
        dimensions = ?upload.dimensions(),
        "featured image loaded"
    );
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{Builder, NamedTempFile};

    use super::*;
    use crate::domain::uploads::ImageFormat;
    use crate::domain::uploads::fixtures::GIF_1X1;

    fn tmp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().expect("tmp file");
        file.write_all(contents).expect("write tmp");
        file
    }

    #[tokio::test]
    async fn loads_gif_from_disk() {
        let file = tmp_file(".gif", GIF_1X1);
        let upload = load_image(file.path()).await.expect("gif loads");

        assert_eq!(upload.format(), ImageFormat::Gif);
        assert!(upload.file_name().ends_with(".gif"));
    }

    #[tokio::test]
    async fn content_wins_over_extension() {
        let file = tmp_file(".png", GIF_1X1);
        let upload = load_image(file.path()).await.expect("gif loads");
        assert_eq!(upload.content_type(), "image/gif");
    }

    #[tokio::test]
    async fn rejects_text_files() {
        let file = tmp_file(".txt", b"hello");
        let err = load_image(file.path()).await.expect_err("not an image");
        assert!(matches!(err, InfraError::Domain(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = load_image(Path::new("/definitely/not/here.png"))
            .await
            .expect_err("missing");
        assert!(matches!(err, InfraError::Io(_)));
    }
}
