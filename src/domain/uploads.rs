//! Featured-image payloads and the formats the post form accepts.

use std::fmt;

use bytes::Bytes;
use imagesize::ImageType;

use crate::domain::error::DomainError;

/// Image formats accepted for a featured image (png, jpg/jpeg, gif).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect the format from the leading bytes of the file.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match imagesize::image_type(data).ok()? {
            ImageType::Png => Some(ImageFormat::Png),
            ImageType::Jpeg => Some(ImageFormat::Jpeg),
            ImageType::Gif => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// A file picked for upload, already checked to be a supported image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: String,
    format: ImageFormat,
    data: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Result<Self, DomainError> {
        let file_name = file_name.into();
        let data = data.into();

        if file_name.trim().is_empty() {
            return Err(DomainError::validation("image file name is empty"));
        }
        if data.is_empty() {
            return Err(DomainError::validation(format!("`{file_name}` is empty")));
        }

        let format = ImageFormat::sniff(&data).ok_or_else(|| {
            DomainError::validation(format!(
                "`{file_name}` is not a png, jpeg or gif image"
            ))
        })?;

        Ok(Self {
            file_name,
            format,
            data,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pixel dimensions, when the header is complete enough to read them.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        imagesize::blob_size(&self.data)
            .ok()
            .map(|size| (size.width, size.height))
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{GIF_1X1, PNG_2X3};
    use super::*;

    #[test]
    fn accepts_gif_and_reports_dimensions() {
        let upload = ImageUpload::new("pixel.gif", GIF_1X1).expect("gif accepted");
        assert_eq!(upload.format(), ImageFormat::Gif);
        assert_eq!(upload.content_type(), "image/gif");
        assert_eq!(upload.dimensions(), Some((1, 1)));
    }

    #[test]
    fn detects_png_regardless_of_file_name() {
        let upload = ImageUpload::new("cover.jpg", PNG_2X3).expect("png accepted");
        assert_eq!(upload.format(), ImageFormat::Png);
        assert_eq!(upload.dimensions(), Some((2, 3)));
    }

    #[test]
    fn rejects_non_image_payloads() {
        let err = ImageUpload::new("notes.txt", &b"just some text"[..]).expect_err("rejected");
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn rejects_empty_payloads() {
        let err = ImageUpload::new("empty.png", Bytes::new()).expect_err("rejected");
        assert!(err.to_string().contains("empty"));
    }
}
