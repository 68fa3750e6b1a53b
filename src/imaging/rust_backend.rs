//! `image` crate inspector.
//!
//! Only the header is read: `into_dimensions` stops after the decoder has
//! parsed the size, so large photos cost no more than small ones.

use super::backend::{BackendError, ImageInfo, ImageInspector};
use image::ImageReader;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct RustInspector;

impl RustInspector {
    pub fn new() -> Self {
        Self
    }
}

impl ImageInspector for RustInspector {
    fn inspect(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let filesize = fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unrecognized image format: {}", path.display()))
        })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(ImageInfo {
            width,
            height,
            mimetype: format.to_mime_type().to_string(),
            filesize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    #[test]
    fn inspects_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chart-300.png");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(12, 7);
        img.save(&path).unwrap();

        let info = RustInspector::new().inspect(&path).unwrap();
        assert_eq!(info.width, 12);
        assert_eq!(info.height, 7);
        assert_eq!(info.mimetype, "image/png");
        assert_eq!(info.filesize, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = RustInspector::new().inspect(&tmp.path().join("nope.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn garbage_file_is_processing_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        let result = RustInspector::new().inspect(&path);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }
}
