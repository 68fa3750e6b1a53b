//! Image inspection trait and shared types.
//!
//! Feed enclosures need four facts about each referenced image: width,
//! height, MIME type and byte size. The [`ImageInspector`] trait is the seam
//! between the rewrite passes and whatever reads those facts from disk.
//!
//! The production implementation is
//! [`RustInspector`](super::rust_backend::RustInspector).

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Facts about one image file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mimetype: String,
    pub filesize: u64,
}

/// Reads [`ImageInfo`] for a path.
///
/// Implementations must be stateless from the caller's point of view: the
/// same inspector is shared across the ingestion thread pool.
pub trait ImageInspector: Sync {
    fn inspect(&self, path: &Path) -> Result<ImageInfo, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock inspector answering from a filename → info table.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockInspector {
        pub answers: HashMap<String, ImageInfo>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockInspector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer for any path whose file name is `filename`.
        pub fn with_image(mut self, filename: &str, width: u32, height: u32) -> Self {
            self.answers.insert(
                filename.to_string(),
                ImageInfo {
                    width,
                    height,
                    mimetype: "image/png".to_string(),
                    filesize: u64::from(width * height),
                },
            );
            self
        }

        pub fn get_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageInspector for MockInspector {
        fn inspect(&self, path: &Path) -> Result<ImageInfo, BackendError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.calls.lock().unwrap().push(name.clone());
            self.answers
                .get(&name)
                .cloned()
                .ok_or_else(|| BackendError::ProcessingFailed(format!("no mock answer for {name}")))
        }
    }

    #[test]
    fn mock_answers_known_file() {
        let inspector = MockInspector::new().with_image("cat.png", 40, 30);
        let info = inspector.inspect(Path::new("/site/images/cat.png")).unwrap();
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(info.filesize, 1200);
        assert_eq!(inspector.get_calls(), vec!["cat.png"]);
    }

    #[test]
    fn mock_fails_unknown_file() {
        let inspector = MockInspector::new();
        let err = inspector.inspect(Path::new("dog.png")).unwrap_err();
        assert!(matches!(err, BackendError::ProcessingFailed(_)));
    }
}
