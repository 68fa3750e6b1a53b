//! Image inspection for feed media manifests.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Format sniffing** | `image::ImageReader::with_guessed_format` |
//! | **Dimensions** | `ImageReader::into_dimensions` (header only, no full decode) |
//! | **File size** | `std::fs::metadata` |
//!
//! The module is split into:
//! - **Backend**: [`ImageInspector`] trait, [`ImageInfo`] and [`BackendError`]
//! - **Rust backend**: [`RustInspector`], the `image` crate implementation

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, ImageInfo, ImageInspector};
pub use rust_backend::RustInspector;
