//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: decode and encode. Compression itself (codec internals) is
//! delegated to the backend; the size-limit search around it lives in
//! [`operations`](super::operations), which decodes a source once and
//! encodes it as many times as the search needs.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::EncodeParams;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Decode encoded bytes into pixels.
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resize, rotate and encode a decoded image as JPEG.
    fn encode(&self, img: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `decode` returns a blank image of `dimensions`. `encode` returns a
    /// zero-filled buffer whose length comes from `encoded_sizes` (front
    /// first); once exhausted it returns 1 byte.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Mutex<Option<(u32, u32)>>,
        pub encoded_sizes: Mutex<Vec<usize>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode,
        Encode {
            width: u32,
            height: u32,
            quality: u32,
            rotation: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Mutex::new(Some((width, height))),
                ..Self::default()
            }
        }

        pub fn with_encoded_sizes(self, sizes: Vec<usize>) -> Self {
            *self.encoded_sizes.lock().unwrap() = sizes;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, _data: &[u8]) -> Result<DynamicImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode);
            let (width, height) = self
                .dimensions
                .lock()
                .unwrap()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))?;
            Ok(DynamicImage::new_rgb8(width, height))
        }

        fn encode(&self, _img: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                rotation: params.rotation.degrees(),
            });
            let mut sizes = self.encoded_sizes.lock().unwrap();
            let len = if sizes.is_empty() { 1 } else { sizes.remove(0) };
            Ok(vec![0; len])
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_dimensions(80, 60);
        let img = backend.decode(&[]).unwrap();
        assert_eq!((img.width(), img.height()), (80, 60));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode]);
    }

    #[test]
    fn mock_decode_without_dimensions_fails() {
        assert!(MockBackend::new().decode(&[]).is_err());
    }

    #[test]
    fn mock_encode_pops_sizes_in_order() {
        let backend = MockBackend::new().with_encoded_sizes(vec![10, 5]);
        let params = EncodeParams {
            width: 4,
            height: 3,
            quality: super::super::params::Quality::new(70),
            rotation: super::super::params::Rotation::Quarter,
        };
        let img = DynamicImage::new_rgb8(4, 3);
        assert_eq!(backend.encode(&img, &params).unwrap().len(), 10);
        assert_eq!(backend.encode(&img, &params).unwrap().len(), 5);
        assert_eq!(backend.encode(&img, &params).unwrap().len(), 1);
        assert!(matches!(
            backend.get_operations()[0],
            RecordedOp::Encode {
                width: 4,
                height: 3,
                quality: 70,
                rotation: 90
            }
        ));
    }
}
