/// Errors raised when building an image from raw parts.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("invalid grayscale buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    Dimensions { width: usize, height: usize },
}

/// Borrowed view over a row-major 8-bit grayscale buffer.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(x, y)`; `None` outside the image.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }
}

/// Owned row-major 8-bit grayscale image.
#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Build an image from raw parts, validating that the buffer length
    /// matches `width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        let Some(expected) = width.checked_mul(height) else {
            return Err(ImageError::Dimensions { width, height });
        };
        if data.len() != expected {
            return Err(ImageError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_accepts_matching_buffer() {
        let img = GrayImage::from_raw(3, 2, vec![0, 1, 2, 3, 4, 5]).expect("valid buffer");
        assert_eq!(img.len(), 6);
        let view = img.view();
        assert_eq!(view.pixel(2, 1), Some(5));
        assert_eq!(view.pixel(3, 0), None);
        assert_eq!(view.pixel(0, 2), None);
    }

    #[test]
    fn from_raw_rejects_short_buffer() {
        let err = GrayImage::from_raw(4, 4, vec![0u8; 15]).unwrap_err();
        match err {
            ImageError::BufferLength { expected, got } => {
                assert_eq!(expected, 16);
                assert_eq!(got, 15);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_raw_rejects_overflowing_dimensions() {
        let err = GrayImage::from_raw(usize::MAX, 2, Vec::new()).unwrap_err();
        assert!(matches!(err, ImageError::Dimensions { .. }));
    }

    #[test]
    fn empty_image_is_allowed() {
        let img = GrayImage::from_raw(0, 5, Vec::new()).expect("zero-width image");
        assert!(img.is_empty());
        assert!(img.view().is_empty());
    }
}
