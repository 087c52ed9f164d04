//! Camera frame samples

/// Bytes per pixel of a packed RGB buffer.
pub const RGB_CHANNELS: usize = 3;

/// One camera frame as delivered by the frame source
///
/// Pixels are row-major packed RGB (3 bytes per pixel, no row padding).
/// The capture scheduler keeps a single sample alive and refills it every
/// cycle; it is only reallocated when the source dimensions change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Row-major RGB pixel data
    pub pixels: Vec<u8>,

    /// Capture timestamp in milliseconds, as reported by the source
    pub timestamp_ms: u64,
}

impl FrameSample {
    /// Create a sample from an existing pixel buffer
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, timestamp_ms: u64) -> Self {
        Self { width, height, pixels, timestamp_ms }
    }

    /// Allocate a zeroed buffer sized for `width` x `height`
    pub fn blank(width: u32, height: u32) -> Self {
        let len = Self::expected_len(width, height);
        Self { width, height, pixels: vec![0; len], timestamp_ms: 0 }
    }

    /// Buffer length required for the given dimensions
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * RGB_CHANNELS
    }

    /// Whether the sample has the given dimensions
    pub fn has_dimensions(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}
