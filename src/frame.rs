//! Decoded frame buffers.
//!
//! Every frame in the crate is packed BGR24: three 8-bit channels per pixel
//! in blue, green, red order, rows separated by `stride` bytes.

use image::RgbImage;

use crate::error::StillframeError;

/// Bytes per BGR24 pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// A decoded BGR24 image plus the frame index it was read from.
///
/// Sources reuse their decode buffer between reads, so they only lend
/// frames out by reference. Anything that needs a frame past the next read
/// (the capture queue, a display) keeps its own clone.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    position_index: u64,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: self.data.clone(),
            position_index: self.position_index,
        }
    }

    // Reuse the existing allocation; the playback loop does this every frame.
    fn clone_from(&mut self, source: &Self) {
        self.width = source.width;
        self.height = source.height;
        self.stride = source.stride;
        self.data.clone_from(&source.data);
        self.position_index = source.position_index;
    }
}

impl Frame {
    /// Wrap a BGR24 buffer whose rows are `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::DecodeError`] if `stride` is shorter than a
    /// row or `data` is too small for `height` rows.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
        position_index: u64,
    ) -> Result<Self, StillframeError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if stride < row_bytes {
            return Err(StillframeError::DecodeError(format!(
                "stride {stride} is shorter than a {width}-pixel BGR24 row"
            )));
        }
        let needed = match height as usize {
            0 => 0,
            rows => stride * (rows - 1) + row_bytes,
        };
        if data.len() < needed {
            return Err(StillframeError::DecodeError(format!(
                "buffer holds {} bytes, {width}x{height} BGR24 needs {needed}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
            position_index,
        })
    }

    /// Wrap a tightly packed BGR24 buffer (`stride == width * 3`).
    pub fn from_packed_bgr(
        width: u32,
        height: u32,
        data: Vec<u8>,
        position_index: u64,
    ) -> Result<Self, StillframeError> {
        Self::new(
            width,
            height,
            width as usize * BYTES_PER_PIXEL,
            data,
            position_index,
        )
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw BGR24 bytes, including any row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Index of the frame in its video.
    pub fn position_index(&self) -> u64 {
        self.position_index
    }

    /// `true` when there is nothing to save: no pixels or no data.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// The pixels of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data
            .get(start..start + self.width as usize * BYTES_PER_PIXEL)
    }

    /// The `[b, g, r]` triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let offset = x as usize * BYTES_PER_PIXEL;
        Some([row[offset], row[offset + 1], row[offset + 2]])
    }

    /// Replace the contents of this frame from a possibly padded plane,
    /// keeping the existing allocation.
    ///
    /// Decoders call this to refill their reusable buffer.
    pub(crate) fn fill_from_plane(
        &mut self,
        plane: &[u8],
        plane_stride: usize,
        width: u32,
        height: u32,
        position_index: u64,
    ) {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        self.data.clear();
        if plane_stride == row_bytes {
            self.data
                .extend_from_slice(&plane[..row_bytes * height as usize]);
        } else {
            for row in 0..height as usize {
                let start = row * plane_stride;
                self.data.extend_from_slice(&plane[start..start + row_bytes]);
            }
        }
        self.width = width;
        self.height = height;
        self.stride = row_bytes;
        self.position_index = position_index;
    }

    /// Convert to an RGB image for encoding, dropping row padding.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::DecodeError`] for an empty frame.
    pub fn to_rgb_image(&self) -> Result<RgbImage, StillframeError> {
        if self.is_empty() {
            return Err(StillframeError::DecodeError(
                "cannot convert an empty frame".to_string(),
            ));
        }
        let mut buffer = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            let row = self.row(y).ok_or_else(|| {
                StillframeError::DecodeError(format!("frame is missing row {y}"))
            })?;
            for bgr in row.chunks_exact(BYTES_PER_PIXEL) {
                buffer.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
            }
        }
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            StillframeError::DecodeError(
                "Failed to construct RGB image from frame data".to_string(),
            )
        })
    }
}
