//! Raw camera frames and still-photo encoding.

use image::codecs::jpeg::JpegEncoder;

use super::MediaError;

/// One raw RGB8 frame from the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, MediaError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(MediaError::CaptureFailed(format!(
                "frame buffer is {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Mirror the frame horizontally so the stored photo matches the
    /// mirrored live preview the user was looking at.
    pub fn mirrored(&self) -> Frame {
        let w = self.width as usize;
        let mut pixels = vec![0u8; self.pixels.len()];
        for row in 0..self.height as usize {
            for col in 0..w {
                let src = (row * w + col) * 3;
                let dst = (row * w + (w - 1 - col)) * 3;
                pixels[dst..dst + 3].copy_from_slice(&self.pixels[src..src + 3]);
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// An encoded still photo. Created once on capture; immutable until retake.
#[derive(Debug, Clone)]
pub struct Photo {
    pub jpeg_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Photo {
    /// Mirror the frame and encode it as JPEG.
    pub fn from_frame(frame: &Frame, quality: u8) -> Result<Self, MediaError> {
        let mirrored = frame.mirrored();
        let mut jpeg_bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg_bytes, quality);
        encoder
            .encode(
                &mirrored.pixels,
                mirrored.width,
                mirrored.height,
                image::ColorType::Rgb8,
            )
            .map_err(|e| MediaError::CaptureFailed(format!("JPEG encode: {}", e)))?;
        Ok(Self {
            jpeg_bytes,
            width: mirrored.width,
            height: mirrored.height,
        })
    }
}
