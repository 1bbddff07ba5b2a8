// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;

/// Raw pixel layouts accepted by the compressor.
///
/// All layouts are tightly packed: a row is exactly
/// `width * bytes_per_pixel` bytes with no padding.
#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed format (common camera output format)
    Yuyv,
    /// Planar YUV 4:2:2: full luma plane followed by half-width Cb and Cr
    Yuv422,
    /// RGB 24-bit pixel format (8 bits per channel, no alpha)
    Rgb,
    /// BGR 24-bit pixel format (8 bits per channel, no alpha)
    Bgr,
    /// RGBA 32-bit pixel format (8 bits per channel, with alpha)
    Rgba,
    /// 8-bit grayscale
    Grey,
}

impl PixelFormat {
    /// V4L2 FourCC code for the format.
    pub const fn fourcc(self) -> [u8; 4] {
        match self {
            PixelFormat::Yuyv => *b"YUYV",
            PixelFormat::Yuv422 => *b"422P",
            PixelFormat::Rgb => *b"RGB3",
            PixelFormat::Bgr => *b"BGR3",
            PixelFormat::Rgba => *b"RGBA",
            PixelFormat::Grey => *b"GREY",
        }
    }

    /// Average number of bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Yuyv | PixelFormat::Yuv422 => 2,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba => 4,
            PixelFormat::Grey => 1,
        }
    }

    /// True for the 4:2:2 layouts, which require an even width.
    pub const fn is_yuv422(self) -> bool {
        matches!(self, PixelFormat::Yuyv | PixelFormat::Yuv422)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = self.fourcc();
        write!(f, "{}", String::from_utf8_lossy(&code))
    }
}

/// Row stride in bytes of a packed image. For planar YUV 4:2:2 this is the
/// combined size of one luma row and its two half-width chroma rows.
pub const fn format_row_stride(format: PixelFormat, width: usize) -> usize {
    format.bytes_per_pixel() * width
}

/// Size in bytes of a full frame.
pub const fn image_size(width: usize, height: usize, format: PixelFormat) -> usize {
    format_row_stride(format, width) * height
}

/// Minimum destination capacity callers must provide for a frame.
///
/// This is the conservative `width * height * 2` bound used by UVC gadget
/// buffers. Very small frames (a few pixels) can still exceed it because of
/// the fixed JPEG header overhead; give those a larger buffer.
pub const fn jpeg_capacity(width: usize, height: usize) -> usize {
    width * height * 2
}

/// [`image_size`] that returns `None` instead of overflowing.
pub const fn checked_image_size(width: usize, height: usize, format: PixelFormat) -> Option<usize> {
    match width.checked_mul(format.bytes_per_pixel()) {
        Some(stride) => stride.checked_mul(height),
        None => None,
    }
}

/// [`jpeg_capacity`] that returns `None` instead of overflowing.
pub const fn checked_jpeg_capacity(width: usize, height: usize) -> Option<usize> {
    match width.checked_mul(height) {
        Some(pixels) => pixels.checked_mul(2),
        None => None,
    }
}

/// Borrowed raw frame as delivered by a capture source.
///
/// # Example
///
/// ```
/// use edgefirst_jpeg::image::{PixelFormat, RawImage};
///
/// let pixels = vec![0u8; 640 * 480 * 2];
/// let img = RawImage::new(&pixels, 640, 480, PixelFormat::Yuyv);
/// assert_eq!(img.size(), 614400);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    pixels: &'a [u8],
    width: usize,
    height: usize,
    format: PixelFormat,
}

impl<'a> RawImage<'a> {
    pub fn new(pixels: &'a [u8], width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
        }
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Expected frame size for the declared dimensions and format.
    pub fn size(&self) -> usize {
        image_size(self.width, self.height, self.format)
    }
}

impl fmt::Display for RawImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} len:{}",
            self.width,
            self.height,
            self.format,
            self.pixels.len()
        )
    }
}

/// Pre-allocated output buffer, typically a buffer handed out by the UVC
/// gadget. After a compression the first `bytes_used()` bytes hold the JPEG.
#[derive(Debug)]
pub struct OutputImage<'a> {
    buf: &'a mut [u8],
    width: usize,
    height: usize,
    bytes_used: usize,
}

impl<'a> OutputImage<'a> {
    pub fn new(buf: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            buf,
            width,
            height,
            bytes_used: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    pub fn set_bytes_used(&mut self, bytes_used: usize) {
        self.bytes_used = bytes_used;
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[..]
    }

    /// The compressed JPEG, empty until a compression succeeded.
    pub fn jpeg(&self) -> &[u8] {
        &self.buf[..self.bytes_used]
    }
}

impl fmt::Display for OutputImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} MJPG {}/{} bytes",
            self.width,
            self.height,
            self.bytes_used,
            self.buf.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(image_size(1920, 1080, PixelFormat::Yuyv), 4147200);
        assert_eq!(image_size(1920, 1080, PixelFormat::Yuv422), 4147200);
        assert_eq!(image_size(1920, 1080, PixelFormat::Rgb), 6220800);
        assert_eq!(image_size(1920, 1080, PixelFormat::Bgr), 6220800);
        assert_eq!(image_size(1920, 1080, PixelFormat::Rgba), 8294400);
        assert_eq!(image_size(1920, 1080, PixelFormat::Grey), 2073600);
        assert_eq!(jpeg_capacity(1920, 1080), 4147200);
    }

    #[test]
    fn test_checked_sizes() {
        assert_eq!(
            checked_image_size(1920, 1080, PixelFormat::Rgba),
            Some(image_size(1920, 1080, PixelFormat::Rgba))
        );
        assert_eq!(checked_jpeg_capacity(1920, 1080), Some(4147200));

        assert_eq!(checked_image_size(usize::MAX / 2, 1, PixelFormat::Rgb), None);
        assert_eq!(checked_image_size(usize::MAX / 2, 3, PixelFormat::Grey), None);
        assert_eq!(checked_image_size(usize::MAX / 2, 1, PixelFormat::Grey), Some(usize::MAX / 2));
        assert_eq!(checked_jpeg_capacity(usize::MAX / 2 + 1, 1), None);
        assert_eq!(checked_jpeg_capacity(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn test_display() {
        let pixels = [0u8; 8];
        let img = RawImage::new(&pixels, 4, 2, PixelFormat::Grey);
        assert_eq!(img.to_string(), "4x2 GREY len:8");
        assert_eq!(PixelFormat::Yuyv.to_string(), "YUYV");

        let mut buf = [0u8; 16];
        let mut out = OutputImage::new(&mut buf, 4, 2);
        out.set_bytes_used(3);
        assert_eq!(out.to_string(), "4x2 MJPG 3/16 bytes");
        assert_eq!(out.jpeg().len(), 3);
    }
}
