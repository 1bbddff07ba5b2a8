// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Reusable JPEG compressor for raw camera frames.
//!
//! Creating a libjpeg-turbo handle on every video frame is wasteful, so a
//! [`JpegCompressor`] keeps one engine alive and serializes access to it.
//! Pipelines can own an instance directly or use the process-wide one
//! returned by [`shared`].

use crate::{
    codec::{ChromaSubsampling, Codec, ColorSpace, Frame, Params, TurboJpeg},
    convert::convert_yuyv_to_yuv422,
    error::{Error, Result},
    image::{
        checked_image_size, checked_jpeg_capacity, format_row_stride, image_size, OutputImage,
        PixelFormat, RawImage,
    },
};
use once_cell::sync::OnceCell;
use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};
use tracing::{debug, instrument, trace};

/// Quality used when the caller has no preference.
pub const DEFAULT_QUALITY: i32 = 75;

static SHARED: OnceCell<JpegCompressor> = OnceCell::new();

/// Returns the process-wide compressor, creating it on first use.
///
/// Concurrent first calls resolve to a single instance. If the engine
/// cannot be created the error is returned and a later call tries again.
///
/// The instance is held in a `static` and is never dropped, so its turbojpeg
/// handle is not destroyed through `Drop` but reclaimed by the OS when the
/// process exits. Owners that need explicit teardown construct their own
/// [`JpegCompressor`] and drop it.
pub fn shared() -> Result<&'static JpegCompressor> {
    SHARED.get_or_try_init(JpegCompressor::new)
}

/// Encoder settings fixed for the lifetime of a compressor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressorConfig {
    /// Chroma subsampling used for RGB, BGR and RGBA input. Grayscale input
    /// always produces a grayscale JPEG and YUV input keeps its 4:2:2 layout.
    pub subsampling: ChromaSubsampling,
}

struct Engine {
    codec: Box<dyn Codec>,
    /// Planar conversion target for YUYV frames, kept across calls.
    scratch: Vec<u8>,
}

impl Engine {
    fn compress_yuyv(
        &mut self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        params: &Params,
    ) -> Result<usize> {
        let len = image_size(width, height, PixelFormat::Yuv422);
        if self.scratch.len() < len {
            debug!("growing yuv422 scratch buffer to {} bytes", len);
            self.scratch.resize(len, 0);
        }

        let planar = &mut self.scratch[..len];
        convert_yuyv_to_yuv422(src, width, height, planar);

        let frame = Frame {
            pixels: planar,
            width,
            pitch: format_row_stride(PixelFormat::Yuv422, width),
            height,
            color: ColorSpace::Yuv422,
        };
        self.codec.compress(frame, dst, params)
    }
}

/// Owner of a single JPEG engine shared by all compression calls.
///
/// Every entry point takes `&self`; calls from several threads are
/// serialized on an internal lock, so one instance can be shared through an
/// `Arc` or the [`shared`] accessor.
///
/// # Example
///
/// ```
/// use edgefirst_jpeg::jpeg::{JpegCompressor, DEFAULT_QUALITY};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let compressor = JpegCompressor::new()?;
/// let rgb = vec![128u8; 64 * 48 * 3];
/// let mut jpeg = vec![0u8; 64 * 48 * 2];
/// let len = compressor.compress_rgb_to_jpeg(&rgb, 64, 48, &mut jpeg, DEFAULT_QUALITY)?;
/// assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
/// assert!(len <= jpeg.len());
/// # Ok(())
/// # }
/// ```
pub struct JpegCompressor {
    engine: Mutex<Engine>,
    config: CompressorConfig,
}

impl JpegCompressor {
    /// Creates a compressor with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if libjpeg-turbo cannot create its handle.
    pub fn new() -> Result<Self> {
        Self::with_config(CompressorConfig::default())
    }

    pub fn with_config(config: CompressorConfig) -> Result<Self> {
        Ok(Self::with_codec(Box::new(TurboJpeg::new()?), config))
    }

    /// Wraps an already constructed engine.
    pub fn with_codec(codec: Box<dyn Codec>, config: CompressorConfig) -> Self {
        Self {
            engine: Mutex::new(Engine {
                codec,
                scratch: Vec::new(),
            }),
            config,
        }
    }

    pub fn config(&self) -> CompressorConfig {
        self.config
    }

    // Encoder parameters are set on every call, a poisoned engine is usable.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compresses a raw frame of the given format into `dst`.
    ///
    /// `src` must hold at least `width * height * bytes_per_pixel` bytes with
    /// no row padding, and `dst` at least `width * height * 2` bytes. The
    /// number of bytes written is returned; the remainder of `dst` is
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] for a zero dimension, an odd width on
    ///   a 4:2:2 format, or dimensions whose buffer sizes overflow `usize`.
    /// - [`Error::SourceTooSmall`] and [`Error::DestinationTooSmall`] when a
    ///   buffer is under-sized. The codec is not invoked.
    /// - [`Error::Codec`] when libjpeg-turbo fails, including output that
    ///   does not fit into `dst`.
    #[instrument(level = "trace", skip(self, src, dst), fields(src_len = src.len(), dst_len = dst.len()))]
    pub fn compress(
        &self,
        format: PixelFormat,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        if width == 0 || height == 0 || (format.is_yuv422() && width % 2 != 0) {
            return Err(Error::InvalidDimensions { width, height });
        }

        let (expected, required) = match (
            checked_image_size(width, height, format),
            checked_jpeg_capacity(width, height),
        ) {
            (Some(expected), Some(required)) => (expected, required),
            _ => return Err(Error::InvalidDimensions { width, height }),
        };

        if src.len() < expected {
            return Err(Error::SourceTooSmall {
                expected,
                actual: src.len(),
            });
        }

        if dst.len() < required {
            return Err(Error::DestinationTooSmall {
                required,
                capacity: dst.len(),
            });
        }

        let params = Params {
            quality,
            subsampling: self.config.subsampling,
        };

        let mut engine = self.lock();
        let now = Instant::now();
        let written = match format {
            PixelFormat::Yuyv => engine.compress_yuyv(src, width, height, dst, &params)?,
            _ => {
                let frame = Frame {
                    pixels: &src[..expected],
                    width,
                    pitch: format_row_stride(format, width),
                    height,
                    color: color_space(format),
                };
                engine.codec.compress(frame, dst, &params)?
            }
        };
        drop(engine);

        trace!(
            "{} {}x{} q{} jpeg: {} bytes encode: {:?}",
            format,
            width,
            height,
            quality,
            written,
            now.elapsed()
        );
        Ok(written)
    }

    /// Compresses an 8-bit grayscale frame. See [`JpegCompressor::compress`].
    pub fn compress_gray_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Grey, src, width, height, dst, quality)
    }

    /// Compresses a packed RGB frame. See [`JpegCompressor::compress`].
    pub fn compress_rgb_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Rgb, src, width, height, dst, quality)
    }

    /// Compresses a packed BGR frame. See [`JpegCompressor::compress`].
    pub fn compress_bgr_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Bgr, src, width, height, dst, quality)
    }

    /// Compresses a packed RGBA frame, ignoring alpha. See
    /// [`JpegCompressor::compress`].
    pub fn compress_rgba_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Rgba, src, width, height, dst, quality)
    }

    /// Compresses a packed YUYV frame.
    ///
    /// The frame is converted to planar 4:2:2 in a buffer owned by the
    /// compressor before encoding; the buffer is reused for later frames.
    pub fn compress_yuyv_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Yuyv, src, width, height, dst, quality)
    }

    /// Compresses a frame already converted with
    /// [`convert_yuyv_to_yuv422`](crate::convert::convert_yuyv_to_yuv422).
    pub fn compress_yuv422_to_jpeg(
        &self,
        src: &[u8],
        width: usize,
        height: usize,
        dst: &mut [u8],
        quality: i32,
    ) -> Result<usize> {
        self.compress(PixelFormat::Yuv422, src, width, height, dst, quality)
    }

    /// Compresses `src` into the pre-allocated `dst` image and records the
    /// compressed size in [`OutputImage::bytes_used`].
    pub fn compress_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        let written = self.compress(
            src.format(),
            src.pixels(),
            src.width(),
            src.height(),
            dst.as_mut_slice(),
            quality,
        )?;
        dst.set_bytes_used(written);
        Ok(())
    }

    fn compress_image_as(
        &self,
        format: PixelFormat,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        if src.format() != format {
            return Err(Error::UnexpectedFormat {
                expected: format,
                actual: src.format(),
            });
        }
        self.compress_image(src, dst, quality)
    }

    pub fn compress_gray_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        self.compress_image_as(PixelFormat::Grey, src, dst, quality)
    }

    pub fn compress_rgb_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        self.compress_image_as(PixelFormat::Rgb, src, dst, quality)
    }

    pub fn compress_bgr_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        self.compress_image_as(PixelFormat::Bgr, src, dst, quality)
    }

    pub fn compress_rgba_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        self.compress_image_as(PixelFormat::Rgba, src, dst, quality)
    }

    pub fn compress_yuyv_image(
        &self,
        src: &RawImage,
        dst: &mut OutputImage,
        quality: i32,
    ) -> Result<()> {
        self.compress_image_as(PixelFormat::Yuyv, src, dst, quality)
    }
}

const fn color_space(format: PixelFormat) -> ColorSpace {
    match format {
        PixelFormat::Grey => ColorSpace::Gray,
        PixelFormat::Rgb => ColorSpace::Rgb,
        PixelFormat::Bgr => ColorSpace::Bgr,
        PixelFormat::Rgba => ColorSpace::Rgba,
        PixelFormat::Yuyv | PixelFormat::Yuv422 => ColorSpace::Yuv422,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        pixels: Vec<u8>,
        width: usize,
        pitch: usize,
        height: usize,
        color: ColorSpace,
        quality: i32,
        subsampling: ChromaSubsampling,
    }

    /// Records every call and writes a fixed marker into the destination.
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Codec for Recorder {
        fn compress(
            &mut self,
            frame: Frame<'_>,
            dst: &mut [u8],
            params: &Params,
        ) -> Result<usize> {
            self.calls.lock().unwrap().push(Call {
                pixels: frame.pixels.to_vec(),
                width: frame.width,
                pitch: frame.pitch,
                height: frame.height,
                color: frame.color,
                quality: params.quality,
                subsampling: params.subsampling,
            });
            dst[..2].copy_from_slice(&[0xFF, 0xD8]);
            Ok(2)
        }
    }

    fn recorder(config: CompressorConfig) -> (JpegCompressor, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let codec = Recorder {
            calls: calls.clone(),
        };
        (JpegCompressor::with_codec(Box::new(codec), config), calls)
    }

    #[test]
    fn test_color_space_and_pitch() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let src = vec![7u8; 4 * 2 * 4];
        let mut dst = vec![0u8; 64];

        jpeg.compress_gray_to_jpeg(&src, 4, 2, &mut dst, 75).unwrap();
        jpeg.compress_rgb_to_jpeg(&src, 4, 2, &mut dst, 75).unwrap();
        jpeg.compress_bgr_to_jpeg(&src, 4, 2, &mut dst, 75).unwrap();
        jpeg.compress_rgba_to_jpeg(&src, 4, 2, &mut dst, 75).unwrap();

        let calls = calls.lock().unwrap();
        let seen: Vec<_> = calls.iter().map(|c| (c.color, c.pitch)).collect();
        assert_eq!(
            seen,
            vec![
                (ColorSpace::Gray, 4),
                (ColorSpace::Rgb, 12),
                (ColorSpace::Bgr, 12),
                (ColorSpace::Rgba, 16)
            ]
        );
        // Only the frame bytes reach the codec, not trailing slack.
        assert_eq!(calls[0].pixels.len(), 8);
        assert_eq!(calls[3].pixels.len(), 32);
    }

    #[test]
    fn test_quality_passed_through() {
        let (jpeg, calls) = recorder(CompressorConfig {
            subsampling: ChromaSubsampling::Sub420,
        });
        let src = [0u8; 4];
        let mut dst = [0u8; 8];
        for q in [0, 1, 75, 100, 250] {
            jpeg.compress_gray_to_jpeg(&src, 2, 2, &mut dst, q).unwrap();
        }
        let calls = calls.lock().unwrap();
        let qualities: Vec<_> = calls.iter().map(|c| c.quality).collect();
        assert_eq!(qualities, vec![0, 1, 75, 100, 250]);
        assert!(calls
            .iter()
            .all(|c| c.subsampling == ChromaSubsampling::Sub420));
    }

    #[test]
    fn test_yuyv_is_converted_to_planar() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let src = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0xAAu8; 8];
        let written = jpeg.compress_yuyv_to_jpeg(&src, 2, 2, &mut dst, 90).unwrap();
        assert_eq!(written, 2);
        assert_eq!(&dst[..2], &[0xFF, 0xD8]);
        assert!(dst[2..].iter().all(|&x| x == 0xAA));

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].color, ColorSpace::Yuv422);
        assert_eq!(calls[0].pixels, vec![1, 3, 5, 7, 2, 6, 4, 8]);
    }

    #[test]
    fn test_scratch_reused_across_sizes() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let mut dst = vec![0u8; 64];
        let large = vec![9u8; 4 * 4 * 2];
        let small = [1, 2, 3, 4];
        jpeg.compress_yuyv_to_jpeg(&large, 4, 4, &mut dst, 75).unwrap();
        jpeg.compress_yuyv_to_jpeg(&small, 2, 1, &mut dst, 75).unwrap();

        assert_eq!(jpeg.lock().scratch.len(), 32);
        let calls = calls.lock().unwrap();
        assert_eq!(calls[1].pixels, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_invalid_dimensions() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let src = [0u8; 64];
        let mut dst = [0u8; 64];
        assert!(matches!(
            jpeg.compress_rgb_to_jpeg(&src, 0, 2, &mut dst, 75),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            jpeg.compress_gray_to_jpeg(&src, 2, 0, &mut dst, 75),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            jpeg.compress_yuyv_to_jpeg(&src, 3, 2, &mut dst, 75),
            Err(Error::InvalidDimensions {
                width: 3,
                height: 2
            })
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_dimensions() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let src = [0u8; 64];
        let mut dst = [0xAAu8; 64];

        let huge = usize::MAX / 2;
        assert!(matches!(
            jpeg.compress_rgba_to_jpeg(&src, huge, 4, &mut dst, 75),
            Err(Error::InvalidDimensions { height: 4, .. })
        ));
        // Even width so only the size products can reject it.
        let side = 1usize << (usize::BITS / 2);
        assert!(matches!(
            jpeg.compress_yuyv_to_jpeg(&src, side, side, &mut dst, 75),
            Err(Error::InvalidDimensions { .. })
        ));
        // The source size fits but the destination bound does not.
        assert!(matches!(
            jpeg.compress_gray_to_jpeg(&src, huge + 1, 1, &mut dst, 75),
            Err(Error::InvalidDimensions { height: 1, .. })
        ));

        assert_eq!(dst, [0xAA; 64]);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_buffer_sizes_checked() {
        let (jpeg, calls) = recorder(CompressorConfig::default());
        let mut dst = [0xAAu8; 16];

        let err = jpeg
            .compress_rgb_to_jpeg(&[0u8; 10], 2, 2, &mut dst, 75)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SourceTooSmall {
                expected: 12,
                actual: 10
            }
        ));

        let err = jpeg
            .compress_rgba_to_jpeg(&[0u8; 36], 3, 3, &mut dst, 75)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DestinationTooSmall {
                required: 18,
                capacity: 16
            }
        ));

        assert_eq!(dst, [0xAA; 16]);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_image_overloads() {
        let (jpeg, _calls) = recorder(CompressorConfig::default());
        let pixels = [0u8; 12];
        let mut buf = [0u8; 16];

        let src = RawImage::new(&pixels, 2, 2, PixelFormat::Rgb);
        let mut dst = OutputImage::new(&mut buf, 2, 2);
        jpeg.compress_rgb_image(&src, &mut dst, 75).unwrap();
        assert_eq!(dst.bytes_used(), 2);
        assert_eq!(dst.jpeg(), &[0xFF, 0xD8]);

        let err = jpeg.compress_bgr_image(&src, &mut dst, 75).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedFormat {
                expected: PixelFormat::Bgr,
                actual: PixelFormat::Rgb
            }
        ));
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        let (jpeg, _calls) = recorder(CompressorConfig::default());
        let jpeg = Arc::new(jpeg);
        let poisoner = jpeg.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the engine lock");
        })
        .join();

        let mut dst = [0u8; 8];
        assert_eq!(
            jpeg.compress_gray_to_jpeg(&[0u8; 4], 2, 2, &mut dst, 75)
                .unwrap(),
            2
        );
    }
}
