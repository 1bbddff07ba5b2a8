// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::Result;
use tracing::debug;
use turbojpeg::{Compressor, Subsamp};

/// Colour space tag handed to the codec for a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Single component luma
    Gray,
    /// Packed R, G, B
    Rgb,
    /// Packed B, G, R
    Bgr,
    /// Packed R, G, B, A; alpha is ignored
    Rgba,
    /// Planar Y, Cb, Cr with 4:2:2 chroma
    Yuv422,
}

/// Chroma subsampling of the produced JPEG for colour inputs.
#[derive(clap::ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// 4:4:4, no chroma subsampling
    #[value(name = "444")]
    Sub444,
    /// 4:2:2, chroma halved horizontally (native UVC MJPEG layout)
    #[default]
    #[value(name = "422")]
    Sub422,
    /// 4:2:0, chroma halved in both directions
    #[value(name = "420")]
    Sub420,
    /// Luma only, chroma discarded
    Gray,
}

impl From<ChromaSubsampling> for Subsamp {
    fn from(value: ChromaSubsampling) -> Self {
        match value {
            ChromaSubsampling::Sub444 => Subsamp::None,
            ChromaSubsampling::Sub422 => Subsamp::Sub2x1,
            ChromaSubsampling::Sub420 => Subsamp::Sub2x2,
            ChromaSubsampling::Gray => Subsamp::Gray,
        }
    }
}

/// One uncompressed frame as seen by the codec.
#[derive(Copy, Clone, Debug)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: usize,
    /// Bytes per row; ignored for planar input.
    pub pitch: usize,
    pub height: usize,
    pub color: ColorSpace,
}

/// Per-call encoder parameters. Every call sets all of them so no state
/// leaks from one frame into the next.
#[derive(Copy, Clone, Debug)]
pub struct Params {
    /// 1 (worst) to 100 (best). Values outside the range are clamped.
    pub quality: i32,
    pub subsampling: ChromaSubsampling,
}

/// A single-shot JPEG encoder engine.
///
/// Implementations own their native resources and release them on drop.
/// An engine is not required to be usable from several threads at once;
/// callers serialize access.
pub trait Codec: Send {
    /// Compresses a whole frame into `dst` and returns the number of bytes
    /// written. Nothing beyond that count is meaningful.
    fn compress(&mut self, frame: Frame<'_>, dst: &mut [u8], params: &Params) -> Result<usize>;
}

/// libjpeg-turbo backed codec.
pub struct TurboJpeg {
    compressor: Compressor,
}

impl TurboJpeg {
    /// Creates the turbojpeg compressor handle.
    ///
    /// # Errors
    ///
    /// Returns an error if libjpeg-turbo fails to allocate the handle.
    pub fn new() -> Result<Self> {
        let compressor = Compressor::new()?;
        debug!("turbojpeg compressor created");
        Ok(Self { compressor })
    }
}

impl Codec for TurboJpeg {
    fn compress(&mut self, frame: Frame<'_>, dst: &mut [u8], params: &Params) -> Result<usize> {
        self.compressor.set_quality(params.quality.clamp(1, 100))?;

        let format = match frame.color {
            ColorSpace::Yuv422 => {
                let image = turbojpeg::YuvImage {
                    pixels: frame.pixels,
                    width: frame.width,
                    align: 1,
                    height: frame.height,
                    subsamp: Subsamp::Sub2x1,
                };
                return Ok(self.compressor.compress_yuv_to_slice(image, dst)?);
            }
            ColorSpace::Gray => turbojpeg::PixelFormat::GRAY,
            ColorSpace::Rgb => turbojpeg::PixelFormat::RGB,
            ColorSpace::Bgr => turbojpeg::PixelFormat::BGR,
            ColorSpace::Rgba => turbojpeg::PixelFormat::RGBA,
        };

        // Grayscale input can only be encoded as a single component JPEG.
        let subsamp = match frame.color {
            ColorSpace::Gray => Subsamp::Gray,
            _ => params.subsampling.into(),
        };
        self.compressor.set_subsamp(subsamp)?;

        let image = turbojpeg::Image {
            pixels: frame.pixels,
            width: frame.width,
            pitch: frame.pitch,
            height: frame.height,
            format,
        };
        Ok(self.compressor.compress_to_slice(image, dst)?)
    }
}

impl Drop for TurboJpeg {
    fn drop(&mut self) {
        debug!("turbojpeg compressor destroyed");
    }
}
