// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst UVC JPEG Compressor
//!
//! This library turns raw camera frames into JPEG images for MJPEG streaming
//! over a USB video gadget. It is built to run once per video frame on
//! embedded processors: the libjpeg-turbo engine is created once and reused,
//! and compressed data is written straight into buffers supplied by the
//! caller.
//!
//! ## Features
//!
//! - **Format Conversion**: Packed YUYV to planar YUV 4:2:2 conversion.
//! - **JPEG Encoding**: Grayscale, RGB, BGR, RGBA and YUYV compression using
//!   turbojpeg with SIMD.
//! - **Shared Engine**: A single compressor instance, either owned by the
//!   pipeline or lazily created process-wide, with serialized access.
//!
//! ## Example
//!
//! ```
//! use edgefirst_jpeg::{image::jpeg_capacity, jpeg, DEFAULT_QUALITY};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (320, 240);
//! let yuyv = vec![0x80u8; width * height * 2];
//! let mut out = vec![0u8; jpeg_capacity(width, height)];
//!
//! let len = jpeg::shared()?.compress_yuyv_to_jpeg(&yuyv, width, height, &mut out, DEFAULT_QUALITY)?;
//! let jpeg = &out[..len];
//! assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Buffer Sizing
//!
//! Destination buffers must hold at least `width * height * 2` bytes, the
//! usual size of a UVC gadget buffer. Smaller buffers are rejected before the
//! codec runs.

pub mod codec;
pub mod convert;
pub mod error;
pub mod image;
pub mod jpeg;

pub use error::{Error, Result};
pub use jpeg::{shared, CompressorConfig, JpegCompressor, DEFAULT_QUALITY};
