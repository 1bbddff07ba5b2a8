// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::PixelFormat;
use thiserror::Error;

/// Result type alias for compressor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the JPEG compressor.
///
/// Sizing errors are raised before the codec is invoked, so the destination
/// buffer is left untouched. Codec errors mean the frame should be dropped.
#[derive(Debug, Error)]
pub enum Error {
    /// Width or height is zero, or the width is odd on a 4:2:2 path
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Source buffer holds fewer bytes than the frame requires
    #[error("source buffer too small: expected {expected} bytes, got {actual}")]
    SourceTooSmall { expected: usize, actual: usize },

    /// Destination buffer is below the width * height * 2 capacity contract
    #[error("destination buffer too small: required {required} bytes, capacity {capacity}")]
    DestinationTooSmall { required: usize, capacity: usize },

    /// A format-specific entry point was given an image of another format
    #[error("unexpected pixel format: expected {expected}, got {actual}")]
    UnexpectedFormat {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    /// The underlying libjpeg-turbo engine failed
    #[error("codec error: {0}")]
    Codec(#[from] turbojpeg::Error),
}
