// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_jpeg::{
    codec::ChromaSubsampling, image::PixelFormat, CompressorConfig, DEFAULT_QUALITY,
};
use std::path::PathBuf;

/// Command-line arguments for the EdgeFirst JPEG frame tool.
///
/// The tool replays a dump of raw camera frames through the JPEG compressor
/// and writes the result as an MJPEG stream (JPEG images back to back).
/// Arguments can be specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Via command line
/// edgefirst-jpeg --input capture.yuyv --size 1280 720 --quality 85
///
/// # Via environment variables
/// export INPUT=capture.yuyv
/// export FORMAT=yuyv
/// edgefirst-jpeg
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw frame dump, frames stored back to back without padding
    #[arg(short, long, env = "INPUT")]
    pub input: PathBuf,

    /// MJPEG output file
    #[arg(short, long, env = "OUTPUT", default_value = "frames.mjpeg")]
    pub output: PathBuf,

    /// Pixel format of the input frames
    #[arg(short, long, env = "FORMAT", default_value = "yuyv", value_enum)]
    pub format: PixelFormat,

    /// Frame resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "SIZE",
        default_value = "1920 1080",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<usize>,

    /// JPEG quality from 1 (worst) to 100 (best)
    #[arg(short, long, env = "QUALITY", default_value_t = DEFAULT_QUALITY)]
    pub quality: i32,

    /// Chroma subsampling for RGB, BGR and RGBA input
    #[arg(long, env = "SUBSAMPLING", default_value = "422", value_enum)]
    pub subsampling: ChromaSubsampling,

    /// Stop after this many frames (0 compresses the whole input)
    #[arg(long, default_value = "0")]
    pub frames: usize,

    /// Raw frames buffered between the reader and the encoder
    #[arg(long, default_value = "4")]
    pub queue: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn width(&self) -> usize {
        self.size[0]
    }

    pub fn height(&self) -> usize {
        self.size[1]
    }
}

impl From<&Args> for CompressorConfig {
    fn from(args: &Args) -> Self {
        CompressorConfig {
            subsampling: args.subsampling,
        }
    }
}
