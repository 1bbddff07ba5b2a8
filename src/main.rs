// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use clap::Parser;
use edgefirst_jpeg::{
    image::{image_size, jpeg_capacity},
    CompressorConfig, JpegCompressor,
};
use kanal::{Receiver, Sender};
use std::{
    error::Error,
    fs::File,
    io::{self, BufWriter, ErrorKind, Read, Write},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer, Registry};

mod args;

fn update_fps(prev: &mut Instant, history: &mut [f64], index: &mut usize) -> f64 {
    let now = Instant::now();
    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1.0 / elapsed.as_secs_f64().max(1e-9);
    *index = (*index + 1) % history.len();

    history.iter().sum::<f64>() / history.len() as f64
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);

    let journald = match tracing_journald::layer() {
        Ok(layer) => Some(layer.with_filter(level)),
        Err(_) => None,
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default().with_filter(LevelFilter::TRACE))
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy);

    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Reads raw frames from the input and hands them to the encoder. Buffers
/// coming back on `recycle` are reused so steady state allocates nothing.
fn read_frames(
    mut input: File,
    frame_size: usize,
    limit: usize,
    tx: Sender<Option<Vec<u8>>>,
    recycle: Receiver<Vec<u8>>,
) -> io::Result<usize> {
    let mut count = 0;
    while limit == 0 || count < limit {
        let mut frame = match recycle.try_recv() {
            Ok(Some(frame)) => frame,
            _ => vec![0u8; frame_size],
        };

        match input.read_exact(&mut frame) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }

        if tx.send(Some(frame)).is_err() {
            // encoder exited
            return Ok(count);
        }
        count += 1;
    }

    let _ = tx.send(None);
    Ok(count)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let (width, height) = (args.width(), args.height());
    if width == 0 || height == 0 {
        return Err(format!("invalid frame size {}x{}", width, height).into());
    }
    let frame_size = image_size(width, height, args.format);
    let input = File::open(&args.input)?;

    if let Ok(meta) = input.metadata() {
        if meta.len() % frame_size as u64 != 0 {
            warn!(
                "input size {} is not a multiple of the {}x{} {} frame size {}",
                meta.len(),
                width,
                height,
                args.format,
                frame_size
            );
        }
    }

    let compressor = JpegCompressor::with_config(CompressorConfig::from(&args))?;
    let mut output = BufWriter::new(File::create(&args.output)?);

    // Frame reading lives in a thread so disk latency does not stall the
    // encoder.
    let queue = args.queue.max(1);
    let (tx, rx) = kanal::bounded(queue);
    let (recycle_tx, recycle_rx) = kanal::bounded(queue + 1);
    let limit = args.frames;
    let reader = thread::Builder::new()
        .name("reader".to_string())
        .spawn(move || read_frames(input, frame_size, limit, tx, recycle_rx))?;

    info!(
        "compressing {}x{} {} frames from {} at quality {}",
        width,
        height,
        args.format,
        args.input.display(),
        args.quality
    );

    let mut jpeg = vec![0u8; jpeg_capacity(width, height)];
    let mut prev = Instant::now();
    let mut history = vec![0.0; 30];
    let mut index = 0;
    let mut encoded = 0usize;
    let mut dropped = 0usize;
    let mut total_bytes = 0usize;
    let mut total_time = Duration::ZERO;

    while let Ok(Some(frame)) = rx.recv() {
        let now = Instant::now();
        match compressor.compress(
            args.format,
            &frame,
            width,
            height,
            &mut jpeg,
            args.quality,
        ) {
            Ok(len) => {
                let encode_time = now.elapsed();
                output.write_all(&jpeg[..len])?;
                encoded += 1;
                total_bytes += len;
                total_time += encode_time;

                let fps = update_fps(&mut prev, &mut history, &mut index);
                debug!(
                    "frame {} raw: {}KB jpeg: {}KB encode: {:?} fps: {:.1}",
                    encoded + dropped,
                    frame_size / 1024,
                    len / 1024,
                    encode_time,
                    fps
                );
            }
            Err(e) => {
                dropped += 1;
                error!("dropping frame {}: {}", encoded + dropped, e);
            }
        }
        let _ = recycle_tx.try_send(frame);
    }
    drop(rx);
    output.flush()?;

    match reader.join() {
        Ok(res) => {
            res?;
        }
        Err(_) => return Err("reader thread panicked".into()),
    }

    if encoded > 0 {
        info!(
            "wrote {} frames ({} dropped) to {}: avg jpeg {}KB avg encode {:?}",
            encoded,
            dropped,
            args.output.display(),
            total_bytes / encoded / 1024,
            total_time / encoded as u32
        );
    } else {
        warn!("no frames compressed ({} dropped)", dropped);
    }

    Ok(())
}
