// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

/// Converts packed YUYV into planar YUV 4:2:2.
///
/// Every four source bytes `[Y0, Cb, Y1, Cr]` describe two horizontally
/// adjacent pixels. The destination receives the full resolution luma plane
/// (`width * height` bytes) followed by the Cb and Cr planes at half the
/// horizontal resolution (`width / 2 * height` bytes each).
///
/// Both buffers must be allocated by the caller and `width` should be even.
/// No validation is done up front. With an odd width the last column of each
/// row is dropped: its luma byte is left unwritten and it has no chroma pair.
///
/// # Panics
///
/// Panics if `src` is shorter than `width * height * 2` bytes or `dst` is
/// shorter than `width * height + 2 * (width / 2 * height)` bytes. For even
/// widths both come to `width * height * 2`.
///
/// # Example
///
/// ```
/// use edgefirst_jpeg::convert::convert_yuyv_to_yuv422;
///
/// let yuyv = [10, 100, 20, 200, 30, 101, 40, 201];
/// let mut planar = [0u8; 8];
/// convert_yuyv_to_yuv422(&yuyv, 4, 1, &mut planar);
/// assert_eq!(planar, [10, 20, 30, 40, 100, 101, 200, 201]);
/// ```
pub fn convert_yuyv_to_yuv422(src: &[u8], width: usize, height: usize, dst: &mut [u8]) {
    if width < 2 || height == 0 {
        return;
    }

    let src = &src[..width * height * 2];
    let (y_plane, u_plane, v_plane) = yuv422_planes(dst, width, height);
    let half = width / 2;

    for (row, src_row) in src.chunks_exact(width * 2).enumerate() {
        let y_row = &mut y_plane[row * width..(row + 1) * width];
        let u_row = &mut u_plane[row * half..(row + 1) * half];
        let v_row = &mut v_plane[row * half..(row + 1) * half];

        for (i, px) in src_row.chunks_exact(4).enumerate() {
            y_row[2 * i] = px[0];
            u_row[i] = px[1];
            y_row[2 * i + 1] = px[2];
            v_row[i] = px[3];
        }
    }
}

/// Splits a planar YUV 4:2:2 buffer into its `(Y, Cb, Cr)` planes.
///
/// # Panics
///
/// Panics if `buf` is shorter than `width * height + 2 * (width / 2 * height)`.
pub fn yuv422_planes(
    buf: &mut [u8],
    width: usize,
    height: usize,
) -> (&mut [u8], &mut [u8], &mut [u8]) {
    let luma = width * height;
    let chroma = width / 2 * height;
    let (y, rest) = buf.split_at_mut(luma);
    let (u, rest) = rest.split_at_mut(chroma);
    let v = &mut rest[..chroma];
    (y, u, v)
}
