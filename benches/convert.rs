use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_jpeg::{
    convert::convert_yuyv_to_yuv422,
    image::{image_size, PixelFormat},
};

pub fn benchmark_convert(c: &mut Criterion) {
    let dims = [
        (320, 240),
        (640, 480),
        (960, 540),
        (1920, 1080),
        (3840, 2160),
    ];

    let mut group = c.benchmark_group("convert/yuyv-yuv422");
    for dim in dims.iter() {
        let src = vec![0x80u8; image_size(dim.0, dim.1, PixelFormat::Yuyv)];
        let mut dst = vec![0u8; image_size(dim.0, dim.1, PixelFormat::Yuv422)];
        group.bench_function(format!("{}x{}", dim.0, dim.1), |b| {
            b.iter(|| convert_yuyv_to_yuv422(&src, dim.0, dim.1, &mut dst))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_convert);
criterion_main!(benches);
