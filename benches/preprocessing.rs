use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framewatch::{Frame, FramePreprocessor, Rotation};

/// Create a test frame with gradient content
fn create_test_frame(width: u32, height: u32, rotation: Rotation) -> Frame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(((x as f32 / width as f32) * 255.0) as u8);
            data.push(((y as f32 / height as f32) * 255.0) as u8);
            data.push((x.wrapping_mul(y) % 255) as u8);
            data.push(255);
        }
    }
    Frame::new(data, width, height, rotation)
}

fn bench_prepare(c: &mut Criterion) {
    let preprocessor = FramePreprocessor::new((320, 320));

    let mut group = c.benchmark_group("preprocessing");
    for (width, height) in [(640u32, 480u32), (1280, 720), (1920, 1080)] {
        let frame = create_test_frame(width, height, Rotation::Deg0);
        group.throughput(Throughput::Bytes((width * height * 4) as u64));
        group.bench_with_input(
            BenchmarkId::new("prepare", format!("{}x{}", width, height)),
            &frame,
            |b, frame| b.iter(|| preprocessor.prepare(frame).unwrap()),
        );
    }
    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let preprocessor = FramePreprocessor::new((320, 320));

    let mut group = c.benchmark_group("rotation");
    for rotation in [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ] {
        let frame = create_test_frame(640, 480, rotation);
        group.bench_with_input(
            BenchmarkId::new("prepare", format!("{:?}", rotation)),
            &frame,
            |b, frame| b.iter(|| preprocessor.prepare(frame).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_prepare, bench_rotation);
criterion_main!(benches);
