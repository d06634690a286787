/// Live detection demo with a synthetic camera
///
/// Stands in for a real camera producer: feeds RGBA frames through the
/// detection pipeline at roughly 30 fps and prints the ranked results
/// mirrored into the observable state holder.
///
/// Usage:
///   cargo run --release --bin detect-stream -- <model_path> [image_path]
use anyhow::bail;
use framewatch::{DetectionPipeline, DetectorConfig, Frame, ObservedState, Rotation};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Gradient test frame used when no image is supplied
fn synthetic_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(((x as f32 / width as f32) * 255.0) as u8);
            data.push(((y as f32 / height as f32) * 255.0) as u8);
            data.push((x.wrapping_mul(y) % 255) as u8);
            data.push(255);
        }
    }
    Frame::new(data, width, height, Rotation::Deg0)
}

fn load_frame(path: &str) -> anyhow::Result<Frame> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, Rotation::Deg0))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut config = DetectorConfig::default();
    if args.len() > 1 {
        config.model_path = args[1].clone();
    }

    let frame = if args.len() > 2 {
        load_frame(&args[2])?
    } else {
        synthetic_frame(640, 480)
    };

    println!("Model: {}", config.model_path);
    println!("Frame source: {}x{}", frame.width, frame.height);

    let state = Arc::new(ObservedState::new());
    let pipeline = DetectionPipeline::spawn_onnx(config, state.clone())?;

    // Wait for the two-phase initialization to resolve
    let start = Instant::now();
    while !state.is_initialized() && !state.has_failed() {
        if start.elapsed() > Duration::from_secs(30) {
            bail!("pipeline initialization timed out");
        }
        thread::sleep(Duration::from_millis(50));
    }
    if state.has_failed() {
        bail!(
            "pipeline initialization failed: {}",
            state.last_error().unwrap_or_else(|| "unknown".to_string())
        );
    }
    println!("Pipeline ready in {:.0?}", start.elapsed());

    // Deliver frames faster than the detector keeps up; backpressure drops
    // the stale ones
    for _ in 0..120 {
        pipeline.on_frame(frame.clone());
        thread::sleep(Duration::from_millis(33));
    }

    println!(
        "Delivered 120 frames: {} processed, {} dropped",
        pipeline.frames_processed(),
        pipeline.frames_dropped()
    );

    let detections = state.latest_detections();
    if detections.is_empty() {
        println!("No objects detected in the latest frame");
    } else {
        println!("Latest frame:");
        for det in &detections {
            let top = &det.categories[0];
            println!(
                "  {} {:.2} at ({:.2}, {:.2}) {:.2}x{:.2}",
                top.label, top.score, det.bbox.x, det.bbox.y, det.bbox.width, det.bbox.height
            );
        }
    }

    pipeline.shutdown();
    Ok(())
}
