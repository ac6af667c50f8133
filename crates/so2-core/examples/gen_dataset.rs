//! Generator of a synthetic vessel-mask + simulated SO2 dataset
//!
//! Usage: cargo run -p so2-core --example gen_dataset

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::filter::gaussian_blur_f32;
use rand::Rng;
use so2_core::{BatchConfig, BatchProcessor};
use std::fs;
use std::path::Path;

const MASK_SIZE: u32 = 256;
const NUM_MASKS: usize = 4;
const VARIANTS_PER_MASK: u32 = 2;

fn main() -> anyhow::Result<()> {
    let output_dir = Path::new("generated_dataset");
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    let mask_dir = output_dir.join("masks");
    let signal_dir = output_dir.join("so2");
    let label_dir = output_dir.join("labels");
    fs::create_dir_all(&mask_dir)?;

    println!("Generating dataset in {:?}", output_dir);

    // 1. Synthetic vessel masks: random branching walks, slightly blurred
    let mut rng = rand::thread_rng();
    for i in 0..NUM_MASKS {
        let mask = random_vessel_mask(&mut rng);
        mask.save(mask_dir.join(format!("vessel_{:04}.png", i + 1)))?;
    }
    println!("Generated {} vessel masks.", NUM_MASKS);

    // 2. Simulated SO2 maps and segmentation labels
    let config = BatchConfig {
        input_dir: mask_dir,
        output_signal_dir: signal_dir,
        output_label_dir: Some(label_dir),
        count_per_image: VARIANTS_PER_MASK,
    };
    let processor = BatchProcessor::new(config);
    let summary = processor.run(&mut rng)?;

    println!(
        "Generated {} SO2/label pairs ({} masks skipped).",
        summary.generated, summary.skipped
    );

    // 3. Dataset manifest
    let manifest = serde_json::json!({
        "mask_size": MASK_SIZE,
        "masks": NUM_MASKS,
        "variants_per_mask": VARIANTS_PER_MASK,
        "generated": summary.generated,
    });
    fs::write(
        output_dir.join("manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    println!("Done.");
    Ok(())
}

/// Draw a vessel-like structure: a few random walks with short branches
fn random_vessel_mask<R: Rng>(rng: &mut R) -> GrayImage {
    let mut img = GrayImage::new(MASK_SIZE, MASK_SIZE);
    let size = MASK_SIZE as f32;

    for _ in 0..5 {
        let mut x = rng.gen_range(size * 0.2..size * 0.8);
        let mut y = rng.gen_range(size * 0.2..size * 0.8);
        let mut angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);

        for _ in 0..40 {
            let step = rng.gen_range(4.0..10.0);
            let nx = (x + angle.cos() * step).clamp(2.0, size - 3.0);
            let ny = (y + angle.sin() * step).clamp(2.0, size - 3.0);

            draw_line_segment_mut(&mut img, (x, y), (nx, ny), Luma([255]));

            // Occasional short side branch
            if rng.gen::<f64>() < 0.2 {
                let branch_angle = angle + rng.gen_range(-1.2..1.2);
                let bx = (nx + branch_angle.cos() * step * 2.0).clamp(2.0, size - 3.0);
                let by = (ny + branch_angle.sin() * step * 2.0).clamp(2.0, size - 3.0);
                draw_line_segment_mut(&mut img, (nx, ny), (bx, by), Luma([255]));
            }

            x = nx;
            y = ny;
            angle += rng.gen_range(-0.5..0.5);
        }
    }

    // Soften edges so thresholds see a realistic intensity falloff
    gaussian_blur_f32(&img, 1.0)
}
