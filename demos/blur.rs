//! Image workload demo: Gaussian-blur a PPM image on the device.

use std::path::Path;

use agni_rs::prelude::*;

/// Normalized (2 * radius + 1)² Gaussian coefficient table.
fn gaussian_table(sigma: f32, radius: i32) -> Vec<f32> {
    let size = (radius * 2 + 1) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut table = Vec::with_capacity(size * size);
    for i in -radius..=radius {
        for j in -radius..=radius {
            table.push((-((i * i + j * j) as f32) / two_sigma_sq).exp());
        }
    }
    let sum: f32 = table.iter().sum();
    for w in &mut table {
        *w /= sum;
    }
    table
}

/// A small synthetic test card so the demo is self-contained.
fn test_card(width: usize, height: usize) -> Image {
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let checker = ((x / 16 + y / 16) % 2) as u8;
            pixels.push(checker * 255);
            pixels.push((x * 255 / width) as u8);
            pixels.push((y * 255 / height) as u8);
        }
    }
    Image::new(width, height, pixels)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let radius = 5i32;
    let filter = gaussian_table(1.5, radius);
    let filter_bytes: Vec<u8> = filter.iter().flat_map(|v| v.to_ne_bytes()).collect();

    let input_path = Path::new("res/input.ppm");
    let output_path = Path::new("res/output.ppm");

    println!("=== Blur Demo ===\n");

    if !input_path.exists() {
        std::fs::create_dir_all("res").ok();
        test_card(128, 128).save(input_path)?;
        println!("Wrote synthetic test card to {}", input_path.display());
    }

    println!("Initializing processor...");
    let config = Config::builder("kernels/blur.cl")
        .device_class(DeviceClass::All)
        .build()?;
    let processor = Processor::new(config)?;

    println!("Blurring {} (radius {radius})...", input_path.display());

    // The image pair uses the explicit blocking-write transfer path.
    processor.execute(
        "blur",
        vec![
            KernelArg::InputImage {
                path: input_path,
                copy: false,
            },
            KernelArg::Static {
                data: &filter_bytes,
                copy: false,
            },
            KernelArg::Scalar(Scalar::I32(radius)),
            KernelArg::OutputImage { path: output_path },
        ],
    )?;

    println!("Result written to {}", output_path.display());

    let size = (radius * 2 + 1) as usize;
    println!("\nFilter table:");
    for row in filter.chunks_exact(size) {
        let line: Vec<String> = row.iter().map(|w| format!("{w:.5}")).collect();
        println!("{}", line.join(", "));
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
