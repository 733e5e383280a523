//! Buffer workload demo: scale a float vector on the device.

use agni_rs::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let input = [23.0f32, 22.0, 21.0, 20.0, 17.0];
    let factor = 2.0f32;

    let input_bytes: Vec<u8> = input.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let mut output_bytes = vec![0u8; input_bytes.len()];

    println!("=== Scale Demo ===\n");
    println!("Initializing processor...");

    let config = Config::builder("kernels/scale.cl")
        .device_class(DeviceClass::All)
        .build()?;
    let processor = Processor::new(config)?;

    println!("Executing 'scale' over {} input bytes...", input_bytes.len());

    // Both buffers use the copy-on-create transfer path.
    processor.execute(
        "scale",
        vec![
            KernelArg::Input {
                data: &input_bytes,
                copy: true,
            },
            KernelArg::Output {
                data: &mut output_bytes,
                copy: true,
            },
            KernelArg::Scalar(Scalar::F32(factor)),
        ],
    )?;

    let output: Vec<f32> = output_bytes
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    for (x, y) in input.iter().zip(&output) {
        println!("{y} = {factor} * {x}");
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
