use std::fs;
use std::path::PathBuf;

use agni_rs::prelude::*;
use tempfile::TempDir;

const SCALE_KERNEL: &str = r#"
__kernel void scale(__global const float* input,
                    __global float* output,
                    const float factor)
{
    const size_t i = get_global_id(0);

    if ((i + 1) * sizeof(float) > get_global_size(0))
        return;
    output[i] = factor * input[i];
}
"#;

const COPY_KERNEL: &str = r#"
__constant sampler_t sampler = CLK_NORMALIZED_COORDS_FALSE
                             | CLK_ADDRESS_CLAMP_TO_EDGE
                             | CLK_FILTER_NEAREST;

__kernel void copy(__read_only image2d_t input,
                   __write_only image2d_t output)
{
    const int2 pos = (int2)(get_global_id(0), get_global_id(1));
    write_imagef(output, pos, read_imagef(input, sampler, pos));
}
"#;

fn write_kernel(dir: &TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("kernel.cl");
    fs::write(&path, source).unwrap();
    path
}

/// Build a processor for `source`, or skip the test when no usable
/// OpenCL runtime is installed.
fn processor_for(dir: &TempDir, source: &str) -> Option<Processor> {
    let path = write_kernel(dir, source);
    let config = Config::builder(&path).build().unwrap();
    match Processor::new(config) {
        Ok(processor) => Some(processor),
        Err(err) => {
            eprintln!("skipping: no usable OpenCL runtime ({err})");
            None
        }
    }
}

fn to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn to_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[test]
fn test_bad_kernel_path_fails_before_discovery() {
    // Loading the source precedes every runtime call, so this fails
    // with the same error with or without an OpenCL runtime present.
    let result = Processor::new(Config::new("/nonexistent/kernel.cl"));
    assert!(matches!(result, Err(Error::KernelFileNotFound { .. })));
}

#[test]
fn test_missing_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, SCALE_KERNEL) else {
        return;
    };

    let mut output = [0u8; 20];
    let result = processor.execute(
        "scale",
        vec![
            KernelArg::Output {
                data: &mut output,
                copy: true,
            },
            KernelArg::Scalar(Scalar::F32(2.0)),
        ],
    );
    assert!(matches!(result, Err(Error::MissingInput)));
}

#[test]
fn test_missing_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, SCALE_KERNEL) else {
        return;
    };

    let input = [0u8; 20];
    let result = processor.execute(
        "scale",
        vec![
            KernelArg::Input {
                data: &input,
                copy: true,
            },
            KernelArg::Scalar(Scalar::F32(2.0)),
        ],
    );
    assert!(matches!(result, Err(Error::MissingOutput)));
}

#[test]
fn test_second_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, SCALE_KERNEL) else {
        return;
    };

    let input = [0u8; 20];
    let mut out_a = [0u8; 20];
    let mut out_b = [0u8; 20];
    let result = processor.execute(
        "scale",
        vec![
            KernelArg::Input {
                data: &input,
                copy: true,
            },
            KernelArg::Output {
                data: &mut out_a,
                copy: true,
            },
            KernelArg::Output {
                data: &mut out_b,
                copy: true,
            },
        ],
    );
    assert!(matches!(result, Err(Error::MultipleOutputs)));
}

#[test]
fn test_unknown_kernel_name_is_a_runtime_failure() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, SCALE_KERNEL) else {
        return;
    };

    let input = [0u8; 20];
    let mut output = [0u8; 20];
    let result = processor.execute(
        "no_such_entry_point",
        vec![
            KernelArg::Input {
                data: &input,
                copy: true,
            },
            KernelArg::Output {
                data: &mut output,
                copy: true,
            },
        ],
    );
    assert!(matches!(result, Err(Error::Runtime { .. })));
}

#[test]
fn test_build_failure_surfaces_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    if processor_for(&dir, SCALE_KERNEL).is_none() {
        return;
    }

    let path = dir.path().join("broken.cl");
    fs::write(&path, "__kernel void broken( {\n").unwrap();

    let result = Processor::new(Config::new(&path));
    match result {
        Err(Error::BuildFailed { log }) => assert!(!log.is_empty()),
        other => panic!("expected BuildFailed, got {other:?}"),
    }
}

fn run_scale(copy: bool) {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, SCALE_KERNEL) else {
        return;
    };

    let input = to_bytes(&[23.0, 22.0, 21.0, 20.0, 17.0]);
    let mut output = vec![0u8; input.len()];

    processor
        .execute(
            "scale",
            vec![
                KernelArg::Input {
                    data: &input,
                    copy,
                },
                KernelArg::Output {
                    data: &mut output,
                    copy,
                },
                KernelArg::Scalar(Scalar::F32(2.0)),
            ],
        )
        .unwrap();

    assert_eq!(to_floats(&output), vec![46.0, 44.0, 42.0, 40.0, 34.0]);
}

#[test]
fn test_scale_with_copy_on_create() {
    run_scale(true);
}

#[test]
fn test_scale_with_explicit_transfer() {
    run_scale(false);
}

#[test]
fn test_image_identity_copy_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, COPY_KERNEL) else {
        return;
    };

    let input_path = dir.path().join("input.ppm");
    let output_path = dir.path().join("output.ppm");
    Image::new(3, 3, vec![0u8; 27]).save(&input_path).unwrap();

    processor
        .execute(
            "copy",
            vec![
                KernelArg::InputImage {
                    path: &input_path,
                    copy: false,
                },
                KernelArg::OutputImage { path: &output_path },
            ],
        )
        .unwrap();

    assert_eq!(
        fs::read(&input_path).unwrap(),
        fs::read(&output_path).unwrap()
    );
}

#[test]
fn test_output_image_matches_input_extents() {
    let dir = tempfile::tempdir().unwrap();
    let Some(processor) = processor_for(&dir, COPY_KERNEL) else {
        return;
    };

    let input_path = dir.path().join("wide.ppm");
    let output_path = dir.path().join("wide_out.ppm");
    Image::new(8, 2, vec![128u8; 8 * 2 * 3])
        .save(&input_path)
        .unwrap();

    processor
        .execute(
            "copy",
            vec![
                KernelArg::InputImage {
                    path: &input_path,
                    copy: true,
                },
                KernelArg::OutputImage { path: &output_path },
            ],
        )
        .unwrap();

    let result = Image::load(&output_path).unwrap();
    assert_eq!((result.width, result.height), (8, 2));
}
