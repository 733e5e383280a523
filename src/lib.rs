//! AGNI - Accelerated General Numeric Interface
//!
//! A synchronous OpenCL offload layer for Rust: discover compute
//! platforms and devices, compile a kernel program once, then dispatch
//! kernels over typed argument lists with call-scoped device memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use agni_rs::prelude::*;
//!
//! # fn main() -> agni_rs::Result<()> {
//! let config = Config::builder("kernels/scale.cl")
//!     .device_class(DeviceClass::All)
//!     .build()?;
//! let processor = Processor::new(config)?;
//!
//! let input = [23.0f32, 22.0, 21.0, 20.0, 17.0];
//! let input_bytes: Vec<u8> = input.iter().flat_map(|v| v.to_ne_bytes()).collect();
//! let mut output_bytes = vec![0u8; input_bytes.len()];
//!
//! processor.execute(
//!     "scale",
//!     vec![
//!         KernelArg::Input { data: &input_bytes, copy: true },
//!         KernelArg::Output { data: &mut output_bytes, copy: true },
//!         KernelArg::Scalar(Scalar::F32(2.0)),
//!     ],
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//!
//! - **Construct once, execute many**: context, program, and queue are
//!   acquired at construction and released exactly once at drop.
//! - **Typed descriptors**: argument kind × direction is a tagged
//!   union; invalid combinations are unrepresentable.
//! - **Positional binding**: descriptors bind to kernel parameter
//!   slots 0, 1, 2, … in list order.
//! - **Synchronous by design**: one in-order queue, blocking
//!   transfers, no cancellation.

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]

pub mod args;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod image;
pub mod prelude;
pub mod processor;

// Re-export key types at crate root
pub use args::{ExecutionDomain, KernelArg, Scalar};
pub use config::{Config, ConfigBuilder, DeviceClass};
pub use error::{Error, Result};
pub use image::Image;
pub use processor::Processor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_reaches_processor_surface() {
        let config = Config::builder("kernels/scale.cl")
            .device_class(DeviceClass::Gpu)
            .build()
            .unwrap();

        assert_eq!(config.device_class, DeviceClass::Gpu);
    }

    #[test]
    fn test_missing_kernel_path_fails_before_discovery() {
        // Must fail identically whether or not an OpenCL runtime is
        // installed: the source is loaded before any platform call.
        let config = Config::new("/nonexistent/kernel.cl");
        let result = Processor::new(config);
        assert!(matches!(result, Err(Error::KernelFileNotFound { .. })));
    }

    #[test]
    fn test_conversion_round_trip() {
        let img = Image::new(2, 2, vec![0u8; 12]);
        assert_eq!(img.to_rgba().to_rgb(), img);
    }
}
