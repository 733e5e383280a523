//! The processor: owns the execution context and dispatches kernels.

use std::ffi::c_void;
use std::ptr;

use opencl3::kernel::Kernel;
use opencl3::types::CL_BLOCKING;
use tracing::{debug, error, info};

use crate::args::{self, BoundArgs, KernelArg, OutputTarget};
use crate::config::Config;
use crate::context::{self, ExecutionContext};
use crate::device;
use crate::error::{Error, Result};
use crate::image::Image;

/// A synchronous kernel dispatcher bound to one platform, one compiled
/// program, and one device queue.
///
/// Construction acquires the context, program, and queue once; they
/// are released when the processor drops. Each `execute` call creates
/// and releases its own kernel handle and device memory.
pub struct Processor {
    ctx: ExecutionContext,
    config: Config,
}

impl Processor {
    /// Discover a platform and device set per `config`, compile the
    /// kernel source, and open the command queue.
    ///
    /// The kernel source is loaded before discovery, so a bad path
    /// fails before any runtime resource exists.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = context::load_kernel_source(&config.kernel_path)?;

        let platforms = device::platforms()?;
        let platform = platforms.get(config.platform_index).ok_or_else(|| {
            Error::config(format!(
                "platform index {} out of range ({} platform(s))",
                config.platform_index,
                platforms.len()
            ))
        })?;

        let devices = device::devices(platform, config.device_class)?;
        let ctx = ExecutionContext::new(
            platform,
            &devices,
            config.device_index,
            &source,
            &config.build_options,
        )?;

        let device_name = ctx
            .device()
            .name()
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!(
            device = %device_name,
            kernel = %config.kernel_path.display(),
            "processor ready"
        );

        Ok(Self { ctx, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Launch `entry` over the domain derived from the input argument
    /// and retrieve the result into the output argument.
    ///
    /// Fully synchronous: the call returns once the readback transfer
    /// has completed. Per-call resources are released on every path.
    pub fn execute(&self, entry: &str, args: Vec<KernelArg<'_>>) -> Result<()> {
        self.dispatch(entry, args).map_err(|err| {
            error!(kernel = entry, %err, "kernel dispatch failed");
            err
        })
    }

    fn dispatch(&self, entry: &str, args: Vec<KernelArg<'_>>) -> Result<()> {
        args::validate(&args)?;

        // Released at end of scope on every path, after the bound
        // memory objects.
        let kernel =
            Kernel::create(self.ctx.program(), entry).map_err(Error::runtime("clCreateKernel"))?;

        let bound = args::bind(&self.ctx, &kernel, args)?;

        let extents = bound.domain.extents();
        debug!(kernel = entry, ?extents, "enqueueing kernel");
        unsafe {
            self.ctx.queue().enqueue_nd_range_kernel(
                kernel.get(),
                bound.domain.dimensions(),
                ptr::null(),
                extents.as_ptr(),
                ptr::null(),
                &[],
            )
        }
        .map(|_| ())
        .map_err(Error::runtime("clEnqueueNDRangeKernel"))?;

        self.read_back(bound)
    }

    /// Blocking readback of the output argument; doubles as the
    /// synchronization point for the launch.
    fn read_back(&self, bound: BoundArgs<'_>) -> Result<()> {
        match bound.output {
            OutputTarget::Buffer { buffer, dest } => {
                unsafe {
                    self.ctx
                        .queue()
                        .enqueue_read_buffer(&buffer, CL_BLOCKING, 0, dest, &[])
                }
                .map(|_| ())
                .map_err(Error::runtime("clEnqueueReadBuffer"))?;
            }
            OutputTarget::Image {
                image,
                path,
                width,
                height,
            } => {
                let mut pixels = vec![0u8; width * height * 4];
                let (origin, region) = args::image_region(width, height);
                unsafe {
                    self.ctx.queue().enqueue_read_image(
                        &image,
                        CL_BLOCKING,
                        origin.as_ptr(),
                        region.as_ptr(),
                        0,
                        0,
                        pixels.as_mut_ptr() as *mut c_void,
                        &[],
                    )
                }
                .map(|_| ())
                .map_err(Error::runtime("clEnqueueReadImage"))?;

                Image::new(width, height, pixels).to_rgb().save(path)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
