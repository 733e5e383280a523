//! Long-lived OpenCL resources: context, compiled program, command queue.

use std::fs;
use std::path::Path;
use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::context::context::CL_CONTEXT_PLATFORM;
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::platform::Platform;
use opencl3::program::Program;
use opencl3::types::{cl_context_properties, cl_device_id};
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Read the kernel source text.
///
/// Called before any runtime resource is touched, so a bad path fails
/// without a platform or context ever being created.
pub(crate) fn load_kernel_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::KernelFileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// Owns the resources that persist for a `Processor`'s lifetime.
///
/// The context is bound to the platform's full device list so memory
/// objects can be created against any of them, while the queue targets
/// the one selected device. Fields are declared queue-first: drop
/// releases the queue, then the program, then the context, the reverse
/// of creation order, and each wrapper releases exactly once.
pub struct ExecutionContext {
    queue: CommandQueue,
    program: Program,
    context: Context,
    device: Device,
}

impl ExecutionContext {
    pub(crate) fn new(
        platform: &Platform,
        devices: &[Device],
        device_index: usize,
        source: &str,
        build_options: &str,
    ) -> Result<Self> {
        let device = devices
            .get(device_index)
            .map(|d| Device::new(d.id()))
            .ok_or_else(|| {
                Error::config(format!(
                    "device index {device_index} out of range ({} device(s))",
                    devices.len()
                ))
            })?;

        let device_ids: Vec<cl_device_id> = devices.iter().map(|d| d.id()).collect();

        let properties = [
            CL_CONTEXT_PLATFORM as cl_context_properties,
            platform.id() as cl_context_properties,
            0,
        ];
        let context = Context::from_devices(&device_ids, &properties, None, ptr::null_mut())
            .map_err(Error::runtime("clCreateContext"))?;

        let program = build_program(&context, &device_ids, source, build_options)?;

        let queue = unsafe { CommandQueue::create(&context, device.id(), 0) }
            .map_err(Error::runtime("clCreateCommandQueue"))?;

        debug!(devices = devices.len(), "execution context ready");

        Ok(Self {
            queue,
            program,
            context,
            device,
        })
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// The device the command queue is bound to.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext").finish_non_exhaustive()
    }
}

/// Compile the source against the full device list. On failure the
/// per-device build logs are collected and surfaced to the caller
/// instead of a bare status code.
fn build_program(
    context: &Context,
    device_ids: &[cl_device_id],
    source: &str,
    build_options: &str,
) -> Result<Program> {
    let mut program = Program::create_from_sources(context, &[source])
        .map_err(Error::runtime("clCreateProgramWithSource"))?;

    if let Err(status) = program.build(device_ids, build_options) {
        let mut log = String::new();
        for &id in device_ids {
            if let Ok(device_log) = program.get_build_log(id) {
                if !device_log.trim().is_empty() {
                    log.push_str(device_log.trim_end());
                    log.push('\n');
                }
            }
        }
        if log.trim().is_empty() {
            log = format!("{status}");
        }
        error!(%status, "kernel program build failed");
        return Err(Error::BuildFailed { log });
    }

    Ok(program)
}
