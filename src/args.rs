//! Kernel argument descriptors and the binder that marshals them into
//! device memory.
//!
//! Arguments are consumed in caller order and bound to kernel
//! parameter slots with increasing indices starting at zero, so the
//! list order must match the kernel's parameter order. This is a hard
//! contract, not an incidental behavior.

use std::ffi::c_void;
use std::path::Path;
use std::ptr;

use opencl3::kernel::Kernel;
use opencl3::memory::{
    cl_image_desc, cl_image_format, Buffer, Image as DeviceImage, CL_MEM_COPY_HOST_PTR,
    CL_MEM_OBJECT_IMAGE2D, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY, CL_RGBA, CL_UNORM_INT8,
};
use opencl3::types::{cl_mem_flags, cl_uint, CL_BLOCKING};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::image::Image;

/// A scalar bound by value directly into its parameter slot; no device
/// memory object is created for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    F32(f32),
    F64(f64),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

impl Scalar {
    fn bind(&self, kernel: &Kernel, index: cl_uint) -> Result<()> {
        let bound = unsafe {
            match self {
                Scalar::F32(v) => kernel.set_arg(index, v),
                Scalar::F64(v) => kernel.set_arg(index, v),
                Scalar::I32(v) => kernel.set_arg(index, v),
                Scalar::U32(v) => kernel.set_arg(index, v),
                Scalar::I64(v) => kernel.set_arg(index, v),
                Scalar::U64(v) => kernel.set_arg(index, v),
            }
        };
        bound.map(|_| ()).map_err(Error::runtime("clSetKernelArg"))
    }
}

/// One kernel argument descriptor.
///
/// Exactly one input-direction argument (`Input` or `InputImage`) and
/// exactly one output-direction argument (`Output` or `OutputImage`)
/// must appear in a call's list.
#[derive(Debug)]
pub enum KernelArg<'a> {
    /// Scalar bound by value.
    Scalar(Scalar),
    /// Read-only buffer visible to the kernel; never read back.
    Static { data: &'a [u8], copy: bool },
    /// Read-only buffer that designates the 1-D execution domain,
    /// with one work item per payload byte.
    Input { data: &'a [u8], copy: bool },
    /// Write-only buffer. The payload is uploaded as the initial
    /// contents and the device result is read back into it after the
    /// launch.
    Output { data: &'a mut [u8], copy: bool },
    /// PPM file loaded, converted to RGBA, and uploaded to a read-only
    /// 2-D image; designates the (width, height) execution domain.
    InputImage { path: &'a Path, copy: bool },
    /// Write-only 2-D image sized to the input image's extents, read
    /// back and saved to `path` after the launch. Must appear after
    /// the image input that records those extents.
    OutputImage { path: &'a Path },
}

impl KernelArg<'_> {
    fn is_input(&self) -> bool {
        matches!(self, KernelArg::Input { .. } | KernelArg::InputImage { .. })
    }

    fn is_output(&self) -> bool {
        matches!(self, KernelArg::Output { .. } | KernelArg::OutputImage { .. })
    }
}

/// The work-item grid a kernel launch spans, derived from the input
/// argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionDomain {
    /// One work item per input byte.
    Linear(usize),
    /// One work item per input pixel.
    Planar { width: usize, height: usize },
}

impl ExecutionDomain {
    pub fn dimensions(&self) -> cl_uint {
        match self {
            ExecutionDomain::Linear(_) => 1,
            ExecutionDomain::Planar { .. } => 2,
        }
    }

    /// Global work sizes; only the first `dimensions()` entries are
    /// meaningful.
    pub fn extents(&self) -> [usize; 2] {
        match *self {
            ExecutionDomain::Linear(len) => [len, 0],
            ExecutionDomain::Planar { width, height } => [width, height],
        }
    }
}

/// Where the result lands after the launch. Owns the output memory
/// object so it is released with the rest of the call.
pub(crate) enum OutputTarget<'a> {
    Buffer {
        buffer: Buffer<u8>,
        dest: &'a mut [u8],
    },
    Image {
        image: DeviceImage,
        path: &'a Path,
        width: usize,
        height: usize,
    },
}

/// A device memory object created for one call; held only so the
/// handle is released when the call's `BoundArgs` drops.
pub(crate) enum DeviceArg {
    Buffer(Buffer<u8>),
    Image(DeviceImage),
}

/// Everything `bind` produces for one launch. Dropping it releases
/// every per-call memory object, on the success and failure paths
/// alike.
pub(crate) struct BoundArgs<'a> {
    pub(crate) domain: ExecutionDomain,
    pub(crate) output: OutputTarget<'a>,
    _mem: Vec<DeviceArg>,
}

/// Presence validation, before any device call: exactly one input and
/// exactly one output argument.
pub(crate) fn validate(args: &[KernelArg<'_>]) -> Result<()> {
    if !args.iter().any(KernelArg::is_input) {
        return Err(Error::MissingInput);
    }
    match args.iter().filter(|a| a.is_output()).count() {
        0 => Err(Error::MissingOutput),
        1 => Ok(()),
        _ => Err(Error::MultipleOutputs),
    }
}

/// Marshal `args` into device memory and kernel parameter slots.
///
/// The execution domain is recorded from the input argument and
/// threaded through the return value; the output argument populates
/// the call's single `OutputTarget`.
pub(crate) fn bind<'a>(
    ctx: &ExecutionContext,
    kernel: &Kernel,
    args: Vec<KernelArg<'a>>,
) -> Result<BoundArgs<'a>> {
    let mut mem = Vec::new();
    let mut domain = None;
    let mut output = None;

    for (index, arg) in args.into_iter().enumerate() {
        let index = index as cl_uint;
        match arg {
            KernelArg::Scalar(scalar) => scalar.bind(kernel, index)?,
            KernelArg::Static { data, copy } => {
                let buffer = create_buffer(ctx, data, CL_MEM_READ_ONLY, copy)?;
                set_mem_arg(kernel, index, &buffer)?;
                mem.push(DeviceArg::Buffer(buffer));
            }
            KernelArg::Input { data, copy } => {
                let buffer = create_buffer(ctx, data, CL_MEM_READ_ONLY, copy)?;
                set_mem_arg(kernel, index, &buffer)?;
                domain = Some(ExecutionDomain::Linear(data.len()));
                mem.push(DeviceArg::Buffer(buffer));
            }
            KernelArg::Output { data, copy } => {
                let buffer = create_buffer(ctx, data, CL_MEM_WRITE_ONLY, copy)?;
                set_mem_arg(kernel, index, &buffer)?;
                output = Some(OutputTarget::Buffer { buffer, dest: data });
            }
            KernelArg::InputImage { path, copy } => {
                let pixels = Image::load(path)?.to_rgba();
                let (width, height) = (pixels.width, pixels.height);
                let host = copy.then_some(pixels.pixels.as_slice());
                let mut image = create_image(ctx, width, height, CL_MEM_READ_ONLY, host)?;
                if !copy {
                    write_image(ctx, &mut image, width, height, &pixels.pixels)?;
                }
                set_mem_arg(kernel, index, &image)?;
                domain = Some(ExecutionDomain::Planar { width, height });
                mem.push(DeviceArg::Image(image));
            }
            KernelArg::OutputImage { path } => {
                // Output images are sized to the already-recorded input
                // extents; there is no independent output-size argument.
                let Some(ExecutionDomain::Planar { width, height }) = domain else {
                    return Err(Error::MissingInput);
                };
                let image = create_image(ctx, width, height, CL_MEM_WRITE_ONLY, None)?;
                set_mem_arg(kernel, index, &image)?;
                output = Some(OutputTarget::Image {
                    image,
                    path,
                    width,
                    height,
                });
            }
        }
    }

    let domain = domain.ok_or(Error::MissingInput)?;
    let output = output.ok_or(Error::MissingOutput)?;
    debug!(?domain, mem_objects = mem.len() + 1, "arguments bound");

    Ok(BoundArgs {
        domain,
        output,
        _mem: mem,
    })
}

fn set_mem_arg<T>(kernel: &Kernel, index: cl_uint, arg: &T) -> Result<()> {
    unsafe { kernel.set_arg(index, arg) }
        .map(|_| ())
        .map_err(Error::runtime("clSetKernelArg"))
}

/// Allocate a buffer sized to the payload. `copy` selects transfer at
/// creation (`CL_MEM_COPY_HOST_PTR`); otherwise the payload is written
/// with a separate blocking transfer, regardless of direction.
fn create_buffer(
    ctx: &ExecutionContext,
    data: &[u8],
    direction: cl_mem_flags,
    copy: bool,
) -> Result<Buffer<u8>> {
    let flags = if copy {
        direction | CL_MEM_COPY_HOST_PTR
    } else {
        direction
    };
    let host_ptr = if copy {
        data.as_ptr() as *mut c_void
    } else {
        ptr::null_mut()
    };

    let mut buffer = unsafe { Buffer::<u8>::create(ctx.context(), flags, data.len(), host_ptr) }
        .map_err(Error::runtime("clCreateBuffer"))?;

    if !copy {
        unsafe {
            ctx.queue()
                .enqueue_write_buffer(&mut buffer, CL_BLOCKING, 0, data, &[])
        }
        .map(|_| ())
        .map_err(Error::runtime("clEnqueueWriteBuffer"))?;
    }

    Ok(buffer)
}

/// Allocate a 2-D device image in the fixed RGBA / 8-bit-normalized
/// format, transferring `host` at creation when given.
fn create_image(
    ctx: &ExecutionContext,
    width: usize,
    height: usize,
    direction: cl_mem_flags,
    host: Option<&[u8]>,
) -> Result<DeviceImage> {
    let format = cl_image_format {
        image_channel_order: CL_RGBA,
        image_channel_data_type: CL_UNORM_INT8,
    };
    let desc = cl_image_desc {
        image_type: CL_MEM_OBJECT_IMAGE2D,
        image_width: width,
        image_height: height,
        image_depth: 1,
        image_array_size: 1,
        image_row_pitch: 0,
        image_slice_pitch: 0,
        num_mip_levels: 0,
        num_samples: 0,
        buffer: ptr::null_mut(),
    };

    let flags = if host.is_some() {
        direction | CL_MEM_COPY_HOST_PTR
    } else {
        direction
    };
    let host_ptr = host.map_or(ptr::null_mut(), |p| p.as_ptr() as *mut c_void);

    unsafe { DeviceImage::create(ctx.context(), flags, &format, &desc, host_ptr) }
        .map_err(Error::runtime("clCreateImage"))
}

pub(crate) fn image_region(width: usize, height: usize) -> ([usize; 3], [usize; 3]) {
    ([0, 0, 0], [width, height, 1])
}

fn write_image(
    ctx: &ExecutionContext,
    image: &mut DeviceImage,
    width: usize,
    height: usize,
    pixels: &[u8],
) -> Result<()> {
    let (origin, region) = image_region(width, height);
    unsafe {
        ctx.queue().enqueue_write_image(
            image,
            CL_BLOCKING,
            origin.as_ptr(),
            region.as_ptr(),
            0,
            0,
            pixels.as_ptr() as *mut c_void,
            &[],
        )
    }
    .map(|_| ())
    .map_err(Error::runtime("clEnqueueWriteImage"))
}
