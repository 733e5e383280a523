use std::path::PathBuf;

use opencl3::error_codes::ClError;

use crate::config::DeviceClass;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no OpenCL platform found")]
    NoPlatformFound,

    #[error("no {0} device found on the selected platform")]
    NoDeviceFound(DeviceClass),

    #[error("cannot read kernel source '{}': {}", .path.display(), .source)]
    KernelFileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Program compilation failed; `log` holds the per-device build
    /// diagnostics collected from the runtime.
    #[error("kernel program build failed:\n{log}")]
    BuildFailed { log: String },

    /// An OpenCL call returned a non-success status. `status` displays
    /// as the named status code (e.g. `CL_INVALID_KERNEL_NAME`).
    #[error("{call} failed with {status}")]
    Runtime { call: &'static str, status: ClError },

    #[error("no input argument specified")]
    MissingInput,

    #[error("no output argument specified")]
    MissingOutput,

    #[error("more than one output argument specified")]
    MultipleOutputs,

    #[error("cannot open image '{}': {}", .path.display(), .source)]
    ImageFileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported image format in '{}': {}", .path.display(), .reason)]
    UnsupportedImageFormat { path: PathBuf, reason: String },

    #[error("cannot save image '{}': {}", .path.display(), .source)]
    ImageFileNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn runtime(call: &'static str) -> impl FnOnce(ClError) -> Error {
        move |status| Error::Runtime { call, status }
    }
}
