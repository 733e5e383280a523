use std::fmt;
use std::path::PathBuf;

use opencl3::device::{
    CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU,
};
use opencl3::types::cl_device_type;

use crate::error::{Error, Result};

/// Which class of compute devices to enumerate on the selected platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    All,
    Cpu,
    Gpu,
}

impl DeviceClass {
    pub(crate) fn to_cl(self) -> cl_device_type {
        match self {
            DeviceClass::All => CL_DEVICE_TYPE_ALL,
            DeviceClass::Cpu => CL_DEVICE_TYPE_CPU,
            DeviceClass::Gpu => CL_DEVICE_TYPE_GPU,
        }
    }
}

impl Default for DeviceClass {
    fn default() -> Self {
        DeviceClass::All
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::All => write!(f, "compute"),
            DeviceClass::Cpu => write!(f, "CPU"),
            DeviceClass::Gpu => write!(f, "GPU"),
        }
    }
}

/// Processor construction parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the kernel source file compiled at construction.
    pub kernel_path: PathBuf,
    /// Device class the platform is filtered by.
    pub device_class: DeviceClass,
    /// Free-form options passed to the kernel compiler unmodified.
    pub build_options: String,
    /// Index into the enumerated platform list.
    pub platform_index: usize,
    /// Index into the class-filtered device list; selects the queue device.
    pub device_index: usize,
}

impl Config {
    pub fn new<P: Into<PathBuf>>(kernel_path: P) -> Self {
        Self {
            kernel_path: kernel_path.into(),
            device_class: DeviceClass::default(),
            build_options: String::new(),
            platform_index: 0,
            device_index: 0,
        }
    }

    pub fn builder<P: Into<PathBuf>>(kernel_path: P) -> ConfigBuilder {
        ConfigBuilder::new(kernel_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kernel_path.as_os_str().is_empty() {
            return Err(Error::config("kernel_path must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new<P: Into<PathBuf>>(kernel_path: P) -> Self {
        Self {
            config: Config::new(kernel_path),
        }
    }

    pub fn device_class(mut self, class: DeviceClass) -> Self {
        self.config.device_class = class;
        self
    }

    pub fn build_options<S: Into<String>>(mut self, options: S) -> Self {
        self.config.build_options = options.into();
        self
    }

    pub fn platform_index(mut self, index: usize) -> Self {
        self.config.platform_index = index;
        self
    }

    pub fn device_index(mut self, index: usize) -> Self {
        self.config.device_index = index;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
