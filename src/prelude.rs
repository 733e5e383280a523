pub use crate::args::{ExecutionDomain, KernelArg, Scalar};
pub use crate::config::{Config, ConfigBuilder, DeviceClass};
pub use crate::error::{Error, Result};
pub use crate::image::Image;
pub use crate::processor::Processor;
