//! Compute platform and device discovery.
//!
//! Platforms and devices are runtime-owned handles; they are
//! enumerated and queried here but never released.

use opencl3::device::Device;
use opencl3::error_codes::{ClError, CL_DEVICE_NOT_FOUND};
use opencl3::platform::{get_platforms, Platform};
use tracing::{debug, info};

use crate::config::DeviceClass;
use crate::error::{Error, Result};

/// Enumerate the available OpenCL platforms, in runtime order.
pub fn platforms() -> Result<Vec<Platform>> {
    let platforms = get_platforms().map_err(Error::runtime("clGetPlatformIDs"))?;
    if platforms.is_empty() {
        return Err(Error::NoPlatformFound);
    }

    info!(count = platforms.len(), "found OpenCL platform(s)");
    for platform in &platforms {
        debug!(platform = %name_or_unknown(platform.name()));
    }
    Ok(platforms)
}

/// Enumerate the platform's devices matching `class`, in runtime order.
pub fn devices(platform: &Platform, class: DeviceClass) -> Result<Vec<Device>> {
    // Zero matches is reported by the runtime as CL_DEVICE_NOT_FOUND
    // rather than an empty list.
    let ids = match platform.get_devices(class.to_cl()) {
        Ok(ids) => ids,
        Err(status) if status.0 == CL_DEVICE_NOT_FOUND => Vec::new(),
        Err(status) => {
            return Err(Error::Runtime {
                call: "clGetDeviceIDs",
                status,
            })
        }
    };
    if ids.is_empty() {
        return Err(Error::NoDeviceFound(class));
    }

    let devices: Vec<Device> = ids.into_iter().map(Device::new).collect();
    info!(
        count = devices.len(),
        platform = %name_or_unknown(platform.name()),
        "found {class} device(s)"
    );
    for device in &devices {
        debug!(device = %name_or_unknown(device.name()));
    }
    Ok(devices)
}

/// Name queries are diagnostics only; their failures are never
/// propagated.
fn name_or_unknown(name: std::result::Result<String, ClError>) -> String {
    name.unwrap_or_else(|_| "<unknown>".to_string())
}
