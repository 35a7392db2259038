//! Device-context provider: platform metadata captured at instance start.

use crate::types::DeviceInfo;

pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;
}

/// A fixed value is its own provider.
impl DeviceInfoProvider for DeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.clone()
    }
}
