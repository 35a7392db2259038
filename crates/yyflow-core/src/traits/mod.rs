//! Collaborator traits implemented by the host application.

pub mod device;
pub mod executable;
pub mod haptic;
pub mod processor;

pub use device::DeviceInfoProvider;
pub use executable::{Executable, StepContext, StepOutcome};
pub use haptic::{HapticSink, NoopHaptics};
pub use processor::{OfflineOperation, OperationProcessor};
