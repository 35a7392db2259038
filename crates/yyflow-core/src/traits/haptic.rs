//! Haptic capability: fire-and-forget vibration.

/// Hardware vibration capability supplied by the host platform.
pub trait HapticSink: Send + Sync {
    /// Whether the capability exists on this device.
    fn is_available(&self) -> bool {
        true
    }

    /// Vibrate with an alternating on/off pattern in milliseconds.
    fn vibrate(&self, pattern: &[u64]) -> Result<(), String>;
}

/// Default sink for devices without vibration hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHaptics;

impl HapticSink for NoopHaptics {
    fn is_available(&self) -> bool {
        false
    }

    fn vibrate(&self, _pattern: &[u64]) -> Result<(), String> {
        Ok(())
    }
}
