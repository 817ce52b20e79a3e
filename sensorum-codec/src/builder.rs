//! Builder pattern for creating measurements

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{FirmwareVersion, Measurement};

/// Builder for creating measurements with a fluent API
#[derive(Debug, Default)]
pub struct MeasurementBuilder {
    inner: Measurement,
}

impl MeasurementBuilder {
    /// Create a new builder with every field zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp in seconds since the Unix epoch
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.inner.timestamp = timestamp;
        self
    }

    /// Stamp the measurement with the current wall-clock time
    pub fn now(mut self) -> Self {
        self.inner.timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self
    }

    pub fn lux(mut self, lux: f32) -> Self {
        self.inner.lux = lux;
        self
    }

    pub fn humidity(mut self, humidity: f32) -> Self {
        self.inner.humidity = humidity;
        self
    }

    pub fn temperature_c(mut self, temperature_c: f32) -> Self {
        self.inner.temperature_c = temperature_c;
        self
    }

    pub fn soil(mut self, soil: f32) -> Self {
        self.inner.soil = soil;
        self
    }

    pub fn salt(mut self, salt: f32) -> Self {
        self.inner.salt = salt;
        self
    }

    pub fn battery_mv(mut self, battery_mv: u32) -> Self {
        self.inner.battery_mv = battery_mv;
        self
    }

    /// Attach the firmware version of the publishing device
    pub fn firmware(mut self, major: u16, minor: u16, patch: u16) -> Self {
        self.inner.firmware = Some(FirmwareVersion::new(major, minor, patch));
        self
    }

    /// Build the final measurement
    pub fn build(self) -> Measurement {
        self.inner
    }
}
