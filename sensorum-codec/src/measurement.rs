//! Measurement record types

use serde::{Deserialize, Serialize};

use crate::{CodecError, MeasurementBuilder, Result};

/// One timestamped reading bundle from a single field sensor.
///
/// Every field is always present on the wire except `firmware`, which older
/// devices do not stamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    /// Illuminance
    pub lux: f32,
    /// Relative humidity, percent
    pub humidity: f32,
    /// Degrees Celsius
    #[serde(rename = "temperature_C")]
    pub temperature_c: f32,
    /// Soil moisture indicator
    pub soil: f32,
    /// Salinity indicator
    pub salt: f32,
    /// Battery voltage in millivolts
    #[serde(rename = "battery_mV")]
    pub battery_mv: u32,
    /// Firmware that produced the reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<FirmwareVersion>,
}

/// Semantic version of the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl FirmwareVersion {
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Measurement {
    /// Start building a measurement with every field zeroed
    pub fn builder() -> MeasurementBuilder {
        MeasurementBuilder::new()
    }

    /// Encode to the versioned CBOR wire format
    pub fn encode(&self) -> Result<Vec<u8>> {
        crate::cbor::encode(self)
    }

    /// Decode from the versioned CBOR wire format
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        crate::cbor::decode(bytes)
    }

    /// Reject NaN and infinite float fields
    pub fn validate(&self) -> Result<()> {
        let floats = [
            ("lux", self.lux),
            ("humidity", self.humidity),
            ("temperature_c", self.temperature_c),
            ("soil", self.soil),
            ("salt", self.salt),
        ];

        for (field, value) in floats {
            if !value.is_finite() {
                return Err(CodecError::NonFinite { field });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_negative_temperature() {
        let m = Measurement {
            temperature_c: -12.5,
            ..Default::default()
        };
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let m = Measurement {
            humidity: f32::NAN,
            ..Default::default()
        };
        assert_eq!(
            m.validate(),
            Err(CodecError::NonFinite { field: "humidity" })
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let m = Measurement {
            temperature_c: 20.0,
            battery_mv: 4100,
            ..Default::default()
        };
        let keys = top_level_keys(&m);
        assert!(keys.contains(&"temperature_C".to_string()));
        assert!(keys.contains(&"battery_mV".to_string()));
        assert!(!keys.contains(&"firmware".to_string()));
    }

    fn top_level_keys(m: &Measurement) -> Vec<String> {
        let value = ciborium::Value::serialized(m).unwrap();
        value
            .as_map()
            .unwrap()
            .iter()
            .filter_map(|(k, _)| k.as_text().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_firmware_display() {
        assert_eq!(FirmwareVersion::new(1, 4, 2).to_string(), "1.4.2");
    }
}
