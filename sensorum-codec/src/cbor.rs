//! CBOR encoding of measurements

use std::io::Cursor;

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::{CodecError, FirmwareVersion, Measurement, Result, SCHEMA_VERSION};

/// On-the-wire layout of schema version 1.
#[derive(Debug, Serialize, Deserialize)]
struct WireV1 {
    v: u64,
    ts: u64,
    lux: f32,
    hum: f32,
    temp_c: f32,
    soil: f32,
    salt: f32,
    batt_mv: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fw: Option<[u16; 3]>,
}

impl From<&Measurement> for WireV1 {
    fn from(m: &Measurement) -> Self {
        Self {
            v: SCHEMA_VERSION,
            ts: m.timestamp,
            lux: m.lux,
            hum: m.humidity,
            temp_c: m.temperature_c,
            soil: m.soil,
            salt: m.salt,
            batt_mv: m.battery_mv,
            fw: m.firmware.map(|fw| [fw.major, fw.minor, fw.patch]),
        }
    }
}

impl From<WireV1> for Measurement {
    fn from(w: WireV1) -> Self {
        Self {
            timestamp: w.ts,
            lux: w.lux,
            humidity: w.hum,
            temperature_c: w.temp_c,
            soil: w.soil,
            salt: w.salt,
            battery_mv: w.batt_mv,
            firmware: w.fw.map(|[major, minor, patch]| FirmwareVersion::new(major, minor, patch)),
        }
    }
}

/// Encode a measurement as a versioned CBOR map.
///
/// Fails with [`CodecError::NonFinite`] if any float field is NaN or infinite,
/// since such a payload would be rejected by [`decode`] anyway.
pub fn encode(measurement: &Measurement) -> Result<Vec<u8>> {
    measurement.validate()?;

    let mut buffer = Vec::new();
    ciborium::ser::into_writer(&WireV1::from(measurement), &mut buffer)?;

    Ok(buffer)
}

/// Decode a measurement from a versioned CBOR map.
///
/// The whole input must be consumed by exactly one CBOR item.
pub fn decode(bytes: &[u8]) -> Result<Measurement> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut cursor = Cursor::new(bytes);
    let value: Value = ciborium::de::from_reader(&mut cursor)?;

    let consumed = cursor.position() as usize;
    if consumed < bytes.len() {
        return Err(CodecError::TrailingBytes {
            count: bytes.len() - consumed,
        });
    }

    let version = schema_version(&value)?;
    if version != SCHEMA_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            expected: SCHEMA_VERSION,
        });
    }

    let wire: WireV1 = value.deserialized()?;
    let measurement = Measurement::from(wire);
    measurement.validate()?;

    Ok(measurement)
}

/// Read the `"v"` key without committing to a particular layout.
fn schema_version(value: &Value) -> Result<u64> {
    let map = value
        .as_map()
        .ok_or_else(|| CodecError::malformed("expected a CBOR map"))?;

    map.iter()
        .find(|(key, _)| key.as_text() == Some("v"))
        .and_then(|(_, v)| v.as_integer())
        .and_then(|v| u64::try_from(v).ok())
        .ok_or(CodecError::MissingVersion)
}
