//! # Sensorum Codec - measurement wire format
//!
//! Field sensors publish one [`Measurement`] per message. This crate owns the
//! byte representation of that message so that publishers and the ingestion
//! bridge agree on a single, explicitly versioned contract.
//!
//! ## Wire format
//!
//! A measurement is a single CBOR map. The map is self-describing and carries a
//! mandatory schema version under the `"v"` key:
//!
//! | key       | type            | meaning                                |
//! |-----------|-----------------|----------------------------------------|
//! | `v`       | uint            | schema version, currently `1`          |
//! | `ts`      | uint            | seconds since the Unix epoch           |
//! | `lux`     | float           | illuminance                            |
//! | `hum`     | float           | relative humidity, percent             |
//! | `temp_c`  | float           | temperature, degrees Celsius           |
//! | `soil`    | float           | soil moisture indicator                |
//! | `salt`    | float           | salinity indicator                     |
//! | `batt_mv` | uint            | battery voltage, millivolts            |
//! | `fw`      | [uint,uint,uint]| optional firmware version              |
//!
//! Unknown keys are ignored so newer publishers can add fields without
//! breaking older bridges.
//!
//! ## Quick Start
//!
//! ```rust
//! use sensorum_codec::{Measurement, Result};
//!
//! fn example() -> Result<()> {
//!     let measurement = Measurement::builder()
//!         .timestamp(1_700_000_000)
//!         .lux(120.5)
//!         .temperature_c(21.0)
//!         .battery_mv(3_900)
//!         .build();
//!
//!     let bytes = measurement.encode()?;
//!     assert_eq!(Measurement::decode(&bytes)?, measurement);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod builder;
pub mod cbor;
pub mod error;
pub mod measurement;

pub use builder::MeasurementBuilder;
pub use error::{CodecError, Result};
pub use measurement::{FirmwareVersion, Measurement};

/// Schema version written by this crate and the only one it accepts.
pub const SCHEMA_VERSION: u64 = 1;

/// Media type of an encoded measurement.
pub const CONTENT_TYPE: &str = "application/cbor";
