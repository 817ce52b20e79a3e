//! In-memory sensor registry
//!
//! Every sensor that has ever published is assigned a sequential index in the
//! order it was first seen. Indices start at 0, have no gaps and never change.
//! The registry also predicts the name of the next sensor to appear, which new
//! devices fetch to name themselves before they first publish.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use sensorum_codec::Measurement;
use serde::Serialize;

/// Prefix of the names handed out by [`SensorRegistry::peek_next_expected`].
pub const SENSOR_NAME_PREFIX: &str = "sensor";

/// Name the registry predicts for the sensor with the given index.
pub fn sensor_name(index: usize) -> String {
    format!("{SENSOR_NAME_PREFIX}{index}")
}

/// A registered sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sensor {
    /// Name taken from the topic the sensor publishes on
    pub name: String,
    /// Position in first-contact order
    pub index: usize,
}

/// A measurement as retained by the registry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub measurement: Measurement,
    /// Bridge wall-clock time at ingestion, seconds since the Unix epoch
    pub received_at: u64,
}

impl Reading {
    /// Wrap a measurement received now
    pub fn now(measurement: Measurement) -> Self {
        let received_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            measurement,
            received_at,
        }
    }
}

#[derive(Debug)]
struct Entry {
    sensor: Sensor,
    readings: VecDeque<Reading>,
}

/// `entries[i].sensor.index == i`, so the next index is `entries.len()`.
#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

/// Shared handle to the registry. Clones refer to the same sensors.
#[derive(Clone, Debug)]
pub struct SensorRegistry {
    inner: Arc<RwLock<Inner>>,
    history_depth: usize,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SensorRegistry {
    /// Creates an empty registry retaining up to `history_depth` readings per sensor.
    pub fn new(history_depth: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            history_depth,
        }
    }

    // A poisoned lock still holds a consistent registry: the map is only
    // updated after the entry it points at has been pushed.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the sensor registered under `name`, registering it with the
    /// next free index if it has never been seen.
    ///
    /// Lookup and insertion happen under one write lock, so concurrent first
    /// observations of the same name yield one sensor, and distinct new names
    /// receive distinct consecutive indices.
    pub fn register_or_get(&self, name: &str) -> Sensor {
        if let Some(sensor) = self.get(name) {
            return sensor;
        }

        let mut inner = self.write();
        if let Some(&index) = inner.by_name.get(name) {
            return inner.entries[index].sensor.clone();
        }

        let sensor = Sensor {
            name: name.to_string(),
            index: inner.entries.len(),
        };
        inner.entries.push(Entry {
            sensor: sensor.clone(),
            readings: VecDeque::new(),
        });
        inner.by_name.insert(sensor.name.clone(), sensor.index);

        tracing::info!(sensor = %sensor.name, index = sensor.index, "registered new sensor");

        sensor
    }

    /// Names of all known sensors in ascending index order
    pub fn list_sensors(&self) -> Vec<String> {
        self.read()
            .entries
            .iter()
            .map(|entry| entry.sensor.name.clone())
            .collect()
    }

    /// Name the next newly observed sensor is expected to carry
    pub fn peek_next_expected(&self) -> String {
        sensor_name(self.next_index())
    }

    /// Index the next newly observed sensor will receive
    pub fn next_index(&self) -> usize {
        self.read().entries.len()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<Sensor> {
        let inner = self.read();
        inner
            .by_name
            .get(name)
            .map(|&index| inner.entries[index].sensor.clone())
    }

    /// Retain a reading for a registered sensor, evicting the oldest once
    /// `history_depth` is reached. Returns `false` for unknown sensors.
    pub fn record(&self, name: &str, reading: Reading) -> bool {
        let mut inner = self.write();
        let Some(&index) = inner.by_name.get(name) else {
            return false;
        };

        if self.history_depth == 0 {
            return true;
        }

        let readings = &mut inner.entries[index].readings;
        while readings.len() >= self.history_depth {
            readings.pop_front();
        }
        readings.push_back(reading);

        true
    }

    /// Most recent retained reading
    pub fn latest(&self, name: &str) -> Option<Reading> {
        let inner = self.read();
        let &index = inner.by_name.get(name)?;
        inner.entries[index].readings.back().copied()
    }

    /// Retained readings, oldest first
    pub fn history(&self, name: &str) -> Vec<Reading> {
        let inner = self.read();
        inner
            .by_name
            .get(name)
            .map(|&index| inner.entries[index].readings.iter().copied().collect())
            .unwrap_or_default()
    }
}
