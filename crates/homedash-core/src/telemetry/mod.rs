//! Latest telemetry reading and the decoders that update it.

pub mod frame;
pub mod number;
pub mod poll;
pub mod scrape;


use heapless::String;

use crate::text::truncated;

pub const TIMESTAMP_BYTES: usize = 32;

/// Fields a telemetry producer can supply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldId {
    Timestamp,
    WaterConsumption,
    BoilerTemperature,
    ElectricityConsumption,
    ElectricityProduction,
}

impl FieldId {
    const fn bit(self) -> u8 {
        match self {
            Self::Timestamp => 1 << 0,
            Self::WaterConsumption => 1 << 1,
            Self::BoilerTemperature => 1 << 2,
            Self::ElectricityConsumption => 1 << 3,
            Self::ElectricityProduction => 1 << 4,
        }
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Timestamp)
    }
}

/// Set of fields touched by one decode pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, field: FieldId) {
        self.0 |= field.bit();
    }

    pub const fn contains(self, field: FieldId) -> bool {
        self.0 & field.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }
}

/// Most recent values received from the producer.
///
/// `None` means the producer has not supplied that field since boot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryReading {
    pub timestamp: String<TIMESTAMP_BYTES>,
    pub water_consumption: Option<f32>,
    pub boiler_temperature: Option<f32>,
    pub electricity_consumption: Option<f32>,
    pub electricity_production: Option<f32>,
}

impl TelemetryReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(&self, field: FieldId) -> Option<f32> {
        match field {
            FieldId::Timestamp => None,
            FieldId::WaterConsumption => self.water_consumption,
            FieldId::BoilerTemperature => self.boiler_temperature,
            FieldId::ElectricityConsumption => self.electricity_consumption,
            FieldId::ElectricityProduction => self.electricity_production,
        }
    }

    /// Stores a numeric field, returns whether the stored value changed.
    pub fn set_number(&mut self, field: FieldId, value: f32) -> bool {
        let slot = match field {
            FieldId::Timestamp => return false,
            FieldId::WaterConsumption => &mut self.water_consumption,
            FieldId::BoilerTemperature => &mut self.boiler_temperature,
            FieldId::ElectricityConsumption => &mut self.electricity_consumption,
            FieldId::ElectricityProduction => &mut self.electricity_production,
        };

        let changed = slot.is_none_or(|previous| previous.to_bits() != value.to_bits());
        *slot = Some(value);
        changed
    }

    /// Stores the display timestamp, truncating on a char boundary.
    pub fn set_timestamp(&mut self, text: &str) -> bool {
        let next = truncated::<TIMESTAMP_BYTES>(text);
        if next == self.timestamp {
            return false;
        }
        self.timestamp = next;
        true
    }
}

/// Shared reading plus a revision bumped on every effective change.
#[derive(Clone, Debug, Default)]
pub struct TelemetryState {
    reading: TelemetryReading,
    revision: u32,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reading(&self) -> &TelemetryReading {
        &self.reading
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Runs `update` against the reading and bumps the revision if any
    /// field changed.
    pub fn apply<F>(&mut self, update: F) -> FieldSet
    where
        F: FnOnce(&mut TelemetryReading) -> FieldSet,
    {
        let changed = update(&mut self.reading);
        if !changed.is_empty() {
            self.revision = self.revision.wrapping_add(1);
        }
        changed
    }
}
