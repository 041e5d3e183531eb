//! `;`-delimited telemetry messages as published on the broker topic.

use log::debug;

use super::{FieldId, FieldSet, TelemetryReading, number};

pub const DELIMITER: char = ';';

/// Field order of a delimited message. Fixed per build.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FrameSchema {
    /// timestamp;water;boiler;electricity_in;electricity_out
    #[default]
    Full,
    /// timestamp;water;boiler
    Legacy,
}

impl FrameSchema {
    const FULL: [FieldId; 5] = [
        FieldId::Timestamp,
        FieldId::WaterConsumption,
        FieldId::BoilerTemperature,
        FieldId::ElectricityConsumption,
        FieldId::ElectricityProduction,
    ];

    const LEGACY: [FieldId; 3] = [
        FieldId::Timestamp,
        FieldId::WaterConsumption,
        FieldId::BoilerTemperature,
    ];

    pub fn fields(self) -> &'static [FieldId] {
        match self {
            Self::Full => &Self::FULL,
            Self::Legacy => &Self::LEGACY,
        }
    }
}

/// Splits `message` into at most `limit` fields, in order.
///
/// A message with fewer delimiters yields fewer fields; text after the
/// last schema field is never produced.
pub fn split_fields(message: &str, limit: usize) -> impl Iterator<Item = &str> {
    message.splitn(limit.saturating_add(1), DELIMITER).take(limit)
}

/// Applies one delimited message to `reading`.
///
/// Empty fields are skipped, unparseable numbers are skipped, omitted
/// trailing fields are left alone. Returns the fields whose stored value
/// changed.
pub fn apply_frame(
    schema: FrameSchema,
    message: &str,
    reading: &mut TelemetryReading,
) -> FieldSet {
    let fields = schema.fields();
    let mut changed = FieldSet::empty();

    for (field, raw) in fields.iter().copied().zip(split_fields(message, fields.len())) {
        if raw.is_empty() {
            continue;
        }

        let updated = if field.is_numeric() {
            match number::parse_field(raw) {
                Some(value) => reading.set_number(field, value),
                None => {
                    debug!("frame: ignoring malformed {:?} value {:?}", field, raw);
                    false
                }
            }
        } else {
            reading.set_timestamp(raw.trim())
        };

        if updated {
            changed.insert(field);
        }
    }

    changed
}
