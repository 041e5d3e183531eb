//! Value extraction from the HTML status page served by the heating controller.

use log::debug;

use super::{FieldId, FieldSet, TelemetryReading, number};

/// Maps an element id on the status page to a reading field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScrapeKey {
    pub id: &'static str,
    pub field: FieldId,
}

impl ScrapeKey {
    pub const fn new(id: &'static str, field: FieldId) -> Self {
        Self { id, field }
    }
}

/// Ids recognised on the controller status page.
pub const DEFAULT_KEYS: [ScrapeKey; 1] =
    [ScrapeKey::new("analogOutTemp", FieldId::BoilerTemperature)];

/// Returns the raw text of the first element carrying `id="<key>"`: the
/// bytes between the end of its opening tag and the start of the next tag.
pub fn extract_text<'a>(document: &'a str, key: &str) -> Option<&'a str> {
    let attr_at = find_id_attribute(document, key)?;
    let tag_end = document[attr_at..].find('>')? + attr_at;
    let value_start = tag_end + 1;
    let value_end = document[value_start..].find('<')? + value_start;
    Some(&document[value_start..value_end])
}

/// Like [`extract_text`], then parses the number while tolerating
/// surrounding whitespace and unit markers.
pub fn extract_number(document: &str, key: &str) -> Option<f32> {
    let text = extract_text(document, key)?;
    number::parse_lenient(text)
}

/// Applies every key found in `document` to `reading`. Missing or
/// unparseable keys leave their field untouched.
pub fn apply_document(
    keys: &[ScrapeKey],
    document: &str,
    reading: &mut TelemetryReading,
) -> FieldSet {
    let mut changed = FieldSet::empty();

    for key in keys {
        let updated = if key.field.is_numeric() {
            match extract_number(document, key.id) {
                Some(value) => reading.set_number(key.field, value),
                None => {
                    debug!("scrape: no value for id={}", key.id);
                    false
                }
            }
        } else {
            match extract_text(document, key.id) {
                Some(text) if !text.trim().is_empty() => reading.set_timestamp(text.trim()),
                _ => false,
            }
        };

        if updated {
            changed.insert(key.field);
        }
    }

    changed
}

fn find_id_attribute(document: &str, key: &str) -> Option<usize> {
    const PREFIX: &str = "id=\"";

    let mut from = 0usize;
    while let Some(found) = document[from..].find(PREFIX) {
        let value_at = from + found + PREFIX.len();
        let rest = &document[value_at..];
        if rest.starts_with(key) && rest[key.len()..].starts_with('"') {
            return Some(value_at + key.len() + 1);
        }
        from = value_at;
    }

    None
}
