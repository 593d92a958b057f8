//! Beneficiary payload helpers used when importing and registering beneficiaries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields lifted out of a raw record into `piiData`
const PII_FIELDS: [&str; 3] = ["name", "phone", "email"];
/// Fields kept on the top level of the reshaped payload
const TOP_LEVEL_FIELDS: [&str; 3] = ["type", "age", "gender"];
/// Location fields that always end up in `extras`
const LOCATION_FIELDS: [&str; 4] = ["province", "district", "wardNo", "meta"];

/// GPS fix captured by a field device
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// Parse `"lat lng altitude accuracy"`.
///
/// Each part is read up to its first non-numeric character, so `"12.5m"`
/// gives `12.5`. Missing parts and parts without a leading number are `None`.
pub fn split_coordinates(coordinates: &str) -> Coordinates {
    let mut parts = coordinates.split(' ').map(leading_number);
    let mut next = || parts.next().flatten();

    Coordinates {
        latitude: next(),
        longitude: next(),
        altitude: next(),
        accuracy: next(),
    }
}

/// Longest decimal prefix of `text` after leading whitespace
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with("Infinity") {
        return text[..end + "Infinity".len()].parse().ok();
    }

    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = digits(exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    text[..end].parse().ok()
}

/// Reshape a raw beneficiary record into `{type, age, gender, piiData, extras}`.
///
/// `coordinates` is dropped. `name`, `phone` and `email` move to `piiData`.
/// Every remaining field, plus the location fields, lands in `extras`. Fields
/// absent from the input are absent from the output. A non-object input is
/// treated as an empty record.
pub fn create_extras_and_pii_data(beneficiary: &Value) -> Value {
    let mut rest = match beneficiary {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    rest.remove("coordinates");

    let pii_data = take_fields(&mut rest, &PII_FIELDS);
    let mut payload = take_fields(&mut rest, &TOP_LEVEL_FIELDS);
    let location = take_fields(&mut rest, &LOCATION_FIELDS);

    let mut extras = rest;
    extras.extend(location);

    payload.insert("piiData".to_string(), Value::Object(pii_data));
    payload.insert("extras".to_string(), Value::Object(extras));
    Value::Object(payload)
}

fn take_fields(source: &mut Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| source.remove(*key).map(|value| (key.to_string(), value)))
        .collect()
}

/// Strip all whitespace from a phone number
pub fn remove_spaces(phone_number: &str) -> String {
    phone_number.chars().filter(|c| !c.is_whitespace()).collect()
}
