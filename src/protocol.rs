//! JSON wire format for samples and acknowledgments.
//!
//! Inbound: a flat object with up to six numeric keys
//! `gyro_x, gyro_y, gyro_z, acc_x, acc_y, acc_z`. Missing keys default to
//! 0.0, except `acc_z` which defaults to 9.81. Unknown keys are rejected.
//!
//! Outbound: `{"status":"received","timestamp":"<seconds>"}`.

use crate::types::{Acknowledgment, ImuSample, SampleFields};
use crate::{ImuError, Result};
use serde_json::{Map, Value};

// -- Defaults --
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8765;

/// Decode a text payload into a sample.
///
/// Malformed JSON fails with [`ImuError::Decode`]; well-formed JSON that is
/// not a valid sample object fails with [`ImuError::Field`].
pub fn decode(raw: &str) -> Result<ImuSample> {
    let object = serde_json::from_str::<Map<String, Value>>(raw).map_err(ImuError::from_json)?;
    sample_from_object(object)
}

/// Decode a binary payload (UTF-8 JSON bytes) into a sample.
pub fn decode_bytes(raw: &[u8]) -> Result<ImuSample> {
    let object = serde_json::from_slice::<Map<String, Value>>(raw).map_err(ImuError::from_json)?;
    sample_from_object(object)
}

/// Parsing into a map first keeps JSON arrays from matching the struct
/// positionally.
fn sample_from_object(object: Map<String, Value>) -> Result<ImuSample> {
    serde_json::from_value::<SampleFields>(Value::Object(object))
        .map(SampleFields::into_sample)
        .map_err(ImuError::from_json)
}

/// Encode all six fields in wire order.
pub fn encode(sample: &ImuSample) -> String {
    // Serializing a struct of plain f64 fields cannot fail; non-finite values
    // come out as `null`.
    serde_json::to_string(sample).unwrap_or_default()
}

/// Encode an acknowledgment.
pub fn encode_ack(ack: &Acknowledgment) -> String {
    serde_json::to_string(ack).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_sample() {
        let raw = r#"{"gyro_x":0.1,"gyro_y":0.2,"gyro_z":0.3,"acc_x":0.4,"acc_y":0.5,"acc_z":9.81}"#;
        let s = decode(raw).unwrap();
        assert_eq!(s.to_array(), [0.1, 0.2, 0.3, 0.4, 0.5, 9.81]);
    }

    #[test]
    fn test_decode_applies_defaults() {
        let s = decode(r#"{"gyro_x":1.0}"#).unwrap();
        assert_eq!(s.gyro_x, 1.0);
        assert_eq!(s.gyro_y, 0.0);
        assert_eq!(s.gyro_z, 0.0);
        assert_eq!(s.acc_x, 0.0);
        assert_eq!(s.acc_y, 0.0);
        assert_eq!(s.acc_z, 9.81);
    }

    #[test]
    fn test_decode_empty_object_is_default() {
        assert_eq!(decode("{}").unwrap(), ImuSample::default());
    }

    #[test]
    fn test_decode_accepts_integers() {
        let s = decode(r#"{"acc_z":10}"#).unwrap();
        assert_eq!(s.acc_z, 10.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = decode(r#"{"gyro_x":1.0,"foo":2.0}"#).unwrap_err();
        assert!(matches!(err, ImuError::Field(_)), "got {err:?}");
    }

    #[test]
    fn test_wrong_shape_rejected_as_field_error() {
        assert!(matches!(decode(r#"{"gyro_x":"fast"}"#), Err(ImuError::Field(_))));
        assert!(matches!(decode("[1.0, 2.0]"), Err(ImuError::Field(_))));
        assert!(matches!(decode("[0, 0, 0, 0, 0, 9.81]"), Err(ImuError::Field(_))));
        assert!(matches!(decode("42"), Err(ImuError::Field(_))));
    }

    #[test]
    fn test_null_field_rejected() {
        assert!(matches!(decode(r#"{"gyro_x":null}"#), Err(ImuError::Field(_))));
        assert!(matches!(
            decode(r#"{"gyro_x":1.0,"acc_z":null}"#),
            Err(ImuError::Field(_))
        ));
    }

    #[test]
    fn test_out_of_range_number_is_decode_error() {
        // serde_json refuses to parse a literal that overflows f64.
        assert!(matches!(decode(r#"{"gyro_x":1e400}"#), Err(ImuError::Decode(_))));
    }

    #[test]
    fn test_malformed_rejected_as_decode_error() {
        assert!(matches!(decode(r#"{"gyro_x":1.0"#), Err(ImuError::Decode(_))));
        assert!(matches!(decode("not json"), Err(ImuError::Decode(_))));
        assert!(matches!(decode(""), Err(ImuError::Decode(_))));
        assert!(matches!(decode_bytes(&[0xff, 0xfe, 0x00]), Err(ImuError::Decode(_))));
    }

    #[test]
    fn test_decode_bytes_matches_text() {
        let raw = r#"{"gyro_z":-0.75,"acc_y":1.5}"#;
        assert_eq!(decode_bytes(raw.as_bytes()).unwrap(), decode(raw).unwrap());
    }

    #[test]
    fn test_encode_field_order() {
        let s = ImuSample {
            gyro_x: 0.1,
            gyro_y: 0.2,
            gyro_z: 0.3,
            acc_x: 0.4,
            acc_y: 0.5,
            acc_z: 9.81,
        };
        assert_eq!(
            encode(&s),
            r#"{"gyro_x":0.1,"gyro_y":0.2,"gyro_z":0.3,"acc_x":0.4,"acc_y":0.5,"acc_z":9.81}"#
        );
    }

    #[test]
    fn test_round_trip_awkward_values() {
        let s = ImuSample {
            gyro_x: -1.0e-12,
            gyro_y: 1.0 / 3.0,
            gyro_z: f64::MAX,
            acc_x: -0.0,
            acc_y: 123456.789,
            acc_z: f64::MIN_POSITIVE,
        };
        assert_eq!(decode(&encode(&s)).unwrap(), s);
    }

    #[test]
    fn test_encode_ack() {
        let json = encode_ack(&Acknowledgment::received(1.5));
        assert_eq!(json, r#"{"status":"received","timestamp":"1.5"}"#);
    }
}
