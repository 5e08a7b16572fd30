//! Binary encoding of cached values.
//!
//! Every stored value is one format-version byte followed by a MessagePack
//! body with named fields. Decoding never panics: truncated input, an unknown
//! version or a body that no longer matches the target type all surface as
//! [`Error::Serialization`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Encode a value for storage.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = vec![FORMAT_VERSION];
    rmp_serde::encode::write_named(&mut out, value)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(out)
}

/// Decode a value previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| Error::Serialization("empty payload".to_string()))?;
    if *version != FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported format version {version}"
        )));
    }
    rmp_serde::from_slice(body).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tally_types::{Cell, Column, Table};

    fn mixed_table() -> Table {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        Table::new(vec![
            Column::from_optional_numbers("amount", [Some(1.5), None, Some(-3.0)]),
            Column::new("label", vec![Cell::from("a"), Cell::Null, Cell::from("c")]),
            Column::new("at", vec![Cell::from(dt), Cell::Null, Cell::from(dt)]),
            Column::from_numbers("constant", [7.0, 7.0, 7.0]),
            Column::new(
                "flag",
                vec![Cell::from(true), Cell::from(false), Cell::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_round_trip() {
        let table = mixed_table();
        let decoded: Table = decode(&encode(&table).unwrap()).unwrap();

        assert_eq!(decoded.column_names(), table.column_names());
        assert_eq!(decoded.row_count(), 3);
        assert_eq!(decoded, table);
        assert_eq!(decoded.cell(1, 0), Some(&Cell::Null));
        assert_eq!(decoded.content_hash(), table.content_hash());
    }

    #[test]
    fn test_json_value_round_trip() {
        let value = json!({
            "columns": {"a": {"mean": 2.5, "std": null}},
            "pairs": [["a", "b", -0.75]],
            "ok": true,
        });
        let decoded: serde_json::Value = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_version_byte_prefixed() {
        let bytes = encode(&42u32).unwrap();
        assert_eq!(bytes[0], FORMAT_VERSION);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(
            decode::<Table>(&[]),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_version_is_error() {
        let mut bytes = encode(&mixed_table()).unwrap();
        bytes[0] = 99;
        let err = decode::<Table>(&bytes).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn test_garbage_and_schema_drift_are_errors() {
        assert!(decode::<Table>(&[FORMAT_VERSION, 0xc1, 0x00]).is_err());

        let other = encode(&json!({"columns": "nope"})).unwrap();
        assert!(matches!(
            decode::<Table>(&other),
            Err(Error::Serialization(_))
        ));
    }
}
